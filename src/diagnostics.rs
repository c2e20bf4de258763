use std::fmt;

/// Recoverable conditions observed during stack assembly.
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// Distances between subsequent slice origins are not uniform, usually
    /// because slices are missing from the input collection.
    IrregularSliceSpacing { observed_spacings: Vec<f64> },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::IrregularSliceSpacing { observed_spacings } => write!(
                f,
                "Inconsistent distance between slice origins of subsequent slices: \
                 {observed_spacings:?}. Slices cannot be aligned correctly. This is likely \
                 due to missing slices. Missing slices will be interpolated for volumetric \
                 analysis."
            ),
        }
    }
}

/// Sink for non-fatal diagnostics.
///
/// Assembly reports warnings through a caller-supplied sink rather than a
/// process-wide mechanism, so concurrent assemblies never share mutable
/// diagnostic state.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to the `log` crate at warn level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
    }
}

/// Collects diagnostics for later inspection.
#[derive(Clone, Debug, Default)]
pub struct CollectingSink {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_irregular_spacing_message_names_observed_values() {
        let diagnostic = Diagnostic::IrregularSliceSpacing {
            observed_spacings: vec![1.0, 2.0],
        };
        let message = diagnostic.to_string();
        assert!(message.contains("1.0"));
        assert!(message.contains("2.0"));
        assert!(message.contains("missing slices"));
    }

    #[test]
    fn test_collecting_sink() {
        let mut sink = CollectingSink::default();
        sink.report(Diagnostic::IrregularSliceSpacing {
            observed_spacings: vec![1.0],
        });
        assert_eq!(sink.diagnostics.len(), 1);
    }
}
