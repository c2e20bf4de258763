use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::geometry::{AssemblyConfig, round_to_decimals};
use crate::slice::SliceMetadata;

/// Slices sorted into ascending spatial order, with the resolved spacing.
#[derive(Debug)]
pub struct OrderedStack {
    /// Slices in ascending (z, y, x) order of their origins.
    pub slices: Vec<SliceMetadata>,
    /// Canonical origins of the sorted slices.
    pub positions: Vec<[f64; 3]>,
    /// Euclidean distances between subsequent sorted origins.
    pub gaps: Vec<f64>,
    /// Resolved distance between subsequent slices.
    pub slice_spacing: f64,
    /// Full spacing vector in (z, y, x) order.
    pub spacing: [f64; 3],
    /// Cumulative slice offsets, populated when spacing is irregular.
    pub slice_positions: Option<Vec<f64>>,
}

/// Sort slices by origin and resolve the inter-slice spacing.
///
/// Slices are ordered ascending by their (z, y, x) origin, ties broken
/// lexicographically on the next axis. Gaps that exceed the configured
/// multiple of the smallest gap are treated as missing-slice artefacts:
/// they are excluded from the spacing estimate and reported through `sink`
/// as a single irregular-spacing diagnostic, together with the cumulative
/// positions of the slices that are present.
pub fn order_slices(
    mut slices: Vec<SliceMetadata>,
    config: &AssemblyConfig,
    sink: &mut dyn DiagnosticSink,
) -> OrderedStack {
    slices.sort_by(|a, b| {
        let pa = a.canonical_origin();
        let pb = b.canonical_origin();
        pa[0]
            .total_cmp(&pb[0])
            .then(pa[1].total_cmp(&pb[1]))
            .then(pa[2].total_cmp(&pb[2]))
    });

    let positions: Vec<[f64; 3]> = slices.iter().map(SliceMetadata::canonical_origin).collect();
    let nominal_spacing = slices[0].canonical_spacing();

    if slices.len() == 1 {
        // A single slice has no measurable gaps; its own nominal spacing is
        // all there is.
        return OrderedStack {
            slices,
            positions,
            gaps: Vec::new(),
            slice_spacing: nominal_spacing[0],
            spacing: nominal_spacing,
            slice_positions: None,
        };
    }

    let gaps: Vec<f64> = positions
        .windows(2)
        .map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2) + (b[2] - a[2]).powi(2)).sqrt()
        })
        .collect();

    let min_gap = gaps.iter().copied().fold(f64::INFINITY, f64::min);
    let multipliers: Vec<f64> = gaps.iter().map(|gap| gap / min_gap).collect();

    let mut slice_positions = None;
    if multipliers
        .iter()
        .any(|&m| m > config.irregular_spacing_threshold)
    {
        let mut observed: Vec<f64> = gaps
            .iter()
            .map(|&gap| round_to_decimals(gap, config.position_decimals))
            .collect();
        observed.sort_by(f64::total_cmp);
        observed.dedup();
        sink.report(Diagnostic::IrregularSliceSpacing {
            observed_spacings: observed,
        });

        // Cumulative offsets of the slices that are present, so missing
        // slices can be re-sampled downstream.
        let mut cumulative = Vec::with_capacity(gaps.len() + 1);
        let mut total = 0.0;
        cumulative.push(total);
        for &gap in &gaps {
            total += round_to_decimals(gap, config.position_decimals);
            cumulative.push(total);
        }
        slice_positions = Some(cumulative);
    }

    // Outlier gaps are excluded from the spacing estimate; they stand in
    // for one or more missing slices, not a different spacing.
    let regular: Vec<f64> = gaps
        .iter()
        .zip(&multipliers)
        .filter(|&(_, &multiplier)| multiplier <= config.irregular_spacing_threshold)
        .map(|(&gap, _)| gap)
        .collect();
    let slice_spacing = round_to_decimals(
        regular.iter().sum::<f64>() / regular.len() as f64,
        config.position_decimals,
    );

    // Keep the nominal spacing vector when it already matches the measured
    // slice distance, otherwise substitute the resolved z component.
    let spacing = if (nominal_spacing[0] - slice_spacing).abs() <= config.spacing_tolerance() {
        nominal_spacing
    } else {
        [slice_spacing, nominal_spacing[1], nominal_spacing[2]]
    };

    OrderedStack {
        slices,
        positions,
        gaps,
        slice_spacing,
        spacing,
        slice_positions,
    }
}
