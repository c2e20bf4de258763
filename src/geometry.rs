/// Tuning knobs for stack assembly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssemblyConfig {
    /// Gaps whose ratio to the smallest gap exceeds this value are treated
    /// as irregular, i.e. likely missing slices.
    pub irregular_spacing_threshold: f64,
    /// Decimal places used when rounding positions and spacings.
    pub position_decimals: i32,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            irregular_spacing_threshold: 1.2,
            position_decimals: 5,
        }
    }
}

impl AssemblyConfig {
    /// Tolerance when comparing resolved against nominal spacing.
    pub(crate) fn spacing_tolerance(&self) -> f64 {
        10f64.powi(-self.position_decimals)
    }
}

/// Round to a fixed number of decimal places, ties to even.
pub(crate) fn round_to_decimals(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Geometric descriptor of an assembled volume.
///
/// All fields are in (z, y, x) order. Values are fixed at assembly time;
/// downstream consumers copy them rather than mutate them.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledGeometry {
    origin: [f64; 3],
    spacing: [f64; 3],
    orientation: [[f64; 3]; 3],
    dimension: [usize; 3],
    slice_positions: Option<Vec<f64>>,
}

impl AssembledGeometry {
    pub(crate) fn new(
        origin: [f64; 3],
        spacing: [f64; 3],
        orientation: [[f64; 3]; 3],
        dimension: [usize; 3],
        slice_positions: Option<Vec<f64>>,
    ) -> Self {
        Self {
            origin,
            spacing,
            orientation,
            dimension,
            slice_positions,
        }
    }

    /// Physical position of the first voxel.
    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    /// Voxel spacing. The z component is the resolved distance between
    /// subsequent slices, which is not necessarily any single slice's
    /// nominal spacing.
    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// Direction cosines. The z row is derived from measured slice
    /// positions rather than taken from per-slice direction metadata.
    pub fn orientation(&self) -> [[f64; 3]; 3] {
        self.orientation
    }

    /// Volume shape as (slices, height, width).
    pub fn dimension(&self) -> [usize; 3] {
        self.dimension
    }

    /// Cumulative offsets of the retained slices along the stacking axis.
    ///
    /// Populated only when slice spacing is irregular; downstream
    /// interpolation uses these to re-sample missing slices.
    pub fn slice_positions(&self) -> Option<&[f64]> {
        self.slice_positions.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AssemblyConfig::default();
        assert_eq!(config.irregular_spacing_threshold, 1.2);
        assert_eq!(config.position_decimals, 5);
        assert!((config.spacing_tolerance() - 1e-5).abs() < 1e-12);
    }

    #[test]
    fn test_round_to_decimals() {
        assert_eq!(round_to_decimals(1.234564, 5), 1.23456);
        assert_eq!(round_to_decimals(2.5, 0), 2.0);
        assert_eq!(round_to_decimals(3.5, 0), 4.0);
        assert_eq!(round_to_decimals(-1.0000049, 5), -1.0);
    }
}
