use std::str::FromStr;

use crate::volume::TransformError;

/// Whether voxel values still map one-to-one onto a physical unit.
///
/// The only transition is `ExactPhysicalUnit` to `ArbitraryScale`; nothing
/// re-establishes `ExactPhysicalUnit` on existing data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntensityKind {
    /// Stored values carry an absolute physical meaning, e.g. Hounsfield
    /// units.
    ExactPhysicalUnit,
    ArbitraryScale,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Modality {
    /// Computed tomography. Intensities are Hounsfield units.
    Ct,
    #[default]
    Generic,
}

impl Modality {
    pub fn defines_physical_unit(&self) -> bool {
        matches!(self, Modality::Ct)
    }

    /// Lowest realistic intensity for this modality, if it defines one.
    /// For CT this is -1000.0, the Hounsfield value of air.
    pub fn default_lowest_intensity(&self) -> Option<f64> {
        match self {
            Modality::Ct => Some(-1000.0),
            Modality::Generic => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NormalisationMethod {
    #[default]
    None,
    Range,
    RelativeRange,
    QuantileRange,
}

impl NormalisationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalisationMethod::None => "none",
            NormalisationMethod::Range => "range",
            NormalisationMethod::RelativeRange => "relative_range",
            NormalisationMethod::QuantileRange => "quantile_range",
        }
    }
}

impl FromStr for NormalisationMethod {
    type Err = TransformError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(NormalisationMethod::None),
            "range" => Ok(NormalisationMethod::Range),
            "relative_range" => Ok(NormalisationMethod::RelativeRange),
            "quantile_range" => Ok(NormalisationMethod::QuantileRange),
            other => Err(TransformError::UnrecognisedMethod(other.to_string())),
        }
    }
}
