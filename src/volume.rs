use ndarray::Array3;
use rayon::prelude::*;
use thiserror::Error;

use crate::enums::{IntensityKind, Modality, NormalisationMethod};
use crate::geometry::AssembledGeometry;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Unrecognised normalisation method: {0}")]
    UnrecognisedMethod(String),

    #[error("Range [{lower}, {upper}] is not increasing")]
    MalformedRange { lower: f64, upper: f64 },

    #[error("Fraction range [{lower}, {upper}] must lie within [0, 1]")]
    FractionOutOfBounds { lower: f64, upper: f64 },

    #[error("Degenerate intensity range: lower bound {lower} meets upper bound {upper}")]
    DegenerateIntensityRange { lower: f64, upper: f64 },

    #[error("Mask shape {actual:?} does not match image dimension {expected:?}")]
    MaskShapeMismatch {
        actual: [usize; 3],
        expected: [usize; 3],
    },

    #[error("The provided array is not a mask consisting of 0s and 1s")]
    InvalidMask,
}

/// A 3-D image: voxel grid, assembled geometry and intensity semantics.
///
/// Intensity transforms either return the entity unchanged (identity cases)
/// or construct a new entity; an `ExactPhysicalUnit` image is never mutated
/// into an arbitrary-scale one in place.
#[derive(Clone, Debug)]
pub struct VolumetricImage {
    voxel_data: Array3<f64>,
    geometry: AssembledGeometry,
    modality: Modality,
    intensity_kind: IntensityKind,
}

impl VolumetricImage {
    /// Create an image from an assembled voxel grid.
    ///
    /// Modalities that define a physical unit start out as
    /// `ExactPhysicalUnit` and have their voxel values snapped to whole
    /// units.
    pub fn new(
        voxel_data: Array3<f64>,
        geometry: AssembledGeometry,
        modality: Modality,
    ) -> Self {
        let intensity_kind = if modality.defines_physical_unit() {
            IntensityKind::ExactPhysicalUnit
        } else {
            IntensityKind::ArbitraryScale
        };
        let mut image = Self {
            voxel_data,
            geometry,
            modality,
            intensity_kind,
        };
        image.enforce_intensity_kind();
        image
    }

    /// Build a new entity on `template`'s geometry and provenance.
    ///
    /// Every field is duplicated by value; the new entity shares nothing
    /// with the template.
    fn from_template(
        template: &VolumetricImage,
        voxel_data: Array3<f64>,
        intensity_kind: IntensityKind,
    ) -> Self {
        Self {
            voxel_data,
            geometry: template.geometry.clone(),
            modality: template.modality,
            intensity_kind,
        }
    }

    /// Re-establish the integrity constraints of the current intensity kind.
    ///
    /// While the image is `ExactPhysicalUnit` its voxel values are snapped
    /// to whole units (CT values are whole Hounsfield units). Rounding is
    /// half-to-even, matching the rounding used throughout assembly.
    fn enforce_intensity_kind(&mut self) {
        if self.intensity_kind == IntensityKind::ExactPhysicalUnit {
            self.voxel_data.par_mapv_inplace(f64::round_ties_even);
        }
    }

    /// Replace the voxel grid, enforcing the intensity-kind constraints.
    ///
    /// The new grid must have the assembled dimension.
    pub fn set_voxel_grid(&mut self, voxel_data: Array3<f64>) {
        debug_assert_eq!(
            {
                let (z, y, x) = voxel_data.dim();
                [z, y, x]
            },
            self.geometry.dimension()
        );
        self.voxel_data = voxel_data;
        self.enforce_intensity_kind();
    }

    /// The voxel grid in (z, y, x) axis order.
    pub fn get_voxel_grid(&self) -> &Array3<f64> {
        &self.voxel_data
    }

    pub fn image_dimension(&self) -> [usize; 3] {
        self.geometry.dimension()
    }

    pub fn image_origin(&self) -> [f64; 3] {
        self.geometry.origin()
    }

    pub fn image_spacing(&self) -> [f64; 3] {
        self.geometry.spacing()
    }

    pub fn image_orientation(&self) -> [[f64; 3]; 3] {
        self.geometry.orientation()
    }

    pub fn geometry(&self) -> &AssembledGeometry {
        &self.geometry
    }

    /// Cumulative slice offsets recorded when spacing was irregular.
    pub fn slice_positions(&self) -> Option<&[f64]> {
        self.geometry.slice_positions()
    }

    pub fn intensity_kind(&self) -> IntensityKind {
        self.intensity_kind
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    /// Lowest realistic intensity for the image's modality, used downstream
    /// as the padding value when re-sampling.
    pub fn default_lowest_intensity(&self) -> Option<f64> {
        self.modality.default_lowest_intensity()
    }

    /// Normalise intensities onto a common scale.
    ///
    /// Statistics (minimum, maximum, quantiles) are computed over the
    /// voxels selected by `mask`, or over the whole grid when no mask is
    /// given. After normalisation, values are clamped to `saturation_range`
    /// when one is provided.
    ///
    /// Normalisation with any method other than `None` breaks the
    /// one-to-one relationship between stored values and a physical unit,
    /// so a physical-unit image comes back demoted to `ArbitraryScale`.
    /// With `NormalisationMethod::None` the image is returned unchanged.
    ///
    /// # Errors
    ///
    /// Fails without constructing a new entity when the range bounds are
    /// malformed, when the resolved bounds collapse to a degenerate span,
    /// or when `mask` is not a mask of 0s and 1s covering at least one
    /// voxel of the image's shape.
    pub fn normalise_intensities(
        self,
        method: NormalisationMethod,
        intensity_range: Option<[f64; 2]>,
        saturation_range: Option<[f64; 2]>,
        mask: Option<&Array3<u8>>,
    ) -> Result<VolumetricImage, TransformError> {
        if method == NormalisationMethod::None {
            return Ok(self);
        }

        if let Some([lower, upper]) = saturation_range {
            if !(lower < upper) {
                return Err(TransformError::MalformedRange { lower, upper });
            }
        }

        let selected = self.statistics_region(mask)?;
        let (lower, upper) = resolve_bounds(method, intensity_range, selected)?;
        let span = upper - lower;
        if !(span > 0.0) || !span.is_finite() {
            return Err(TransformError::DegenerateIntensityRange { lower, upper });
        }

        let mut transformed = self.voxel_data.clone();
        transformed.par_mapv_inplace(|value| (value - lower) / span);
        if let Some([saturation_lower, saturation_upper]) = saturation_range {
            transformed.par_mapv_inplace(|value| value.clamp(saturation_lower, saturation_upper));
        }

        Ok(Self::from_template(
            &self,
            transformed,
            IntensityKind::ArbitraryScale,
        ))
    }

    /// Multiply all voxel values by `scale`.
    ///
    /// Scaling by 1.0 is the identity and returns the image unchanged. Any
    /// other factor breaks the mapping onto a physical unit, so the result
    /// is an `ArbitraryScale` entity.
    pub fn scale_intensities(self, scale: f64) -> VolumetricImage {
        if scale == 1.0 {
            return self;
        }
        let mut transformed = self.voxel_data.clone();
        transformed.par_mapv_inplace(|value| value * scale);
        Self::from_template(&self, transformed, IntensityKind::ArbitraryScale)
    }

    /// Voxel values over which normalisation statistics are computed.
    fn statistics_region(&self, mask: Option<&Array3<u8>>) -> Result<Vec<f64>, TransformError> {
        let Some(mask) = mask else {
            return Ok(self.voxel_data.iter().copied().collect());
        };

        if mask.dim() != self.voxel_data.dim() {
            let (z, y, x) = mask.dim();
            return Err(TransformError::MaskShapeMismatch {
                actual: [z, y, x],
                expected: self.geometry.dimension(),
            });
        }
        if mask.iter().any(|&value| value > 1) || !mask.iter().any(|&value| value == 1) {
            return Err(TransformError::InvalidMask);
        }

        Ok(self
            .voxel_data
            .iter()
            .zip(mask.iter())
            .filter(|&(_, &selected)| selected == 1)
            .map(|(&value, _)| value)
            .collect())
    }
}

/// Resolve the lower and upper intensity bounds for a normalisation method.
fn resolve_bounds(
    method: NormalisationMethod,
    intensity_range: Option<[f64; 2]>,
    mut selected: Vec<f64>,
) -> Result<(f64, f64), TransformError> {
    let observed_min = selected.iter().copied().fold(f64::INFINITY, f64::min);
    let observed_max = selected.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    match method {
        // Handled by the caller as an identity.
        NormalisationMethod::None => Ok((observed_min, observed_max)),

        NormalisationMethod::Range => {
            if let Some([lower, upper]) = intensity_range {
                if lower.is_finite() && upper.is_finite() && !(lower < upper) {
                    return Err(TransformError::MalformedRange { lower, upper });
                }
                // A non-finite bound means "use the observed one".
                let lower = if lower.is_finite() { lower } else { observed_min };
                let upper = if upper.is_finite() { upper } else { observed_max };
                Ok((lower, upper))
            } else {
                Ok((observed_min, observed_max))
            }
        }

        NormalisationMethod::RelativeRange => {
            let [lower, upper] = checked_fractions(intensity_range)?;
            let span = observed_max - observed_min;
            Ok((observed_min + lower * span, observed_min + upper * span))
        }

        NormalisationMethod::QuantileRange => {
            let [lower, upper] = checked_fractions(intensity_range)?;
            selected.par_sort_unstable_by(f64::total_cmp);
            Ok((quantile(&selected, lower), quantile(&selected, upper)))
        }
    }
}

fn checked_fractions(intensity_range: Option<[f64; 2]>) -> Result<[f64; 2], TransformError> {
    let [lower, upper] = intensity_range.unwrap_or([0.0, 1.0]);
    if !lower.is_finite() || !upper.is_finite() || !(lower < upper) {
        return Err(TransformError::MalformedRange { lower, upper });
    }
    if lower < 0.0 || upper > 1.0 {
        return Err(TransformError::FractionOutOfBounds { lower, upper });
    }
    Ok([lower, upper])
}

/// Linear-interpolation quantile of sorted values, `q` in [0, 1].
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    let weight = rank - low as f64;
    sorted[low] * (1.0 - weight) + sorted[high] * weight
}
