use ndarray::{Array3, s};
use thiserror::Error;

use crate::diagnostics::DiagnosticSink;
use crate::enums::Modality;
use crate::geometry::{AssembledGeometry, AssemblyConfig};
use crate::ordering::{OrderedStack, order_slices};
use crate::orientation::resolve_orientation;
use crate::slice::SliceMetadata;
use crate::volume::VolumetricImage;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("No slices provided")]
    EmptySliceCollection,

    #[error(
        "Inconsistent in-plane dimensions: slice {original_index} is {actual:?}, expected {expected:?}"
    )]
    InconsistentDimensions {
        original_index: usize,
        actual: (usize, usize),
        expected: (usize, usize),
    },

    #[error("Duplicate slice position along the stacking axis at z = {position}")]
    DuplicateSlicePosition { position: f64 },

    #[error("Non-positive spacing {spacing:?}")]
    NonPositiveSpacing { spacing: [f64; 3] },
}

/// Result of one assembly: the geometric descriptor and the stacked voxels.
#[derive(Debug)]
pub struct AssembledStack {
    pub geometry: AssembledGeometry,
    pub voxels: Array3<f64>,
}

/// Assembles an unordered collection of slices into one volume.
///
/// Each call is a pure function of its input slices; diagnostics go through
/// the supplied sink, so independent volumes can be assembled concurrently
/// by separate workers.
pub struct StackAssembler {
    config: AssemblyConfig,
}

impl Default for StackAssembler {
    fn default() -> Self {
        Self::new(AssemblyConfig::default())
    }
}

impl StackAssembler {
    pub fn new(config: AssemblyConfig) -> Self {
        Self { config }
    }

    /// Assemble a geometry and voxel grid from unordered slices.
    ///
    /// # Errors
    ///
    /// Returns an error when the slices cannot form a consistent volume:
    /// empty input, differing in-plane sizes, duplicate positions along the
    /// stacking axis, or non-positive spacing. Irregular slice spacing is
    /// not an error; it is reported through `sink` and recorded as slice
    /// positions for downstream interpolation.
    pub fn assemble(
        &self,
        slices: Vec<SliceMetadata>,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<AssembledStack, AssemblyError> {
        if slices.is_empty() {
            return Err(AssemblyError::EmptySliceCollection);
        }

        let stack = order_slices(slices, &self.config, sink);
        Self::check(&stack)?;

        let orientation = resolve_orientation(&stack, self.config.position_decimals);
        let origin = stack.positions[0];
        let (height, width) = stack.slices[0].in_plane_dim();
        let dimension = [stack.slices.len(), height, width];

        let geometry = AssembledGeometry::new(
            origin,
            stack.spacing,
            orientation,
            dimension,
            stack.slice_positions.clone(),
        );
        let voxels = Self::stack_pixel_arrays(&stack.slices, dimension);
        Ok(AssembledStack { geometry, voxels })
    }

    /// Assemble directly into a volumetric image of the given modality.
    pub fn assemble_image(
        &self,
        slices: Vec<SliceMetadata>,
        modality: Modality,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<VolumetricImage, AssemblyError> {
        let stack = self.assemble(slices, sink)?;
        Ok(VolumetricImage::new(stack.voxels, stack.geometry, modality))
    }

    fn check(stack: &OrderedStack) -> Result<(), AssemblyError> {
        let expected = stack.slices[0].in_plane_dim();
        for slice in &stack.slices {
            let actual = slice.in_plane_dim();
            if actual != expected {
                return Err(AssemblyError::InconsistentDimensions {
                    original_index: slice.original_index,
                    actual,
                    expected,
                });
            }
        }

        // Positions must be strictly increasing along the stacking axis
        // once sorted; an equal z means two slices occupy the same plane.
        for pair in stack.positions.windows(2) {
            if pair[1][0] <= pair[0][0] {
                return Err(AssemblyError::DuplicateSlicePosition {
                    position: pair[1][0],
                });
            }
        }

        if stack.spacing.iter().any(|&component| component <= 0.0) {
            return Err(AssemblyError::NonPositiveSpacing {
                spacing: stack.spacing,
            });
        }
        Ok(())
    }

    fn stack_pixel_arrays(slices: &[SliceMetadata], dimension: [usize; 3]) -> Array3<f64> {
        let [depth, height, width] = dimension;
        let mut voxels = Array3::<f64>::zeros((depth, height, width));
        for (i, slice) in slices.iter().enumerate() {
            voxels.slice_mut(s![i, .., ..]).assign(&slice.pixel_array);
        }
        voxels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;
    use ndarray::Array2;

    fn slice_at(z: f64, index: usize) -> SliceMetadata {
        SliceMetadata {
            origin: [0.0, 0.0, z],
            spacing: [1.0, 1.0, 1.0],
            direction: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            pixel_array: Array2::from_elem((2, 3), z),
            original_index: index,
        }
    }

    #[test]
    fn test_assembled_stack_orders_voxels_by_position() {
        let slices = vec![slice_at(1.0, 0), slice_at(2.0, 1), slice_at(0.0, 2)];
        let mut sink = CollectingSink::default();
        let stack = StackAssembler::default().assemble(slices, &mut sink).unwrap();

        assert_eq!(stack.geometry.dimension(), [3, 2, 3]);
        assert_eq!(stack.geometry.origin(), [0.0, 0.0, 0.0]);
        for (i, expected) in [0.0, 1.0, 2.0].iter().enumerate() {
            assert_eq!(stack.voxels[[i, 0, 0]], *expected);
        }
        assert!(sink.diagnostics.is_empty());
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let mut sink = CollectingSink::default();
        let error = StackAssembler::default().assemble(Vec::new(), &mut sink);
        assert!(matches!(error, Err(AssemblyError::EmptySliceCollection)));
    }

    #[test]
    fn test_inconsistent_in_plane_dimensions_are_fatal() {
        let mut odd = slice_at(1.0, 1);
        odd.pixel_array = Array2::zeros((4, 4));
        let slices = vec![slice_at(0.0, 0), odd, slice_at(2.0, 2)];

        let mut sink = CollectingSink::default();
        let error = StackAssembler::default()
            .assemble(slices, &mut sink)
            .unwrap_err();
        match error {
            AssemblyError::InconsistentDimensions {
                original_index,
                actual,
                expected,
            } => {
                assert_eq!(original_index, 1);
                assert_eq!(actual, (4, 4));
                assert_eq!(expected, (2, 3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_position_is_fatal() {
        let slices = vec![slice_at(0.0, 0), slice_at(1.0, 1), slice_at(1.0, 2)];
        let mut sink = CollectingSink::default();
        let error = StackAssembler::default()
            .assemble(slices, &mut sink)
            .unwrap_err();
        assert!(matches!(
            error,
            AssemblyError::DuplicateSlicePosition { position } if position == 1.0
        ));
    }

    #[test]
    fn test_non_positive_spacing_is_fatal() {
        let mut slice = slice_at(0.0, 0);
        slice.spacing = [1.0, 1.0, 0.0];
        let mut sink = CollectingSink::default();
        let error = StackAssembler::default()
            .assemble(vec![slice], &mut sink)
            .unwrap_err();
        assert!(matches!(error, AssemblyError::NonPositiveSpacing { .. }));
    }
}
