use ndarray::Array2;

/// Per-slice descriptor handed over by a file-reading collaborator.
///
/// Geometry fields are in the source axis order (x, y, z), as ITK-style
/// readers report them. Assembly reverses them into the internal (z, y, x)
/// convention.
#[derive(Clone, Debug)]
pub struct SliceMetadata {
    /// Slice position in source axis order.
    pub origin: [f64; 3],
    /// Voxel spacing in source axis order.
    pub spacing: [f64; 3],
    /// Direction cosines in source axis order.
    pub direction: [[f64; 3]; 3],
    /// In-plane pixel values, shape (height, width).
    pub pixel_array: Array2<f64>,
    /// Position in the input collection before sorting.
    pub original_index: usize,
}

impl SliceMetadata {
    /// In-plane size as (height, width).
    pub fn in_plane_dim(&self) -> (usize, usize) {
        self.pixel_array.dim()
    }

    /// Origin reversed into (z, y, x) order.
    pub(crate) fn canonical_origin(&self) -> [f64; 3] {
        let [x, y, z] = self.origin;
        [z, y, x]
    }

    /// Spacing reversed into (z, y, x) order.
    pub(crate) fn canonical_spacing(&self) -> [f64; 3] {
        let [x, y, z] = self.spacing;
        [z, y, x]
    }
}

/// Interface to the slice-reading collaborator.
///
/// `load_metadata` and `load_data` are assumed idempotent and free of side
/// effects beyond populating the slice object.
pub trait SliceSource {
    type Error;

    /// Populate the geometry fields of the slice.
    fn load_metadata(&mut self) -> Result<(), Self::Error>;

    /// Populate the pixel array of the slice.
    fn load_data(&mut self) -> Result<(), Self::Error>;

    /// View of the populated slice.
    fn slice(&self) -> &SliceMetadata;
}

/// Load every source and collect the populated slices.
pub fn collect_slices<S: SliceSource>(sources: &mut [S]) -> Result<Vec<SliceMetadata>, S::Error> {
    sources
        .iter_mut()
        .map(|source| {
            source.load_metadata()?;
            source.load_data()?;
            Ok(source.slice().clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    struct StaticSource {
        slice: SliceMetadata,
        metadata_loads: usize,
        data_loads: usize,
    }

    impl SliceSource for StaticSource {
        type Error = std::convert::Infallible;

        fn load_metadata(&mut self) -> Result<(), Self::Error> {
            self.metadata_loads += 1;
            Ok(())
        }

        fn load_data(&mut self) -> Result<(), Self::Error> {
            self.data_loads += 1;
            Ok(())
        }

        fn slice(&self) -> &SliceMetadata {
            &self.slice
        }
    }

    fn test_slice(z: f64, index: usize) -> SliceMetadata {
        SliceMetadata {
            origin: [10.0, 20.0, z],
            spacing: [0.5, 0.7, 2.0],
            direction: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            pixel_array: Array2::zeros((4, 5)),
            original_index: index,
        }
    }

    #[test]
    fn test_canonical_axis_reversal() {
        let slice = test_slice(30.0, 0);
        assert_eq!(slice.canonical_origin(), [30.0, 20.0, 10.0]);
        assert_eq!(slice.canonical_spacing(), [2.0, 0.7, 0.5]);
        assert_eq!(slice.in_plane_dim(), (4, 5));
    }

    #[test]
    fn test_collect_slices_loads_each_source_once() {
        let mut sources: Vec<StaticSource> = (0..3)
            .map(|i| StaticSource {
                slice: test_slice(i as f64, i),
                metadata_loads: 0,
                data_loads: 0,
            })
            .collect();

        let slices = collect_slices(&mut sources).unwrap();
        assert_eq!(slices.len(), 3);
        for source in &sources {
            assert_eq!(source.metadata_loads, 1);
            assert_eq!(source.data_loads, 1);
        }
    }
}
