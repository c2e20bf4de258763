//! # slice-volume library
//!
//! This crate assembles unordered collections of 2-D image slices into
//! geometrically consistent 3-D volumes.

//!
//! Slice order, inter-slice spacing and orientation are inferred from
//! per-slice positional metadata alone: slices are sorted by origin,
//! the slice spacing is resolved from measured origin distances, and the
//! through-plane direction is recomputed from actual positions rather
//! than taken from file metadata. Missing or irregularly spaced slices
//! are detected, reported through a caller-supplied diagnostic sink and
//! recorded as interpolation hints for downstream re-sampling.
//!
//! The assembled [`volume::VolumetricImage`] also tracks intensity
//! semantics: for modalities with a calibrated physical unit (CT and its
//! Hounsfield units) voxel values are kept on the discrete unit scale,
//! and any normalisation or rescaling demotes the image to an arbitrary
//! intensity scale. The demotion is one-way. Slices are assumed to have
//! the following properties:
//!  - Geometry metadata in source (x, y, z) axis order, as ITK-style
//!    readers report it
//!  - A shared in-plane size across the stack
//!  - Pixel data already decoded by a file-reading collaborator
//!
//! # Examples
//!
//! ## Assembling a volume from unordered slices
//!
//! ```
//! use ndarray::Array2;
//! use slice_volume::assembler::StackAssembler;
//! use slice_volume::diagnostics::CollectingSink;
//! use slice_volume::enums::Modality;
//! use slice_volume::slice::SliceMetadata;
//!
//! let slices: Vec<SliceMetadata> = (0..3)
//!     .map(|i| SliceMetadata {
//!         origin: [0.0, 0.0, i as f64],
//!         spacing: [1.0, 1.0, 1.0],
//!         direction: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
//!         pixel_array: Array2::zeros((16, 16)),
//!         original_index: i,
//!     })
//!     .collect();
//!
//! let mut sink = CollectingSink::default();
//! let image = StackAssembler::default()
//!     .assemble_image(slices, Modality::Ct, &mut sink)
//!     .expect("slices should form a consistent volume");
//!
//! assert_eq!(image.image_dimension(), [3, 16, 16]);
//! assert_eq!(image.image_spacing(), [1.0, 1.0, 1.0]);
//! assert!(sink.diagnostics.is_empty());
//! ```

pub mod assembler;
pub mod diagnostics;
pub mod enums;
pub mod geometry;
pub mod ordering;
pub mod orientation;
pub mod slice;
pub mod volume;
