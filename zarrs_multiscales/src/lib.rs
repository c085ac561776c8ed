//! `zarrs_multiscales` writes multiscale image pyramids to [Zarr](https://zarr.dev) hierarchies with [`zarrs`](https://docs.rs/zarrs/latest/zarrs/).
//!
//! A pyramid is a set of datasets `s0`, `s1`, ... in a group, each a downscaled copy of the previous one.
//! The group is annotated with an [OME-NGFF](https://ngff.openmicroscopy.org/0.3/#multiscale-md) style `multiscales` attribute describing the resolution levels:
//! ```json
//! {
//!   "multiscales": [
//!     {
//!       "datasets": [{"path": "s0"}, {"path": "s1"}, {"path": "s2"}],
//!       "axes": ["y", "x"],
//!       "name": "raw",
//!       "version": "0.3",
//!       "type": "zarrs_multiscales::downscale::rescale::Rescale",
//!       "metadata": {"scale": [0.5, 0.5], "order": 0, "preserve_range": true}
//!     }
//!   ],
//!   "_ARRAY_DIMENSIONS": ["y", "x"]
//! }
//! ```
//!
//! ## Writing a Pyramid
//! [`write_pyramid`] writes a pyramid of 2D or 3D data to the root group of a filesystem store with the default configuration.
//! [`PyramidWriter`] can write into any `zarrs` store and configures the group, the chunk shape, and the [`Downscale`] transform.
//! Groups and datasets are written in the Zarr V2 format with nested chunk keys, as OME-NGFF 0.3 expects.
//!
//! ```rust
//! # use std::sync::Arc;
//! use zarrs_multiscales::PyramidWriter;
//!
//! let store = Arc::new(zarrs::storage::store::MemoryStore::new());
//! let data = ndarray::Array2::<u8>::from_shape_fn((512, 512), |(y, x)| (y ^ x) as u8);
//! PyramidWriter::new("raw", 3).write(store.clone(), &data)?;
//!
//! let s2 = zarrs::array::Array::open(store, "/s2")?;
//! assert_eq!(s2.shape(), &[128, 128]);
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Annotating an Existing Group
//! [`append_multiscale_metadata`] validates the datasets of a group and appends a multiscales entry to its attributes.
//! It operates on any [`HierarchicalStore`], such as a [`ZarrHierarchy`] supporting both Zarr V2 and Zarr V3 nodes.
//!
//! ## Logging
//! `zarrs_multiscales` logs through the [`log`](https://docs.rs/log/latest/log/) crate.
//! Each written level is logged at `info` level and overwritten datasets are logged at `warn` level.
//!
//! ## Licence
//! `zarrs_multiscales` is licensed under either of
//! - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//! - the MIT license <http://opensource.org/licenses/MIT>, at your option.

pub mod axis;
pub mod downscale;
pub mod element;
mod error;
pub mod hierarchy;
pub mod multiscale;
mod multiscale_builder;
mod pyramid_writer;

pub use axis::AxisName;
pub use downscale::{Downscale, DownscaleError, InputRange, Rescale};
pub use element::PyramidElement;
pub use error::{
    BackendError, InvalidGroupError, InvalidRankError, PyramidError, SchemaViolationError,
};
pub use hierarchy::{HierarchicalStore, ZarrHierarchy};
pub use multiscale::{DatasetReference, MultiscaleEntry};
pub use multiscale_builder::append_multiscale_metadata;
pub use pyramid_writer::{PyramidWriter, default_chunk_shape, write_pyramid};
