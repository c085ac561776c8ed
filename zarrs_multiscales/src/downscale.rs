//! Downscale transforms used to derive lower resolution levels.
//!
//! A transform maps one level of a pyramid to the next.
//! Transforms operate on `f64` data and may return values outside the range of the element type of the pyramid, the [`PyramidWriter`](crate::PyramidWriter) casts each level back to the input element type.
//!
//! [`Rescale`] is the default transform. Custom transforms implement [`Downscale`].

mod rescale;

pub use rescale::{InterpolationOrder, Rescale};

use ndarray::{ArrayD, ArrayViewD};
use thiserror::Error;

/// The value range class of the data passed to a [`Downscale`] transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputRange {
    /// Integer input with the inclusive bounds of its element type.
    Integer {
        /// The minimum representable value.
        min: f64,
        /// The maximum representable value.
        max: f64,
    },
    /// Floating point input.
    Float,
}

impl InputRange {
    /// Returns true if the input is integer valued.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::Integer { .. })
    }
}

/// A transform producing the next (lower) resolution level of a pyramid.
pub trait Downscale {
    /// Downscale `data`.
    ///
    /// `input_range` describes the element type the data was converted from.
    ///
    /// # Errors
    /// Returns a [`DownscaleError`] if the transform cannot be applied to `data`.
    fn downscale(
        &self,
        data: ArrayViewD<'_, f64>,
        input_range: InputRange,
    ) -> Result<ArrayD<f64>, DownscaleError>;

    /// The free-form parameters of the transform for data with `dimensionality` dimensions.
    ///
    /// These are recorded as the `metadata` of a multiscales entry.
    fn parameters(&self, dimensionality: usize) -> Option<serde_json::Map<String, serde_json::Value>>;

    /// The provenance of the transform, recorded as the `type` of a multiscales entry.
    ///
    /// Defaults to the fully qualified path of the implementing type.
    fn transform_type(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// A downscale error.
#[derive(Clone, Debug, Error)]
pub enum DownscaleError {
    /// The input has a zero length dimension.
    #[error("cannot downscale an array with shape {0:?}")]
    EmptyInput(Vec<usize>),
    /// The number of scale factors does not match the dimensionality of the input.
    #[error("{found} scale factors were supplied for an input with {expected} dimensions")]
    ScaleDimensionality {
        /// The dimensionality of the input.
        expected: usize,
        /// The number of scale factors.
        found: usize,
    },
    /// The interpolation order is not supported.
    #[error("unsupported interpolation order {0}, the supported orders are 0 (nearest) and 1 (linear)")]
    UnsupportedOrder(u8),
    /// A scale factor is not a positive finite number.
    #[error("invalid scale factor {0}, scale factors must be positive and finite")]
    InvalidScale(f64),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for DownscaleError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for DownscaleError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}
