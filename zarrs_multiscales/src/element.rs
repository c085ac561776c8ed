//! Element types supported by the pyramid writer.

use num::traits::{AsPrimitive, Bounded};
use zarrs::{
    array::{Element, ElementOwned},
    metadata::v2::{DataTypeMetadataV2, FillValueMetadataV2},
};

use crate::downscale::InputRange;

/// A numeric element type that a multiscale pyramid can be written with.
///
/// Downscale transforms operate on `f64` values.
/// Each level is converted to `f64` before downscaling and cast back with [`PyramidElement::from_f64`], so every level keeps the element type of the input.
pub trait PyramidElement: Element + ElementOwned + Copy + Send + Sync + 'static {
    /// The Zarr V2 data type of the element, e.g. `|u1` or `<f4`.
    fn data_type() -> DataTypeMetadataV2;

    /// The fill value of datasets holding this element type.
    fn fill_value() -> FillValueMetadataV2;

    /// The value range class of the element type.
    fn input_range() -> InputRange;

    /// Convert the element to `f64`.
    fn to_f64(self) -> f64;

    /// Cast a `f64` back to the element type.
    ///
    /// This has the semantics of a numeric `as` cast: fractional parts are truncated toward zero, out of range values saturate, and `NaN` becomes zero.
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_pyramid_element {
    ($t:ty, $data_type:literal, integer) => {
        impl_pyramid_element!(
            $t,
            $data_type,
            InputRange::Integer {
                min: <$t as Bounded>::min_value().as_(),
                max: <$t as Bounded>::max_value().as_(),
            }
        );
    };
    ($t:ty, $data_type:literal, float) => {
        impl_pyramid_element!($t, $data_type, InputRange::Float);
    };
    ($t:ty, $data_type:literal, $range:expr) => {
        impl PyramidElement for $t {
            fn data_type() -> DataTypeMetadataV2 {
                DataTypeMetadataV2::Simple($data_type.to_string())
            }

            fn fill_value() -> FillValueMetadataV2 {
                FillValueMetadataV2::from(<$t>::default())
            }

            fn input_range() -> InputRange {
                $range
            }

            fn to_f64(self) -> f64 {
                self.as_()
            }

            fn from_f64(value: f64) -> Self {
                value.as_()
            }
        }
    };
}

impl_pyramid_element!(u8, "|u1", integer);
impl_pyramid_element!(u16, "<u2", integer);
impl_pyramid_element!(u32, "<u4", integer);
impl_pyramid_element!(u64, "<u8", integer);
impl_pyramid_element!(i8, "|i1", integer);
impl_pyramid_element!(i16, "<i2", integer);
impl_pyramid_element!(i32, "<i4", integer);
impl_pyramid_element!(i64, "<i8", integer);
impl_pyramid_element!(f32, "<f4", float);
impl_pyramid_element!(f64, "<f8", float);
