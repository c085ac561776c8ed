//! Axis names.
//!
//! Every dimension of a multiscale image is tagged with a single character axis name: `t` (time), `c` (channel), `z`, `y`, or `x` (space).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{InvalidRankError, SchemaViolationError};

/// An axis name.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum AxisName {
    /// Time.
    #[display("t")]
    T,
    /// Channel.
    #[display("c")]
    C,
    /// Depth.
    #[display("z")]
    Z,
    /// Height.
    #[display("y")]
    Y,
    /// Width.
    #[display("x")]
    X,
}

impl AxisName {
    /// Return the axis name as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::T => "t",
            Self::C => "c",
            Self::Z => "z",
            Self::Y => "y",
            Self::X => "x",
        }
    }
}

impl FromStr for AxisName {
    type Err = SchemaViolationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "t" => Ok(Self::T),
            "c" => Ok(Self::C),
            "z" => Ok(Self::Z),
            "y" => Ok(Self::Y),
            "x" => Ok(Self::X),
            _ => Err(SchemaViolationError::UnknownAxis(s.to_string())),
        }
    }
}

/// Return the axis names of a pyramid written from an array with `rank` dimensions.
///
/// Axis names are assigned by rank only: `[y, x]` for 2D and `[z, y, x]` for 3D.
///
/// # Errors
/// Returns an [`InvalidRankError`] if `rank` is not 2 or 3.
pub fn default_axis_names(rank: usize) -> Result<Vec<AxisName>, InvalidRankError> {
    match rank {
        2 => Ok(vec![AxisName::Y, AxisName::X]),
        3 => Ok(vec![AxisName::Z, AxisName::Y, AxisName::X]),
        _ => Err(InvalidRankError::new(rank)),
    }
}

/// Validate `axis_names` for datasets with `rank` dimensions.
///
/// Repeated axis names are not rejected.
///
/// # Errors
/// Returns a [`SchemaViolationError`] if the number of axis names is not `rank` or an axis name is unknown.
pub fn validate_axis_names<S: AsRef<str>>(
    axis_names: &[S],
    rank: usize,
) -> Result<Vec<AxisName>, SchemaViolationError> {
    if axis_names.len() != rank {
        return Err(SchemaViolationError::AxisCountMismatch {
            expected: rank,
            found: axis_names.len(),
        });
    }
    axis_names.iter().map(|name| name.as_ref().parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_name_round_trip() {
        for name in ["t", "c", "z", "y", "x"] {
            let axis: AxisName = name.parse().unwrap();
            assert_eq!(axis.to_string(), name);
            assert_eq!(axis.as_str(), name);
            assert_eq!(serde_json::to_string(&axis).unwrap(), format!(r#""{name}""#));
        }
        assert!(matches!(
            "w".parse::<AxisName>(),
            Err(SchemaViolationError::UnknownAxis(axis)) if axis == "w"
        ));
        assert!("X".parse::<AxisName>().is_err());
    }

    #[test]
    fn axis_names_by_rank() {
        assert_eq!(default_axis_names(2).unwrap(), [AxisName::Y, AxisName::X]);
        assert_eq!(
            default_axis_names(3).unwrap(),
            [AxisName::Z, AxisName::Y, AxisName::X]
        );
        assert_eq!(default_axis_names(1).unwrap_err().rank(), 1);
        assert_eq!(default_axis_names(4).unwrap_err().rank(), 4);
    }

    #[test]
    fn axis_names_validate() {
        assert!(validate_axis_names(&["y", "x"], 2).is_ok());
        assert!(matches!(
            validate_axis_names(&["z", "y", "x"], 2),
            Err(SchemaViolationError::AxisCountMismatch {
                expected: 2,
                found: 3
            })
        ));
        assert!(matches!(
            validate_axis_names(&["y", "q"], 2),
            Err(SchemaViolationError::UnknownAxis(_))
        ));
        // repeated axis names are accepted
        assert_eq!(
            validate_axis_names(&["y", "y"], 2).unwrap(),
            [AxisName::Y, AxisName::Y]
        );
    }
}
