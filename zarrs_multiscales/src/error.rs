use thiserror::Error;
use zarrs::{
    array::{ArrayCreateError, ArrayError},
    filesystem::FilesystemStoreCreateError,
    group::GroupCreateError,
    node::{NodeCreateError, NodePathError},
    storage::{StorageError, StorePrefixError},
};

use crate::downscale::DownscaleError;

/// The input array does not have 2 or 3 dimensions.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("input array has {rank} dimensions, only 2D and 3D arrays are supported")]
pub struct InvalidRankError {
    rank: usize,
}

impl InvalidRankError {
    /// Create a new invalid rank error.
    #[must_use]
    pub const fn new(rank: usize) -> Self {
        Self { rank }
    }

    /// Return the rank of the rejected input.
    #[must_use]
    pub const fn rank(&self) -> usize {
        self.rank
    }
}

/// The target of an operation is not a group.
#[derive(Clone, Debug, Error)]
pub enum InvalidGroupError {
    /// No node exists at the path.
    #[error("no group exists at {0}")]
    MissingNode(String),
    /// A node exists at the path, but it is not a group.
    #[error("the node at {0} is not a group")]
    NotAGroup(String),
    /// The path of a resolution level is held by a group.
    #[error("cannot write a resolution level to {0}, a group exists at this path")]
    LevelOccupied(String),
}

/// The datasets of a group or the axis names violate the multiscales schema.
#[derive(Clone, Debug, Error)]
pub enum SchemaViolationError {
    /// The group has no children.
    #[error("the group at {0} does not contain any datasets")]
    EmptyGroup(String),
    /// A child of the group is not a dataset.
    #[error("the node at {0} is not a dataset")]
    NotADataset(String),
    /// The datasets of a group do not have the same number of dimensions.
    #[error("the dataset at {path} has {found} dimensions, expected {expected}")]
    RankMismatch {
        /// The dataset path.
        path: String,
        /// The dimensionality of the first dataset in the group.
        expected: usize,
        /// The dimensionality of the dataset.
        found: usize,
    },
    /// The number of axis names is not the dimensionality of the datasets.
    #[error("{found} axis names were supplied for datasets with {expected} dimensions")]
    AxisCountMismatch {
        /// The dimensionality of the datasets.
        expected: usize,
        /// The number of axis names.
        found: usize,
    },
    /// An axis name is not one of `t`, `c`, `z`, `y`, `x`.
    #[error("unknown axis name {0:?}, expected one of t, c, z, y, x")]
    UnknownAxis(String),
    /// The existing `multiscales` attribute is not a list.
    #[error("the multiscales attribute of {0} is not a list")]
    InvalidMultiscalesAttribute(String),
}

/// A failure of the underlying store or downscale transform.
///
/// Errors are passed through without modification.
#[derive(Debug, Error)]
pub enum BackendError {
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// An invalid store prefix.
    #[error(transparent)]
    StorePrefixError(#[from] StorePrefixError),
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// An array creation error.
    #[error(transparent)]
    ArrayCreateError(#[from] ArrayCreateError),
    /// An array error.
    #[error(transparent)]
    ArrayError(#[from] ArrayError),
    /// A node could not be read from the hierarchy.
    #[error(transparent)]
    NodeCreateError(#[from] NodeCreateError),
    /// A group creation error.
    #[error(transparent)]
    GroupCreateError(#[from] GroupCreateError),
    /// A filesystem store creation error.
    #[error(transparent)]
    FilesystemStoreCreateError(#[from] FilesystemStoreCreateError),
    /// A multiscales entry could not be serialised.
    #[error(transparent)]
    InvalidJSON(#[from] serde_json::Error),
    /// The chunk shape does not have the dimensionality of the data.
    #[error("chunk shape {0:?} is incompatible with an array with {1} dimensions")]
    IncompatibleChunkShape(Vec<u64>, usize),
    /// A downscale error.
    #[error(transparent)]
    DownscaleError(#[from] DownscaleError),
}

/// A pyramid error.
#[derive(Debug, Error)]
pub enum PyramidError {
    /// The input array does not have 2 or 3 dimensions.
    #[error(transparent)]
    InvalidRank(#[from] InvalidRankError),
    /// The target is not a group.
    #[error(transparent)]
    InvalidGroup(#[from] InvalidGroupError),
    /// The multiscales schema is violated.
    #[error(transparent)]
    SchemaViolation(#[from] SchemaViolationError),
    /// The underlying store or downscale transform failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

macro_rules! impl_from_backend_error {
    ($($error:ty),* $(,)?) => {
        $(
            impl From<$error> for PyramidError {
                fn from(err: $error) -> Self {
                    Self::Backend(BackendError::from(err))
                }
            }
        )*
    };
}

impl_from_backend_error!(
    StorageError,
    StorePrefixError,
    NodePathError,
    NodeCreateError,
    ArrayCreateError,
    ArrayError,
    GroupCreateError,
    FilesystemStoreCreateError,
    serde_json::Error,
    DownscaleError,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pyramid_error_from_backend() {
        let err = PyramidError::from(StorageError::Other("disk on fire".to_string()));
        assert!(matches!(
            err,
            PyramidError::Backend(BackendError::StorageError(_))
        ));
        assert_eq!(err.to_string(), "disk on fire");

        let err = PyramidError::from(DownscaleError::InvalidScale(-1.0));
        assert!(matches!(
            err,
            PyramidError::Backend(BackendError::DownscaleError(_))
        ));
    }

    #[test]
    fn pyramid_error_display() {
        assert_eq!(
            PyramidError::from(InvalidRankError::new(4)).to_string(),
            "input array has 4 dimensions, only 2D and 3D arrays are supported"
        );
        assert_eq!(
            PyramidError::from(SchemaViolationError::UnknownAxis("w".to_string())).to_string(),
            r#"unknown axis name "w", expected one of t, c, z, y, x"#
        );
    }
}
