//! OME-NGFF `multiscales` metadata.
//!
//! See <https://ngff.openmicroscopy.org/0.3/#multiscale-md>.

use serde::{Deserialize, Serialize};

use crate::SchemaViolationError;

/// The version of the multiscales metadata written by this crate.
pub const MULTISCALES_VERSION: &str = "0.3";

/// The group attribute holding the list of multiscale entries.
pub const MULTISCALES_ATTRIBUTE: &str = "multiscales";

/// The group attribute holding the axis names of the most recently written multiscale entry.
pub const ARRAY_DIMENSIONS_ATTRIBUTE: &str = "_ARRAY_DIMENSIONS";

/// A reference to one resolution level of a multiscale image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetReference {
    /// The path of the dataset relative to the group.
    pub path: String,
}

/// A multiscale image entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiscaleEntry {
    /// The resolution levels, from highest to lowest resolution.
    pub datasets: Vec<DatasetReference>,
    /// The axis names.
    pub axes: Vec<String>,
    /// The name of the multiscale image.
    pub name: String,
    /// The metadata version.
    pub version: String,
    /// The downscaling transform.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub transform_type: Option<String>,
    /// Free-form parameters of the downscaling transform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl MultiscaleEntry {
    /// Create a new multiscale entry with the current [`MULTISCALES_VERSION`].
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        axes: Vec<String>,
        dataset_paths: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            datasets: dataset_paths
                .into_iter()
                .map(|path| DatasetReference { path })
                .collect(),
            axes,
            name: name.into(),
            version: MULTISCALES_VERSION.to_string(),
            transform_type: None,
            metadata: None,
        }
    }

    /// Set the downscaling transform.
    #[must_use]
    pub fn with_type(mut self, transform_type: Option<String>) -> Self {
        self.transform_type = transform_type;
        self
    }

    /// Set the downscaling parameters.
    #[must_use]
    pub fn with_metadata(
        mut self,
        metadata: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Return the `multiscales` list of group `attributes`, or an empty list if it is absent.
///
/// Existing entries are returned as raw JSON values so that entries of other versions are preserved.
///
/// # Errors
/// Returns [`SchemaViolationError::InvalidMultiscalesAttribute`] if the attribute is present but not a list.
pub fn multiscales_from_attributes(
    group_path: &str,
    attributes: &serde_json::Map<String, serde_json::Value>,
) -> Result<Vec<serde_json::Value>, SchemaViolationError> {
    match attributes.get(MULTISCALES_ATTRIBUTE) {
        None => Ok(Vec::new()),
        Some(serde_json::Value::Array(entries)) => Ok(entries.clone()),
        Some(_) => Err(SchemaViolationError::InvalidMultiscalesAttribute(
            group_path.to_string(),
        )),
    }
}
