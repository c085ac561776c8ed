use crate::{
    HierarchicalStore, InvalidGroupError, PyramidError, SchemaViolationError,
    axis::validate_axis_names,
    hierarchy::child_path,
    multiscale::{
        ARRAY_DIMENSIONS_ATTRIBUTE, MULTISCALES_ATTRIBUTE, MultiscaleEntry,
        multiscales_from_attributes,
    },
};

/// Append a multiscale entry describing the datasets of `group` to its `multiscales` attribute.
///
/// Every child of `group` must be a dataset, and all datasets must have the same dimensionality.
/// The entry references each dataset by name in lexicographical order, so resolution levels must be named such that they sort from highest to lowest resolution.
/// The `_ARRAY_DIMENSIONS` attribute of `group` is overwritten with `axis_names`.
///
/// The attribute update is a read-modify-write without locking, concurrent calls on the same group may lose updates.
/// Calling this function twice appends two entries.
///
/// # Errors
/// Returns a [`PyramidError`] if
///  - `group` is not a group,
///  - `group` has no children or a child is not a dataset,
///  - the datasets do not have the same dimensionality,
///  - the number of `axis_names` is not the dimensionality of the datasets,
///  - an axis name is not one of `t`, `c`, `z`, `y`, `x`, or
///  - the store fails.
pub fn append_multiscale_metadata<S: AsRef<str>>(
    store: &impl HierarchicalStore,
    group: &str,
    name: &str,
    axis_names: &[S],
    transform_type: Option<&str>,
    params: Option<&serde_json::Map<String, serde_json::Value>>,
) -> Result<(), PyramidError> {
    if !store.is_group(group)? {
        return Err(if store.is_dataset(group)? {
            InvalidGroupError::NotAGroup(group.to_string())
        } else {
            InvalidGroupError::MissingNode(group.to_string())
        }
        .into());
    }

    let datasets = store.list_children(group)?;
    if datasets.is_empty() {
        return Err(SchemaViolationError::EmptyGroup(group.to_string()).into());
    }

    let mut rank = None;
    for dataset in &datasets {
        let path = child_path(group, dataset);
        if !store.is_dataset(&path)? {
            return Err(SchemaViolationError::NotADataset(path).into());
        }
        let found = store.dataset_rank(&path)?;
        match rank {
            None => rank = Some(found),
            Some(expected) if expected != found => {
                return Err(SchemaViolationError::RankMismatch {
                    path,
                    expected,
                    found,
                }
                .into());
            }
            Some(_) => {}
        }
    }
    let rank = rank.unwrap_or_default();
    let axes: Vec<String> = validate_axis_names(axis_names, rank)?
        .iter()
        .map(ToString::to_string)
        .collect();

    let entry = MultiscaleEntry::new(name, axes.clone(), datasets)
        .with_type(transform_type.map(str::to_string))
        .with_metadata(params.cloned());

    let mut attributes = store.attributes(group)?;
    let mut multiscales = multiscales_from_attributes(group, &attributes)?;
    multiscales.push(serde_json::to_value(&entry)?);
    log::debug!(
        "appending multiscale entry {name:?} to {group} ({} entries)",
        multiscales.len()
    );
    attributes.insert(
        MULTISCALES_ATTRIBUTE.to_string(),
        serde_json::Value::Array(multiscales),
    );
    attributes.insert(ARRAY_DIMENSIONS_ATTRIBUTE.to_string(), axes.into());
    store.set_attributes(group, attributes)
}
