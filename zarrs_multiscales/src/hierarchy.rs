//! Hierarchical store access.
//!
//! The multiscales metadata builder needs a small set of capabilities from a hierarchical store: node type queries, child listing, dataset dimensionality, and attribute access.
//! These are captured by the [`HierarchicalStore`] trait.
//!
//! [`ZarrHierarchy`] implements [`HierarchicalStore`] for any `zarrs` store.
//! Zarr V2 nodes (`.zgroup`, `.zarray`, `.zattrs`) and Zarr V3 nodes (`zarr.json`) are both supported, the format is detected per node.

use std::sync::Arc;

use zarrs::{
    array::{Array, ArrayMetadata},
    group::{Group, GroupMetadata},
    node::{Node, NodeCreateError, NodeMetadata, NodePath, get_child_nodes},
    storage::ReadableWritableListableStorageTraits,
};

use crate::{InvalidGroupError, PyramidError, SchemaViolationError};

/// The capabilities of a hierarchical store required to build multiscales metadata.
///
/// Node paths are absolute, e.g. `/`, `/group`, `/group/s0`.
pub trait HierarchicalStore {
    /// Returns true if a group exists at `path`.
    ///
    /// # Errors
    /// Returns a [`PyramidError`] if `path` is invalid or the store fails.
    fn is_group(&self, path: &str) -> Result<bool, PyramidError>;

    /// Returns true if a dataset exists at `path`.
    ///
    /// # Errors
    /// Returns a [`PyramidError`] if `path` is invalid or the store fails.
    fn is_dataset(&self, path: &str) -> Result<bool, PyramidError>;

    /// Returns the names of the child nodes of the group at `path` in lexicographical order.
    ///
    /// # Errors
    /// Returns a [`PyramidError`] if `path` is invalid or the store fails.
    fn list_children(&self, path: &str) -> Result<Vec<String>, PyramidError>;

    /// Returns the number of dimensions of the dataset at `path`.
    ///
    /// # Errors
    /// Returns a [`PyramidError`] if there is no dataset at `path` or the store fails.
    fn dataset_rank(&self, path: &str) -> Result<usize, PyramidError>;

    /// Returns the attributes of the node at `path`.
    ///
    /// # Errors
    /// Returns a [`PyramidError`] if there is no node at `path` or the store fails.
    fn attributes(
        &self,
        path: &str,
    ) -> Result<serde_json::Map<String, serde_json::Value>, PyramidError>;

    /// Replace the attributes of the node at `path`.
    ///
    /// # Errors
    /// Returns a [`PyramidError`] if there is no node at `path` or the store fails.
    fn set_attributes(
        &self,
        path: &str,
        attributes: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), PyramidError>;
}

/// The metadata format of a Zarr node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZarrFormat {
    /// Zarr V2: `.zgroup` / `.zarray` with attributes in `.zattrs`.
    V2,
    /// Zarr V3: `zarr.json` holding the node type and attributes.
    V3,
}

/// The type of a Zarr node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A group.
    Group,
    /// A dataset (a Zarr array).
    Dataset,
}

/// A [`HierarchicalStore`] over a `zarrs` store.
#[derive(Debug)]
pub struct ZarrHierarchy<TStorage: ?Sized> {
    storage: Arc<TStorage>,
}

impl<TStorage: ?Sized> Clone for ZarrHierarchy<TStorage> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

/// Join a child `name` onto a node `path`.
pub(crate) fn child_path(path: &str, name: &str) -> String {
    if path == "/" {
        format!("/{name}")
    } else {
        format!("{}/{name}", path.trim_end_matches('/'))
    }
}

impl<TStorage: ?Sized + ReadableWritableListableStorageTraits + 'static> ZarrHierarchy<TStorage> {
    /// Create a new hierarchy view of `storage`.
    #[must_use]
    pub fn new(storage: Arc<TStorage>) -> Self {
        Self { storage }
    }

    /// Return the underlying storage.
    #[must_use]
    pub fn storage(&self) -> &Arc<TStorage> {
        &self.storage
    }

    /// Return the format and type of the node at `path`, or [`None`] if there is no node.
    ///
    /// # Errors
    /// Returns a [`PyramidError`] if `path` is invalid, the store fails, or the node metadata is invalid.
    pub fn node_kind(&self, path: &str) -> Result<Option<(ZarrFormat, NodeKind)>, PyramidError> {
        Ok(self.node_metadata(path)?.map(|metadata| match metadata {
            NodeMetadata::Array(ArrayMetadata::V2(_)) => (ZarrFormat::V2, NodeKind::Dataset),
            NodeMetadata::Array(ArrayMetadata::V3(_)) => (ZarrFormat::V3, NodeKind::Dataset),
            NodeMetadata::Group(GroupMetadata::V2(_)) => (ZarrFormat::V2, NodeKind::Group),
            NodeMetadata::Group(GroupMetadata::V3(_)) => (ZarrFormat::V3, NodeKind::Group),
        }))
    }

    fn node_metadata(&self, path: &str) -> Result<Option<NodeMetadata>, PyramidError> {
        match Node::open(&self.storage, path) {
            Ok(node) => Ok(Some(node.into())),
            Err(NodeCreateError::MissingMetadata(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn existing_node(&self, path: &str) -> Result<NodeMetadata, PyramidError> {
        self.node_metadata(path)?
            .ok_or_else(|| InvalidGroupError::MissingNode(path.to_string()).into())
    }
}

impl<TStorage: ?Sized + ReadableWritableListableStorageTraits + 'static> HierarchicalStore
    for ZarrHierarchy<TStorage>
{
    fn is_group(&self, path: &str) -> Result<bool, PyramidError> {
        Ok(matches!(self.node_kind(path)?, Some((_, NodeKind::Group))))
    }

    fn is_dataset(&self, path: &str) -> Result<bool, PyramidError> {
        Ok(matches!(self.node_kind(path)?, Some((_, NodeKind::Dataset))))
    }

    fn list_children(&self, path: &str) -> Result<Vec<String>, PyramidError> {
        let path = NodePath::new(path)?;
        let mut names: Vec<String> = get_child_nodes(&self.storage, &path, false)?
            .iter()
            .map(|node| node.name().as_str().to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    fn dataset_rank(&self, path: &str) -> Result<usize, PyramidError> {
        match self.existing_node(path)? {
            NodeMetadata::Array(ArrayMetadata::V2(metadata)) => Ok(metadata.shape.len()),
            NodeMetadata::Array(ArrayMetadata::V3(metadata)) => Ok(metadata.shape.len()),
            NodeMetadata::Group(_) => {
                Err(SchemaViolationError::NotADataset(path.to_string()).into())
            }
        }
    }

    fn attributes(
        &self,
        path: &str,
    ) -> Result<serde_json::Map<String, serde_json::Value>, PyramidError> {
        Ok(match self.existing_node(path)? {
            NodeMetadata::Array(ArrayMetadata::V2(metadata)) => metadata.attributes,
            NodeMetadata::Array(ArrayMetadata::V3(metadata)) => metadata.attributes,
            NodeMetadata::Group(GroupMetadata::V2(metadata)) => metadata.attributes,
            NodeMetadata::Group(GroupMetadata::V3(metadata)) => metadata.attributes,
        })
    }

    fn set_attributes(
        &self,
        path: &str,
        attributes: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), PyramidError> {
        match self.existing_node(path)? {
            NodeMetadata::Group(_) => {
                let mut group = Group::open(self.storage.clone(), path)?;
                *group.attributes_mut() = attributes;
                group.store_metadata()?;
            }
            NodeMetadata::Array(_) => {
                let mut array = Array::open(self.storage.clone(), path)?;
                *array.attributes_mut() = attributes;
                array.store_metadata()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use zarrs::{
        array::{ArrayBuilder, data_type},
        group::GroupBuilder,
        storage::{ReadableStorageTraits, StoreKey, WritableStorageTraits, store::MemoryStore},
    };

    use super::*;
    use crate::BackendError;

    fn set_json(store: &MemoryStore, key: &str, value: &serde_json::Value) {
        store
            .set(
                &StoreKey::new(key).unwrap(),
                serde_json::to_vec(value).unwrap().into(),
            )
            .unwrap();
    }

    fn v3_hierarchy() -> ZarrHierarchy<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        GroupBuilder::new()
            .build(store.clone(), "/")
            .unwrap()
            .store_metadata()
            .unwrap();
        GroupBuilder::new()
            .build(store.clone(), "/group")
            .unwrap()
            .store_metadata()
            .unwrap();
        for (path, shape) in [("/group/b", vec![4u64, 4]), ("/group/a", vec![2u64, 2, 2])] {
            let chunk_shape = vec![2u64; shape.len()];
            ArrayBuilder::new(shape, chunk_shape, data_type::uint8(), 0u8)
                .build(store.clone(), path)
                .unwrap()
                .store_metadata()
                .unwrap();
        }
        ZarrHierarchy::new(store)
    }

    #[test]
    fn zarr_hierarchy_v3_nodes() {
        let hierarchy = v3_hierarchy();
        assert!(hierarchy.is_group("/").unwrap());
        assert!(hierarchy.is_group("/group").unwrap());
        assert!(!hierarchy.is_dataset("/group").unwrap());
        assert!(hierarchy.is_dataset("/group/b").unwrap());
        assert!(!hierarchy.is_group("/missing").unwrap());
        assert_eq!(
            hierarchy.node_kind("/group/b").unwrap(),
            Some((ZarrFormat::V3, NodeKind::Dataset))
        );
        assert_eq!(hierarchy.dataset_rank("/group/b").unwrap(), 2);
        assert_eq!(hierarchy.list_children("/").unwrap(), ["group"]);
        assert!(matches!(
            hierarchy.dataset_rank("/group"),
            Err(PyramidError::SchemaViolation(_))
        ));
        assert!(matches!(
            hierarchy.attributes("/missing"),
            Err(PyramidError::InvalidGroup(InvalidGroupError::MissingNode(_)))
        ));
    }

    #[test]
    fn zarr_hierarchy_v3_attributes() {
        let hierarchy = v3_hierarchy();
        assert!(hierarchy.attributes("/group").unwrap().is_empty());
        let attributes = json!({"foo": "bar", "n": [1, 2]});
        hierarchy
            .set_attributes("/group", attributes.as_object().unwrap().clone())
            .unwrap();
        assert_eq!(
            serde_json::Value::Object(hierarchy.attributes("/group").unwrap()),
            attributes
        );
        assert_eq!(
            hierarchy.node_kind("/group").unwrap(),
            Some((ZarrFormat::V3, NodeKind::Group))
        );
    }

    #[test]
    fn zarr_hierarchy_v2() {
        let store = Arc::new(MemoryStore::new());
        set_json(&store, ".zgroup", &json!({"zarr_format": 2}));
        set_json(&store, "raw/.zgroup", &json!({"zarr_format": 2}));
        set_json(&store, "raw/.zattrs", &json!({"foo": 1}));
        set_json(
            &store,
            "raw/s0/.zarray",
            &json!({
                "zarr_format": 2,
                "shape": [4, 4, 4],
                "chunks": [2, 2, 2],
                "dtype": "|u1",
                "compressor": null,
                "fill_value": 0,
                "order": "C",
                "filters": null,
                "dimension_separator": "/"
            }),
        );
        let hierarchy = ZarrHierarchy::new(store.clone());
        assert_eq!(
            hierarchy.node_kind("/raw").unwrap(),
            Some((ZarrFormat::V2, NodeKind::Group))
        );
        assert!(hierarchy.is_dataset("/raw/s0").unwrap());
        assert_eq!(hierarchy.dataset_rank("/raw/s0").unwrap(), 3);
        assert_eq!(hierarchy.list_children("/raw").unwrap(), ["s0"]);
        assert_eq!(hierarchy.attributes("/raw").unwrap().get("foo"), Some(&json!(1)));
        assert!(hierarchy.attributes("/").unwrap().is_empty());

        let mut attributes = hierarchy.attributes("/raw").unwrap();
        attributes.insert("bar".to_string(), json!(true));
        hierarchy.set_attributes("/raw", attributes).unwrap();
        let zattrs = store.get(&StoreKey::new("raw/.zattrs").unwrap()).unwrap().unwrap();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&zattrs).unwrap(),
            json!({"foo": 1, "bar": true})
        );
        assert!(store.get(&StoreKey::new("raw/.zgroup").unwrap()).unwrap().is_some());
        assert!(store.get(&StoreKey::new("raw/zarr.json").unwrap()).unwrap().is_none());

        let dims = json!({"_ARRAY_DIMENSIONS": ["z", "y", "x"]});
        hierarchy
            .set_attributes("/raw/s0", dims.as_object().unwrap().clone())
            .unwrap();
        assert_eq!(
            hierarchy.attributes("/raw/s0").unwrap().get("_ARRAY_DIMENSIONS"),
            Some(&json!(["z", "y", "x"]))
        );
        assert_eq!(
            hierarchy.node_kind("/raw/s0").unwrap(),
            Some((ZarrFormat::V2, NodeKind::Dataset))
        );
    }

    #[test]
    fn zarr_hierarchy_invalid_node_type() {
        let store = Arc::new(MemoryStore::new());
        set_json(&store, "zarr.json", &json!({"zarr_format": 3, "node_type": "tree"}));
        let hierarchy = ZarrHierarchy::new(store);
        assert!(matches!(
            hierarchy.is_group("/"),
            Err(PyramidError::Backend(BackendError::NodeCreateError(_)))
        ));
    }

    #[test]
    fn zarr_hierarchy_ignores_unrecognised_objects() {
        testing_logger::setup();
        let hierarchy = v3_hierarchy();
        hierarchy
            .storage()
            .set(&StoreKey::new("group/notes/readme.txt").unwrap(), vec![0].into())
            .unwrap();
        assert_eq!(hierarchy.list_children("/group").unwrap(), ["a", "b"]);
        testing_logger::validate(|captured_logs| {
            let warnings: Vec<_> = captured_logs
                .iter()
                .filter(|log| log.level == log::Level::Warn)
                .collect();
            assert_eq!(warnings.len(), 1);
            assert_eq!(
                warnings[0].body,
                "Object at /group/notes is not recognized as a component of a Zarr hierarchy. Ignoring."
            );
        });
    }

    #[test]
    fn child_path_join() {
        assert_eq!(child_path("/", "s0"), "/s0");
        assert_eq!(child_path("/a/b", "s0"), "/a/b/s0");
    }
}
