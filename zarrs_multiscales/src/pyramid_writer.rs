use std::{num::NonZeroU64, path::Path, sync::Arc};

use ndarray::{ArrayBase, CowArray, Data, Dimension, IxDyn};
use zarrs::{
    array::{Array, ArrayMetadata, ArrayMetadataV2, ChunkKeySeparator},
    filesystem::FilesystemStore,
    group::{Group, GroupMetadata},
    metadata::v2::GroupMetadataV2,
    node::NodePath,
    storage::{ReadableWritableListableStorageTraits, StorePrefix, WritableStorageTraits},
};

use crate::{
    BackendError, Downscale, InvalidGroupError, PyramidElement, PyramidError, Rescale,
    ZarrHierarchy,
    axis::default_axis_names,
    hierarchy::{NodeKind, child_path},
    multiscale_builder::append_multiscale_metadata,
};

/// Return the default chunk shape of a pyramid written from an array with `rank` dimensions.
///
/// This is `256x256` for 2D and `64x64x64` for 3D.
///
/// # Errors
/// Returns an [`InvalidRankError`](crate::InvalidRankError) if `rank` is not 2 or 3.
pub fn default_chunk_shape(rank: usize) -> Result<Vec<u64>, crate::InvalidRankError> {
    match rank {
        2 => Ok(vec![256; 2]),
        3 => Ok(vec![64; 3]),
        _ => Err(crate::InvalidRankError::new(rank)),
    }
}

/// A multiscale pyramid writer.
///
/// A writer produces `n_scales` datasets named `s0`, `s1`, ... in a group of a Zarr hierarchy.
/// Groups and datasets are created in the Zarr V2 format with nested chunk keys (`s0/0/0`), as required by OME-NGFF 0.3.
/// `s0` holds the input data, and each subsequent level is produced by downscaling the previous level and casting the result back to the input element type.
/// After all levels are written, a multiscales entry describing the group is appended to the group attributes with [`append_multiscale_metadata`].
///
/// Use the methods in the writer to change the configuration away from the defaults, and then write a pyramid with [`write`](PyramidWriter::write) or [`write_to_path`](PyramidWriter::write_to_path).
///
/// The defaults are:
///  - the group: the root of the hierarchy,
///  - the chunk shape: `256x256` for 2D data and `64x64x64` for 3D data, clipped to the shape of each level, and
///  - the downscale transform: [`Rescale::default`], halving every axis with nearest neighbour interpolation.
///
/// ```rust
/// # use std::sync::Arc;
/// use zarrs_multiscales::{PyramidWriter, Rescale};
/// # let store = Arc::new(zarrs::storage::store::MemoryStore::new());
/// let data = ndarray::Array2::<u16>::zeros((100, 80));
/// PyramidWriter::new("raw", 3)
///     .key("volumes/raw")
///     .chunk_shape(vec![32, 32])
///     .downscaler(Rescale::new().with_scale([0.5]))
///     .write(store, &data)?;
/// # Ok::<_, zarrs_multiscales::PyramidError>(())
/// ```
#[derive(Clone, Debug)]
pub struct PyramidWriter<D = Rescale> {
    name: String,
    n_scales: usize,
    key: Option<String>,
    chunk_shape: Option<Vec<u64>>,
    downscaler: D,
}

impl PyramidWriter {
    /// Create a new pyramid writer with `n_scales` resolution levels.
    ///
    /// `name` is the name of the multiscales entry.
    /// `n_scales` of zero is treated as one.
    #[must_use]
    pub fn new(name: impl Into<String>, n_scales: usize) -> Self {
        Self {
            name: name.into(),
            n_scales,
            key: None,
            chunk_shape: None,
            downscaler: Rescale::default(),
        }
    }
}

impl<D: Downscale> PyramidWriter<D> {
    /// Set the path of the group holding the pyramid, relative to the root of the hierarchy.
    ///
    /// Groups on the path are created as needed.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the chunk shape of every level.
    ///
    /// The chunk shape is clipped to the shape of each level.
    #[must_use]
    pub fn chunk_shape(mut self, chunk_shape: Vec<u64>) -> Self {
        self.chunk_shape = Some(chunk_shape);
        self
    }

    /// Set the downscale transform.
    #[must_use]
    pub fn downscaler<D2: Downscale>(self, downscaler: D2) -> PyramidWriter<D2> {
        PyramidWriter {
            name: self.name,
            n_scales: self.n_scales,
            key: self.key,
            chunk_shape: self.chunk_shape,
            downscaler,
        }
    }

    /// Return the node path of the group holding the pyramid.
    fn group_path(&self) -> String {
        match self.key.as_deref().map(|key| key.trim_matches('/')) {
            None | Some("") => "/".to_string(),
            Some(key) => format!("/{key}"),
        }
    }

    /// Write a pyramid of `data` to a [`FilesystemStore`] at `path`.
    ///
    /// The store directory is created if it does not exist, existing content is preserved.
    ///
    /// # Errors
    /// See [`write`](PyramidWriter::write).
    pub fn write_to_path<T, S, Dim>(
        &self,
        path: impl AsRef<Path>,
        data: &ArrayBase<S, Dim>,
    ) -> Result<(), PyramidError>
    where
        T: PyramidElement,
        S: Data<Elem = T>,
        Dim: Dimension,
    {
        default_axis_names(data.ndim())?;
        let store = Arc::new(FilesystemStore::new(path.as_ref())?);
        self.write(store, data)
    }

    /// Write a pyramid of `data` to `storage`.
    ///
    /// Partially written pyramids are not removed on failure, and no multiscales entry is recorded for them.
    ///
    /// # Errors
    /// Returns a [`PyramidError`] if
    ///  - `data` does not have 2 or 3 dimensions (nothing is written),
    ///  - a node on the group path or a level path is held by an incompatible node,
    ///  - the downscale transform fails, or
    ///  - the store fails.
    pub fn write<T, S, Dim, TStorage>(
        &self,
        storage: Arc<TStorage>,
        data: &ArrayBase<S, Dim>,
    ) -> Result<(), PyramidError>
    where
        T: PyramidElement,
        S: Data<Elem = T>,
        Dim: Dimension,
        TStorage: ?Sized + ReadableWritableListableStorageTraits + 'static,
    {
        let rank = data.ndim();
        let axes = default_axis_names(rank)?;
        let chunk_shape = match &self.chunk_shape {
            Some(chunk_shape) if chunk_shape.len() != rank => {
                return Err(BackendError::IncompatibleChunkShape(chunk_shape.clone(), rank).into());
            }
            Some(chunk_shape) => chunk_shape.clone(),
            None => default_chunk_shape(rank)?,
        };

        let group = self.group_path();
        NodePath::new(&group)?;
        let hierarchy = ZarrHierarchy::new(storage);
        create_groups(&hierarchy, &group)?;

        let mut level: CowArray<T, IxDyn> = data.as_standard_layout().into_dyn();
        for scale in 0..self.n_scales.max(1) {
            if scale > 0 {
                let downscaled = self
                    .downscaler
                    .downscale(level.mapv(T::to_f64).view(), T::input_range())?;
                level = CowArray::from(downscaled.mapv(T::from_f64));
            }
            let path = child_path(&group, &format!("s{scale}"));
            write_level(&hierarchy, &path, &level, &chunk_shape)?;
            log::info!("wrote level {path} with shape {:?}", level.shape());
        }

        let params = self.downscaler.parameters(rank);
        append_multiscale_metadata(
            &hierarchy,
            &group,
            &self.name,
            &axes.iter().map(|axis| axis.as_str()).collect::<Vec<_>>(),
            Some(&self.downscaler.transform_type()),
            params.as_ref(),
        )
    }
}

/// Create the groups on `group` that do not exist, including the root group.
fn create_groups<TStorage>(
    hierarchy: &ZarrHierarchy<TStorage>,
    group: &str,
) -> Result<(), PyramidError>
where
    TStorage: ?Sized + ReadableWritableListableStorageTraits + 'static,
{
    let mut path = "/".to_string();
    let components = group.split('/').filter(|component| !component.is_empty());
    for component in std::iter::once("").chain(components) {
        if !component.is_empty() {
            path = child_path(&path, component);
        }
        match hierarchy.node_kind(&path)? {
            Some((_, NodeKind::Group)) => {}
            Some((_, NodeKind::Dataset)) => {
                return Err(InvalidGroupError::NotAGroup(path).into());
            }
            None => {
                log::debug!("creating group {path}");
                Group::new_with_metadata(
                    hierarchy.storage().clone(),
                    &path,
                    GroupMetadata::V2(GroupMetadataV2::new()),
                )?
                .store_metadata()?;
            }
        }
    }
    Ok(())
}

/// Write `level` as a dataset at `path`, replacing an existing dataset.
fn write_level<T, S, TStorage>(
    hierarchy: &ZarrHierarchy<TStorage>,
    path: &str,
    level: &ArrayBase<S, IxDyn>,
    chunk_shape: &[u64],
) -> Result<(), PyramidError>
where
    T: PyramidElement,
    S: Data<Elem = T>,
    TStorage: ?Sized + ReadableWritableListableStorageTraits + 'static,
{
    match hierarchy.node_kind(path)? {
        Some((_, NodeKind::Group)) => {
            return Err(InvalidGroupError::LevelOccupied(path.to_string()).into());
        }
        Some((_, NodeKind::Dataset)) => {
            log::warn!("overwriting the existing dataset at {path}");
            let prefix = StorePrefix::new(format!("{}/", path.trim_start_matches('/')))?;
            hierarchy.storage().erase_prefix(&prefix)?;
        }
        None => {}
    }

    let shape: Vec<u64> = level.shape().iter().map(|&size| size as u64).collect();
    let chunks: Vec<NonZeroU64> = chunk_shape
        .iter()
        .zip(&shape)
        .map(|(&chunk, &size)| NonZeroU64::new(chunk.min(size)).unwrap_or(NonZeroU64::MIN))
        .collect();
    let metadata = ArrayMetadataV2::new(
        shape,
        chunks,
        <T as PyramidElement>::data_type(),
        <T as PyramidElement>::fill_value(),
        None,
        None,
    )
    .with_dimension_separator(ChunkKeySeparator::Slash);
    let array = Array::new_with_metadata(
        hierarchy.storage().clone(),
        path,
        ArrayMetadata::V2(metadata),
    )?;
    array.store_metadata()?;
    let subset = array.subset_all();
    match level.as_slice() {
        Some(elements) => array.store_array_subset(&subset, elements)?,
        None => array.store_array_subset(&subset, level.to_owned())?,
    }
    Ok(())
}

/// Write a multiscale pyramid of `data` with `n_scales` levels to the root group of a [`FilesystemStore`] at `path`.
///
/// This uses the default configuration of a [`PyramidWriter`], see [`PyramidWriter::new`].
///
/// # Errors
/// See [`PyramidWriter::write`].
pub fn write_pyramid<T, S, Dim>(
    data: &ArrayBase<S, Dim>,
    path: impl AsRef<Path>,
    name: &str,
    n_scales: usize,
) -> Result<(), PyramidError>
where
    T: PyramidElement,
    S: Data<Elem = T>,
    Dim: Dimension,
{
    PyramidWriter::new(name, n_scales).write_to_path(path, data)
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, ArrayD};
    use zarrs::storage::store::MemoryStore;

    use super::*;
    use crate::HierarchicalStore;

    #[test]
    fn pyramid_writer_default_chunk_shape() {
        assert_eq!(default_chunk_shape(2).unwrap(), vec![256, 256]);
        assert_eq!(default_chunk_shape(3).unwrap(), vec![64, 64, 64]);
        assert_eq!(default_chunk_shape(4).unwrap_err().rank(), 4);
    }

    #[test]
    fn pyramid_writer_group_path() {
        assert_eq!(PyramidWriter::new("raw", 1).group_path(), "/");
        assert_eq!(PyramidWriter::new("raw", 1).key("").group_path(), "/");
        assert_eq!(PyramidWriter::new("raw", 1).key("a/b").group_path(), "/a/b");
        assert_eq!(PyramidWriter::new("raw", 1).key("/a/b/").group_path(), "/a/b");
    }

    #[test]
    fn pyramid_writer_memory_store() {
        let store = Arc::new(MemoryStore::new());
        let data = Array2::<u8>::from_elem((6, 9), 7);
        PyramidWriter::new("raw", 3)
            .key("a")
            .write(store.clone(), &data)
            .unwrap();

        let hierarchy = ZarrHierarchy::new(store.clone());
        assert!(hierarchy.is_group("/").unwrap());
        assert!(hierarchy.is_group("/a").unwrap());
        assert_eq!(hierarchy.list_children("/a").unwrap(), ["s0", "s1", "s2"]);
        for (path, shape) in [("/a/s1", [3u64, 4]), ("/a/s2", [2, 2])] {
            let array = zarrs::array::Array::open(store.clone(), path).unwrap();
            assert_eq!(array.shape(), shape);
            let level: ArrayD<u8> = array.retrieve_array_subset(&array.subset_all()).unwrap();
            assert!(level.iter().all(|&value| value == 7));
        }
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn pyramid_writer_transposed_input() {
        let store = Arc::new(MemoryStore::new());
        let data = Array2::<u16>::from_shape_fn((4, 6), |(y, x)| (y * 6 + x) as u16);
        let transposed = data.t();
        PyramidWriter::new("raw", 2)
            .write(store.clone(), &transposed)
            .unwrap();

        let array = zarrs::array::Array::open(store.clone(), "/s0").unwrap();
        assert_eq!(array.shape(), [6u64, 4]);
        let s0: ArrayD<u16> = array.retrieve_array_subset(&array.subset_all()).unwrap();
        assert_eq!(s0, transposed.into_dyn());
        let s1 = zarrs::array::Array::open(store, "/s1").unwrap();
        assert_eq!(s1.shape(), [3u64, 2]);
    }
}
