//! Persistent disk tier.
//!
//! One container per cluster under a single root directory, named by the
//! zero-padded cluster id (`00042.json`). All I/O goes through a
//! [`ContainerBackend`]; failures propagate unchanged and are never retried.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use strata_core::{CacheResult, ClusterId, ContainerError, FieldMap, FieldName, FieldValue};

use crate::container::{ContainerBackend, JsonContainerBackend, OpenMode};

/// Width of the zero-padded cluster id in container file names.
const CLUSTER_NAME_WIDTH: usize = 5;

/// Stores per-cluster field values in one keyed container per cluster.
pub struct DiskStore {
    root: PathBuf,
    backend: Box<dyn ContainerBackend>,
}

impl DiskStore {
    /// Open a disk store rooted at `root` with the default JSON backend.
    ///
    /// The directory is created when absent and resolved to its canonical
    /// real path.
    pub fn new(root: impl AsRef<Path>) -> CacheResult<Self> {
        Self::with_backend(root, Box::new(JsonContainerBackend::new()))
    }

    /// Open a disk store with a caller-supplied container backend.
    pub fn with_backend(
        root: impl AsRef<Path>,
        backend: Box<dyn ContainerBackend>,
    ) -> CacheResult<Self> {
        std::fs::create_dir_all(root.as_ref()).map_err(ContainerError::Io)?;
        let root = root
            .as_ref()
            .canonicalize()
            .map_err(ContainerError::Io)?;
        Ok(Self { root, backend })
    }

    /// Canonical root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a cluster's container.
    fn container_path(&self, cluster: ClusterId) -> PathBuf {
        self.root.join(format!(
            "{cluster:0width$}.{ext}",
            width = CLUSTER_NAME_WIDTH,
            ext = self.backend.extension()
        ))
    }

    fn container_exists(&self, cluster: ClusterId) -> bool {
        self.container_path(cluster).exists()
    }

    /// Write each field into the cluster's container, creating the container
    /// when absent. An empty map still creates the container, mirroring the
    /// memory tier's record creation.
    pub fn store(&mut self, cluster: ClusterId, fields: &FieldMap) -> CacheResult<()> {
        let path = self.container_path(cluster);
        let mut container = self.backend.open(&path, OpenMode::Append)?;
        for (name, value) in fields {
            container.put(name, value)?;
        }
        container.close()
    }

    /// All fields stored for a cluster, or an empty map if the container is
    /// absent.
    pub fn load_all(&self, cluster: ClusterId) -> CacheResult<FieldMap> {
        if !self.container_exists(cluster) {
            return Ok(FieldMap::new());
        }
        let container = self
            .backend
            .open(&self.container_path(cluster), OpenMode::ReadOnly)?;
        let mut out = FieldMap::new();
        for name in container.keys() {
            if let Some(value) = container.get(&name)? {
                out.insert(name, value);
            }
        }
        container.close()?;
        Ok(out)
    }

    /// One field's value, or `None` if the container or field is absent.
    pub fn load_field(&self, cluster: ClusterId, name: &str) -> CacheResult<Option<FieldValue>> {
        if !self.container_exists(cluster) {
            return Ok(None);
        }
        let container = self
            .backend
            .open(&self.container_path(cluster), OpenMode::ReadOnly)?;
        let value = container.get(name)?;
        container.close()?;
        Ok(value)
    }

    /// The requested fields, each `None` when missing.
    pub fn load_fields(
        &self,
        cluster: ClusterId,
        names: &[FieldName],
    ) -> CacheResult<BTreeMap<FieldName, Option<FieldValue>>> {
        if !self.container_exists(cluster) {
            return Ok(names.iter().map(|name| (name.clone(), None)).collect());
        }
        let container = self
            .backend
            .open(&self.container_path(cluster), OpenMode::ReadOnly)?;
        let mut out = BTreeMap::new();
        for name in names {
            out.insert(name.clone(), container.get(name)?);
        }
        container.close()?;
        Ok(out)
    }

    /// Sorted cluster ids, decoded from container file names. Files that do
    /// not match the naming scheme are skipped.
    pub fn cluster_ids(&self) -> CacheResult<Vec<ClusterId>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(ContainerError::Io)? {
            let entry = entry.map_err(ContainerError::Io)?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.backend.extension()) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(id) = stem.parse::<ClusterId>() {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// Remove the container for each id present; absent ids are ignored.
    pub fn delete(&mut self, clusters: &[ClusterId]) -> CacheResult<()> {
        for &cluster in clusters {
            let path = self.container_path(cluster);
            if path.exists() {
                std::fs::remove_file(&path).map_err(ContainerError::Io)?;
            }
        }
        Ok(())
    }

    /// Delete every container under the root.
    pub fn clear(&mut self) -> CacheResult<()> {
        let ids = self.cluster_ids()?;
        self.delete(&ids)
    }
}

// =============================================================================
// TESTS
// =============================================================================
