//! Keyed-container backend for the disk tier.
//!
//! The disk tier does not care how field values are laid out on disk; it
//! only needs, per cluster, a container supporting get/put/exists/keys
//! against field names. These traits capture that contract, and
//! [`JsonContainerBackend`] is the default implementation: one JSON file per
//! cluster carrying a write timestamp and a SHA-256 checksum of the field
//! payload.
//!
//! Handles are scoped per call: the disk tier opens a container, performs
//! one operation, and closes it. Nothing here holds a file open across
//! calls.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use strata_core::{CacheResult, ContainerError, FieldMap, FieldName, FieldValue};

/// How a container is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Queries only; the container must already exist.
    ReadOnly,
    /// Create the container when absent, update it in place otherwise.
    Append,
    /// Start a fresh container, discarding any existing content.
    Create,
}

/// One cluster's container, opened for the duration of a single operation.
pub trait FieldContainer {
    /// Whether a value is stored under `key`.
    fn exists(&self, key: &str) -> bool;

    /// The value stored under `key`, or `None`.
    fn get(&self, key: &str) -> CacheResult<Option<FieldValue>>;

    /// Write `value` under `key`, overwriting any previous value. Fails on
    /// read-only containers.
    fn put(&mut self, key: &str, value: &FieldValue) -> CacheResult<()>;

    /// All stored field names.
    fn keys(&self) -> Vec<FieldName>;

    /// Flush pending writes and release the handle.
    fn close(self: Box<Self>) -> CacheResult<()>;
}

/// Factory for per-cluster containers at deterministic paths.
pub trait ContainerBackend {
    /// File extension used by this backend's containers (no leading dot).
    fn extension(&self) -> &str;

    /// Open the container at `path` in the given mode.
    fn open(&self, path: &Path, mode: OpenMode) -> CacheResult<Box<dyn FieldContainer>>;
}

// =============================================================================
// JSON BACKEND
// =============================================================================

/// On-disk frame of one container file.
#[derive(Debug, Serialize, Deserialize)]
struct ContainerFile {
    /// When the container was last written.
    written_at: DateTime<Utc>,
    /// Hex SHA-256 of the canonical serialization of `fields`.
    checksum: String,
    fields: FieldMap,
}

/// Default backend: one JSON file per cluster.
///
/// The checksum is verified on every open, so a truncated or hand-edited
/// container surfaces as [`ContainerError::Corrupt`] instead of quietly
/// feeding bad values back into the pipeline.
#[derive(Debug, Clone, Default)]
pub struct JsonContainerBackend;

impl JsonContainerBackend {
    pub fn new() -> Self {
        Self
    }
}

fn checksum_of(fields: &FieldMap) -> CacheResult<String> {
    // FieldMap is a BTreeMap, so this serialization is deterministic.
    let bytes = serde_json::to_vec(fields).map_err(|e| ContainerError::Serialization {
        reason: e.to_string(),
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

fn read_container(path: &Path) -> CacheResult<FieldMap> {
    let bytes = std::fs::read(path).map_err(ContainerError::Io)?;
    let file: ContainerFile =
        serde_json::from_slice(&bytes).map_err(|e| ContainerError::Deserialization {
            reason: e.to_string(),
        })?;
    if checksum_of(&file.fields)? != file.checksum {
        return Err(ContainerError::Corrupt {
            path: path.display().to_string(),
            reason: "checksum mismatch".to_string(),
        }
        .into());
    }
    Ok(file.fields)
}

struct JsonContainer {
    path: PathBuf,
    mode: OpenMode,
    fields: FieldMap,
}

impl ContainerBackend for JsonContainerBackend {
    fn extension(&self) -> &str {
        "json"
    }

    fn open(&self, path: &Path, mode: OpenMode) -> CacheResult<Box<dyn FieldContainer>> {
        let fields = match mode {
            OpenMode::ReadOnly => read_container(path)?,
            OpenMode::Append => {
                if path.exists() {
                    read_container(path)?
                } else {
                    FieldMap::new()
                }
            }
            OpenMode::Create => FieldMap::new(),
        };
        Ok(Box::new(JsonContainer {
            path: path.to_path_buf(),
            mode,
            fields,
        }))
    }
}

impl FieldContainer for JsonContainer {
    fn exists(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    fn get(&self, key: &str) -> CacheResult<Option<FieldValue>> {
        Ok(self.fields.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &FieldValue) -> CacheResult<()> {
        if self.mode == OpenMode::ReadOnly {
            return Err(ContainerError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "container opened read-only",
            ))
            .into());
        }
        self.fields.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn keys(&self) -> Vec<FieldName> {
        self.fields.keys().cloned().collect()
    }

    fn close(self: Box<Self>) -> CacheResult<()> {
        if self.mode == OpenMode::ReadOnly {
            return Ok(());
        }
        let file = ContainerFile {
            written_at: Utc::now(),
            checksum: checksum_of(&self.fields)?,
            fields: self.fields,
        };
        let bytes = serde_json::to_vec(&file).map_err(|e| ContainerError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(&self.path, bytes).map_err(ContainerError::Io)?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::CacheError;
    use tempfile::TempDir;

    fn container_path(dir: &TempDir) -> PathBuf {
        dir.path().join("00001.json")
    }

    #[test]
    fn test_append_create_then_read_roundtrip() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let backend = JsonContainerBackend::new();
        let path = container_path(&dir);

        let mut container = backend
            .open(&path, OpenMode::Append)
            .expect("append open should succeed");
        container
            .put("mean", &FieldValue::Scalar(1.25))
            .expect("put should succeed");
        container
            .put("amplitude", &FieldValue::Vector(vec![0.5, 0.75]))
            .expect("put should succeed");
        container.close().expect("close should succeed");

        let container = backend
            .open(&path, OpenMode::ReadOnly)
            .expect("read-only open should succeed");
        assert!(container.exists("mean"));
        assert_eq!(
            container.get("mean").expect("get should succeed"),
            Some(FieldValue::Scalar(1.25))
        );
        assert_eq!(container.get("missing").expect("get should succeed"), None);
        assert_eq!(
            container.keys(),
            vec!["amplitude".to_string(), "mean".to_string()]
        );
    }

    #[test]
    fn test_append_updates_existing_container() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let backend = JsonContainerBackend::new();
        let path = container_path(&dir);

        let mut container = backend.open(&path, OpenMode::Append).unwrap();
        container.put("mean", &FieldValue::Scalar(1.0)).unwrap();
        container.close().unwrap();

        let mut container = backend.open(&path, OpenMode::Append).unwrap();
        container.put("mean", &FieldValue::Scalar(2.0)).unwrap();
        container.put("count", &FieldValue::Scalar(7.0)).unwrap();
        container.close().unwrap();

        let container = backend.open(&path, OpenMode::ReadOnly).unwrap();
        assert_eq!(
            container.get("mean").unwrap(),
            Some(FieldValue::Scalar(2.0))
        );
        assert_eq!(container.keys().len(), 2);
    }

    #[test]
    fn test_append_close_creates_empty_container() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let backend = JsonContainerBackend::new();
        let path = container_path(&dir);

        let container = backend.open(&path, OpenMode::Append).unwrap();
        container.close().unwrap();

        assert!(path.exists());
        let container = backend.open(&path, OpenMode::ReadOnly).unwrap();
        assert!(container.keys().is_empty());
    }

    #[test]
    fn test_create_discards_existing_content() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let backend = JsonContainerBackend::new();
        let path = container_path(&dir);

        let mut container = backend.open(&path, OpenMode::Append).unwrap();
        container.put("mean", &FieldValue::Scalar(1.0)).unwrap();
        container.close().unwrap();

        let mut container = backend.open(&path, OpenMode::Create).unwrap();
        assert!(container.keys().is_empty());
        container.put("count", &FieldValue::Scalar(2.0)).unwrap();
        container.close().unwrap();

        let container = backend.open(&path, OpenMode::ReadOnly).unwrap();
        assert!(!container.exists("mean"));
        assert_eq!(
            container.get("count").unwrap(),
            Some(FieldValue::Scalar(2.0))
        );
    }

    #[test]
    fn test_read_only_open_requires_existing_file() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let backend = JsonContainerBackend::new();

        let result = backend.open(&container_path(&dir), OpenMode::ReadOnly);
        assert!(matches!(
            result,
            Err(CacheError::Container(ContainerError::Io(_)))
        ));
    }

    #[test]
    fn test_read_only_put_is_rejected() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let backend = JsonContainerBackend::new();
        let path = container_path(&dir);

        backend.open(&path, OpenMode::Append).unwrap().close().unwrap();

        let mut container = backend.open(&path, OpenMode::ReadOnly).unwrap();
        let result = container.put("mean", &FieldValue::Scalar(0.0));
        assert!(matches!(
            result,
            Err(CacheError::Container(ContainerError::Io(_)))
        ));
    }

    #[test]
    fn test_tampered_checksum_is_detected() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let backend = JsonContainerBackend::new();
        let path = container_path(&dir);

        let mut container = backend.open(&path, OpenMode::Append).unwrap();
        container.put("mean", &FieldValue::Scalar(1.0)).unwrap();
        container.close().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        parsed["checksum"] = serde_json::Value::String("0".repeat(64));
        std::fs::write(&path, serde_json::to_vec(&parsed).unwrap()).unwrap();

        let result = backend.open(&path, OpenMode::ReadOnly);
        assert!(matches!(
            result,
            Err(CacheError::Container(ContainerError::Corrupt { .. }))
        ));
    }

    #[test]
    fn test_garbage_file_is_a_deserialization_error() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let backend = JsonContainerBackend::new();
        let path = container_path(&dir);
        std::fs::write(&path, b"not json").unwrap();

        let result = backend.open(&path, OpenMode::ReadOnly);
        assert!(matches!(
            result,
            Err(CacheError::Container(ContainerError::Deserialization { .. }))
        ));
    }
}
