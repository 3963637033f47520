//! Error types for STRATA operations.
//!
//! Missing clusters or fields on a load are NOT errors; they resolve to
//! `None` / empty maps at the tier level. Only structural misuse (bad
//! location, unrouted field, inconsistent tiers, bad change shape) and
//! backend I/O failures surface here. Nothing is retried or suppressed
//! internally.

use thiserror::Error;

use crate::types::{ClusterId, Location, MemberIndex};

/// Dispatching-store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid location '{value}': expected 'memory' or 'disk'")]
    InvalidLocation { value: String },

    #[error("Field '{field}' has no routing entry")]
    UnregisteredField { field: String },

    #[error("Field '{field}' is already routed to {existing}, cannot re-route to {requested}")]
    LocationConflict {
        field: String,
        existing: Location,
        requested: Location,
    },

    #[error("Field '{field}' is routed to disk but no disk tier is configured")]
    DiskTierMissing { field: String },

    #[error("Tier inconsistency: memory tier has clusters {memory:?}, disk tier has {disk:?}")]
    Inconsistency {
        memory: Vec<ClusterId>,
        disk: Vec<ClusterId>,
    },
}

/// Registry and clustering-change errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Accessor '{field}' is already registered")]
    DuplicateAccessor { field: String },

    #[error("Unsupported clustering change '{description}': expected 'merge' or 'assign'")]
    UnsupportedChange { description: String },

    #[error("Member {member} not found in the membership of the requested clusters")]
    MemberNotFound { member: MemberIndex },

    #[error("Cluster {cluster} is not known to the cache")]
    ClusterNotFound { cluster: ClusterId },

    #[error("Added cluster {cluster} has no membership entry in the change")]
    MissingNewMembers { cluster: ClusterId },

    #[error("Field '{field}' has no cached value for cluster {cluster}")]
    FieldNotComputed { field: String, cluster: ClusterId },

    #[error("Provider '{provider}' declares no fields")]
    EmptyProvider { provider: String },
}

/// Value-shape errors raised when concatenating or slicing field values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("Value of kind {kind} has no member rows")]
    NotRowAligned { kind: &'static str },

    #[error("Column mismatch: expected {expected}, got {got}")]
    ColumnMismatch { expected: usize, got: usize },

    #[error("Cannot combine value of kind {got} with {expected}")]
    VariantMismatch {
        expected: &'static str,
        got: &'static str,
    },

    #[error("Row index {index} out of bounds for {rows} rows")]
    RowOutOfBounds { index: usize, rows: usize },

    #[error("Data length {len} does not match {rows}x{cols}")]
    DataLength {
        len: usize,
        rows: usize,
        cols: usize,
    },
}

/// Persistent-container backend errors.
///
/// Backend I/O is single-shot and synchronous; failures propagate unchanged
/// to the caller with no partial-write recovery.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {reason}")]
    Serialization { reason: String },

    #[error("Deserialization failed: {reason}")]
    Deserialization { reason: String },

    #[error("Container {path} is corrupt: {reason}")]
    Corrupt { path: String, reason: String },
}

/// Master error type for all STRATA operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("Container error: {0}")]
    Container(#[from] ContainerError),
}

/// Result type alias for STRATA operations.
pub type CacheResult<T> = Result<T, CacheError>;

// =============================================================================
// TESTS
// =============================================================================
