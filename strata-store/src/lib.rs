//! STRATA Store - Two-Tier Cluster Cache
//!
//! Storage layer for per-cluster computed attributes. A [`TieredStore`]
//! routes named fields to an in-process memory tier or a durable disk tier,
//! and a [`ClusterCache`] on top of it registers pluggable field providers
//! and keeps cached values coherent across clustering changes.
//!
//! Everything here is synchronous and single-threaded by design: every
//! store/load/delete call blocks until the underlying tier operation
//! completes, and container handles never outlive a single call. Callers
//! that share a store across threads must serialize their own access.

pub mod container;
pub mod disk;
pub mod memory;
pub mod provider;
pub mod registry;
pub mod tiered;

pub use container::{ContainerBackend, FieldContainer, JsonContainerBackend, OpenMode};
pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use provider::{DataModel, FieldProvider};
pub use registry::ClusterCache;
pub use tiered::{StoreConfig, TieredStore};

// Re-export core types for downstream convenience
pub use strata_core::{
    CacheError, CacheResult, ChangeKind, ClusterId, ClusteringChange, ContainerError, FieldMap,
    FieldName, FieldValue, Location, Matrix, MemberIndex, RegistryError, ShapeError, StoreError,
};
