//! STRATA Core - Data Types
//!
//! Pure data structures and the error taxonomy for the STRATA cluster cache.
//! All other crates depend on this. This crate contains ONLY data types and
//! value-level operations - no storage logic.

pub mod change;
pub mod error;
pub mod types;
pub mod value;

pub use change::{ChangeKind, ClusteringChange};
pub use error::{
    CacheError, CacheResult, ContainerError, RegistryError, ShapeError, StoreError,
};
pub use types::{ClusterId, FieldMap, FieldName, Location, MemberIndex};
pub use value::{FieldValue, Matrix};
