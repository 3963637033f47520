//! Field providers and the upstream model contract.
//!
//! A provider owns a set of named fields, knows how to compute them from raw
//! model data for one cluster, and reacts to clustering-change events. The
//! cache never interprets provider output beyond routing it to a tier.

use strata_core::{
    CacheResult, ClusterId, ClusteringChange, FieldName, Location, MemberIndex, RegistryError,
};

use crate::tiered::TieredStore;

/// Upstream data model supplying raw per-member observations.
///
/// The cache treats the model as opaque; the only thing it ever asks for is
/// a diagnostic label. Providers are parameterized on the concrete model
/// type and pull whatever raw data they need from it.
pub trait DataModel {
    /// Label used in diagnostics during cache generation.
    fn name(&self) -> &str {
        "unnamed recording"
    }
}

/// A pluggable producer of per-cluster field values.
///
/// `fields` and `compute_and_store` are the required surface;
/// `assign`/`merge` have default implementations that recompute every added
/// cluster from raw data. Override `merge` only as a performance
/// specialization that produces identical observable results.
pub trait FieldProvider<M: DataModel> {
    /// Provider label used in diagnostics.
    fn name(&self) -> &str;

    /// The fields this provider owns and the tier each is routed to. Must
    /// be non-empty.
    fn fields(&self) -> Vec<(FieldName, Location)>;

    /// Compute this provider's fields for one cluster from raw model data
    /// and store them. Default: no-op.
    fn compute_and_store(
        &mut self,
        model: &M,
        store: &mut TieredStore,
        cluster: ClusterId,
        members: &[MemberIndex],
    ) -> CacheResult<()> {
        let _ = (model, store, cluster, members);
        Ok(())
    }

    /// React to a reassignment: recompute every added cluster. Deleted
    /// clusters are not touched here; the registry already removed them.
    fn assign(
        &mut self,
        model: &M,
        store: &mut TieredStore,
        change: &ClusteringChange,
    ) -> CacheResult<()> {
        for &cluster in &change.added {
            let members = change
                .new_members
                .get(&cluster)
                .ok_or(RegistryError::MissingNewMembers { cluster })?;
            self.compute_and_store(model, store, cluster, members)?;
        }
        Ok(())
    }

    /// React to a merge. Defaults to [`FieldProvider::assign`].
    fn merge(
        &mut self,
        model: &M,
        store: &mut TieredStore,
        change: &ClusteringChange,
    ) -> CacheResult<()> {
        self.assign(model, store, change)
    }
}

// =============================================================================
// TESTS
// =============================================================================
