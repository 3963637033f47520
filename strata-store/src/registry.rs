//! Cluster cache registry.
//!
//! A [`ClusterCache`] ties together the upstream model, a [`TieredStore`],
//! the membership map, and the registered field providers. Providers declare
//! their fields once at registration; afterwards the cache answers per-field
//! accessor lookups, member-aligned bulk loads, and clustering-change
//! events.
//!
//! Accessors are an explicit name table resolved through
//! [`ClusterCache::field`] rather than per-field methods, so registration
//! stays a pure data operation.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use strata_core::{
    CacheResult, ChangeKind, ClusterId, ClusteringChange, FieldName, FieldValue, MemberIndex,
    RegistryError, StoreError,
};

use crate::provider::{DataModel, FieldProvider};
use crate::tiered::TieredStore;

/// Two-tier cache of per-cluster computed attributes, kept coherent across
/// clustering changes by its registered providers.
pub struct ClusterCache<M> {
    model: M,
    store: TieredStore,
    members: BTreeMap<ClusterId, Vec<MemberIndex>>,
    providers: Vec<Box<dyn FieldProvider<M>>>,
    accessors: BTreeSet<FieldName>,
}

impl<M: DataModel> ClusterCache<M> {
    pub fn new(model: M, store: TieredStore) -> Self {
        Self {
            model,
            store,
            members: BTreeMap::new(),
            providers: Vec::new(),
            accessors: BTreeSet::new(),
        }
    }

    /// The upstream model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The underlying tiered store.
    pub fn store(&self) -> &TieredStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TieredStore {
        &mut self.store
    }

    /// Membership of every known cluster.
    pub fn members(&self) -> &BTreeMap<ClusterId, Vec<MemberIndex>> {
        &self.members
    }

    /// Register a provider and the accessors for every field it declares.
    ///
    /// Fails with [`RegistryError::EmptyProvider`] when the provider
    /// declares no fields and [`RegistryError::DuplicateAccessor`] when a
    /// declared name is already taken, including by another provider.
    pub fn register_provider(&mut self, provider: Box<dyn FieldProvider<M>>) -> CacheResult<()> {
        let fields = provider.fields();
        if fields.is_empty() {
            return Err(RegistryError::EmptyProvider {
                provider: provider.name().to_string(),
            }
            .into());
        }
        for (name, location) in fields {
            if self.accessors.contains(&name) {
                return Err(RegistryError::DuplicateAccessor { field: name }.into());
            }
            self.store.register_field(name.clone(), location)?;
            self.accessors.insert(name);
        }
        self.providers.push(provider);
        Ok(())
    }

    /// Accessor lookup: the cached value of one provider field for one
    /// cluster. Fails when no provider registered `name`.
    pub fn field(&self, name: &str, cluster: ClusterId) -> CacheResult<Option<FieldValue>> {
        if !self.accessors.contains(name) {
            return Err(StoreError::UnregisteredField {
                field: name.to_string(),
            }
            .into());
        }
        self.store.load_field(cluster, name)
    }

    /// Member-aligned bulk load.
    ///
    /// Concatenates `field` across the requested clusters in ascending id
    /// order, lines the rows up against the concatenated membership of those
    /// clusters, and returns the rows for `members` in the order given.
    pub fn load(
        &self,
        field: &str,
        clusters: &[ClusterId],
        members: &[MemberIndex],
    ) -> CacheResult<FieldValue> {
        let mut ids: Vec<ClusterId> = clusters.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut values = Vec::with_capacity(ids.len());
        let mut membership: Vec<MemberIndex> = Vec::new();
        for &cluster in &ids {
            let cluster_members = self
                .members
                .get(&cluster)
                .ok_or(RegistryError::ClusterNotFound { cluster })?;
            let value = self.store.load_field(cluster, field)?.ok_or_else(|| {
                RegistryError::FieldNotComputed {
                    field: field.to_string(),
                    cluster,
                }
            })?;
            values.push(value);
            membership.extend_from_slice(cluster_members);
        }

        let stacked = FieldValue::concat(&values)?;

        // Position of each member in the concatenated membership; first
        // occurrence wins.
        let mut position_of: HashMap<MemberIndex, usize> = HashMap::with_capacity(membership.len());
        for (position, &member) in membership.iter().enumerate() {
            position_of.entry(member).or_insert(position);
        }
        let mut rows = Vec::with_capacity(members.len());
        for &member in members {
            let position = position_of
                .get(&member)
                .copied()
                .ok_or(RegistryError::MemberNotFound { member })?;
            rows.push(position);
        }

        Ok(stacked.take_rows(&rows)?)
    }

    /// Apply a clustering change.
    ///
    /// Deleted clusters are removed from the store first so stale data never
    /// resurfaces, the membership map is updated, and then every provider
    /// sees the change in registration order. A failing provider aborts the
    /// remaining sequence.
    pub fn update(&mut self, change: &ClusteringChange) -> CacheResult<()> {
        change.validate()?;
        tracing::debug!(
            kind = %change.kind,
            deleted = change.deleted.len(),
            added = change.added.len(),
            "Applying clustering change"
        );

        let deleted: Vec<ClusterId> = change.deleted.iter().copied().collect();
        self.store.delete(&deleted)?;
        for cluster in &deleted {
            self.members.remove(cluster);
        }
        for &cluster in &change.added {
            if let Some(new_members) = change.new_members.get(&cluster) {
                self.members.insert(cluster, new_members.clone());
            }
        }

        match change.kind {
            ChangeKind::Merge => self.merge(change),
            ChangeKind::Assign => self.assign(change),
        }
    }

    /// Forward a merge to every provider in registration order.
    pub fn merge(&mut self, change: &ClusteringChange) -> CacheResult<()> {
        for provider in &mut self.providers {
            provider.merge(&self.model, &mut self.store, change)?;
        }
        Ok(())
    }

    /// Forward a reassignment to every provider in registration order.
    pub fn assign(&mut self, change: &ClusteringChange) -> CacheResult<()> {
        for provider in &mut self.providers {
            provider.assign(&self.model, &mut self.store, change)?;
        }
        Ok(())
    }

    /// Full rebuild: replace the membership map wholesale and recompute
    /// every provider field for every cluster from raw model data.
    ///
    /// Every call recomputes, even where cached values already exist; this
    /// is a rebuild, not an incremental refresh.
    pub fn generate(
        &mut self,
        members_by_cluster: BTreeMap<ClusterId, Vec<MemberIndex>>,
    ) -> CacheResult<()> {
        self.members = members_by_cluster;
        let clusters: Vec<ClusterId> = self.members.keys().copied().collect();
        tracing::info!(
            model = %self.model.name(),
            clusters = clusters.len(),
            providers = self.providers.len(),
            "Generating the cluster cache"
        );
        for provider in &mut self.providers {
            for &cluster in &clusters {
                tracing::debug!(provider = %provider.name(), cluster, "Computing fields");
                let members = self
                    .members
                    .get(&cluster)
                    .map(|m| m.as_slice())
                    .unwrap_or(&[]);
                provider.compute_and_store(&self.model, &mut self.store, cluster, members)?;
            }
        }
        tracing::info!(model = %self.model.name(), "Cluster cache generation complete");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
