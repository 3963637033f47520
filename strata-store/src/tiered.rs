//! Dispatching store over the two tiers.
//!
//! A [`TieredStore`] owns one [`MemoryStore`], zero-or-one [`DiskStore`],
//! and the routing table mapping each field name to its tier. A field keeps
//! its first-registered location for the lifetime of the store.
//!
//! Whenever a disk tier is configured, both tiers must list the same
//! cluster ids at all times. A mismatch is a fatal consistency fault
//! ([`StoreError::Inconsistency`]) and is never silently repaired.

use std::collections::BTreeMap;
use std::path::PathBuf;

use strata_core::{
    CacheResult, ClusterId, FieldMap, FieldName, FieldValue, Location, StoreError,
};

use crate::disk::DiskStore;
use crate::memory::MemoryStore;

/// Configuration for a tiered store.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Root directory of the disk tier; `None` keeps the store memory-only.
    pub disk_root: Option<PathBuf>,
}

impl StoreConfig {
    /// Create a memory-only configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the disk tier under the given root directory.
    pub fn with_disk_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.disk_root = Some(root.into());
        self
    }
}

/// Routes named fields to the memory or disk tier behind one API.
pub struct TieredStore {
    memory: MemoryStore,
    disk: Option<DiskStore>,
    routing: BTreeMap<FieldName, Location>,
}

impl TieredStore {
    /// Open a store from configuration, creating the disk tier when a root
    /// is configured.
    pub fn open(config: StoreConfig) -> CacheResult<Self> {
        let disk = match config.disk_root {
            Some(root) => Some(DiskStore::new(root)?),
            None => None,
        };
        Ok(Self {
            memory: MemoryStore::new(),
            disk,
            routing: BTreeMap::new(),
        })
    }

    /// Memory-only store.
    pub fn in_memory() -> Self {
        Self {
            memory: MemoryStore::new(),
            disk: None,
            routing: BTreeMap::new(),
        }
    }

    /// Store backed by a caller-constructed disk tier (e.g. with a custom
    /// container backend).
    pub fn with_disk_tier(disk: DiskStore) -> Self {
        Self {
            memory: MemoryStore::new(),
            disk: Some(disk),
            routing: BTreeMap::new(),
        }
    }

    pub fn has_disk_tier(&self) -> bool {
        self.disk.is_some()
    }

    /// The tier a field is routed to, if registered.
    pub fn location_of(&self, name: &str) -> Option<Location> {
        self.routing.get(name).copied()
    }

    /// Read-only view of the routing table.
    pub fn routed_fields(&self) -> &BTreeMap<FieldName, Location> {
        &self.routing
    }

    /// Route a field to a tier.
    ///
    /// Registering the same name to the same location again is a no-op.
    /// Re-routing to a different location fails with
    /// [`StoreError::LocationConflict`], and routing to disk without a disk
    /// tier fails with [`StoreError::DiskTierMissing`].
    pub fn register_field(
        &mut self,
        name: impl Into<FieldName>,
        location: Location,
    ) -> CacheResult<()> {
        let name = name.into();
        if location == Location::Disk && self.disk.is_none() {
            return Err(StoreError::DiskTierMissing { field: name }.into());
        }
        if let Some(&existing) = self.routing.get(&name) {
            if existing != location {
                return Err(StoreError::LocationConflict {
                    field: name,
                    existing,
                    requested: location,
                }
                .into());
            }
            return Ok(());
        }
        self.routing.insert(name, location);
        Ok(())
    }

    /// Store fields for a cluster, splitting them by routed tier.
    ///
    /// When `location` is given, every incoming field name is first
    /// registered to it (bulk-registration convenience). Without it, every
    /// name must already be registered; an unrouted name is a hard
    /// [`StoreError::UnregisteredField`] error and nothing is stored.
    ///
    /// Both tiers record the cluster even when their field subset is empty,
    /// which is what keeps the tier id sets identical.
    pub fn store(
        &mut self,
        cluster: ClusterId,
        location: Option<Location>,
        fields: FieldMap,
    ) -> CacheResult<()> {
        if let Some(location) = location {
            for name in fields.keys() {
                self.register_field(name.clone(), location)?;
            }
        }
        let mut memory_fields = FieldMap::new();
        let mut disk_fields = FieldMap::new();
        for (name, value) in fields {
            match self.routing.get(&name).copied() {
                Some(Location::Memory) => {
                    memory_fields.insert(name, value);
                }
                Some(Location::Disk) => {
                    disk_fields.insert(name, value);
                }
                None => return Err(StoreError::UnregisteredField { field: name }.into()),
            }
        }
        self.memory.store(cluster, memory_fields);
        if let Some(disk) = &mut self.disk {
            disk.store(cluster, &disk_fields)?;
        }
        Ok(())
    }

    /// Load one field, delegating to the tier it is routed to.
    pub fn load_field(&self, cluster: ClusterId, name: &str) -> CacheResult<Option<FieldValue>> {
        match self.routing.get(name).copied() {
            None => Err(StoreError::UnregisteredField {
                field: name.to_string(),
            }
            .into()),
            Some(Location::Memory) => Ok(self.memory.load_field(cluster, name)),
            Some(Location::Disk) => match &self.disk {
                Some(disk) => disk.load_field(cluster, name),
                None => Err(StoreError::DiskTierMissing {
                    field: name.to_string(),
                }
                .into()),
            },
        }
    }

    /// Load the requested fields from both tiers, each `None` when missing.
    ///
    /// Every requested name must be registered. Disk values win on key
    /// collision; with exclusive routing a collision cannot occur, the
    /// ordering is just the documented tie-break.
    pub fn load_fields(
        &self,
        cluster: ClusterId,
        names: &[FieldName],
    ) -> CacheResult<BTreeMap<FieldName, Option<FieldValue>>> {
        for name in names {
            if !self.routing.contains_key(name) {
                return Err(StoreError::UnregisteredField { field: name.clone() }.into());
            }
        }
        let mut out = self
            .memory
            .load_fields(cluster, &self.filter(names, Location::Memory));
        if let Some(disk) = &self.disk {
            out.extend(disk.load_fields(cluster, &self.filter(names, Location::Disk))?);
        }
        Ok(out)
    }

    /// Load everything stored for a cluster, merged across tiers.
    pub fn load_all(&self, cluster: ClusterId) -> CacheResult<FieldMap> {
        let mut out = self.memory.load_all(cluster);
        if let Some(disk) = &self.disk {
            out.extend(disk.load_all(cluster)?);
        }
        Ok(out)
    }

    /// The cluster ids present in the store.
    ///
    /// With a disk tier configured, both tiers must agree; a differing id
    /// set fails with [`StoreError::Inconsistency`].
    pub fn cluster_ids(&self) -> CacheResult<Vec<ClusterId>> {
        let memory = self.memory.cluster_ids();
        let Some(disk) = &self.disk else {
            return Ok(memory);
        };
        let disk_ids = disk.cluster_ids()?;
        if memory != disk_ids {
            return Err(StoreError::Inconsistency {
                memory,
                disk: disk_ids,
            }
            .into());
        }
        Ok(memory)
    }

    /// Delete the given clusters from both tiers.
    pub fn delete(&mut self, clusters: &[ClusterId]) -> CacheResult<()> {
        self.memory.delete(clusters);
        if let Some(disk) = &mut self.disk {
            disk.delete(clusters)?;
        }
        Ok(())
    }

    /// Remove all stored data from both tiers. Field routing is kept.
    pub fn clear(&mut self) -> CacheResult<()> {
        self.memory.clear();
        if let Some(disk) = &mut self.disk {
            disk.clear()?;
        }
        Ok(())
    }

    fn filter(&self, names: &[FieldName], location: Location) -> Vec<FieldName> {
        names
            .iter()
            .filter(|name| self.routing.get(*name) == Some(&location))
            .cloned()
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
