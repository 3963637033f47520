//! Volatile in-process tier.

use std::collections::BTreeMap;

use strata_core::{ClusterId, FieldMap, FieldName, FieldValue};

/// Stores per-cluster field values in process memory. No persistence.
///
/// Missing clusters are never an error here: loads resolve to empty maps or
/// `None` and deletes of absent ids are no-ops.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<ClusterId, FieldMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `fields` into the cluster's record, creating the record if
    /// absent. An empty map still creates the record, which is what keeps
    /// both tiers listing the same clusters after a routed store.
    pub fn store(&mut self, cluster: ClusterId, fields: FieldMap) {
        let record = self.records.entry(cluster).or_default();
        record.extend(fields);
    }

    /// Full record for a cluster, or an empty map if absent.
    pub fn load_all(&self, cluster: ClusterId) -> FieldMap {
        self.records.get(&cluster).cloned().unwrap_or_default()
    }

    /// One field's value, or `None` if the record or field is absent.
    pub fn load_field(&self, cluster: ClusterId, name: &str) -> Option<FieldValue> {
        self.records.get(&cluster).and_then(|r| r.get(name).cloned())
    }

    /// The requested fields, each `None` when missing.
    pub fn load_fields(
        &self,
        cluster: ClusterId,
        names: &[FieldName],
    ) -> BTreeMap<FieldName, Option<FieldValue>> {
        names
            .iter()
            .map(|name| (name.clone(), self.load_field(cluster, name)))
            .collect()
    }

    /// Sorted list of known cluster ids.
    pub fn cluster_ids(&self) -> Vec<ClusterId> {
        self.records.keys().copied().collect()
    }

    /// Remove the records for the given ids; absent ids are no-ops.
    pub fn delete(&mut self, clusters: &[ClusterId]) {
        for cluster in clusters {
            self.records.remove(cluster);
        }
    }

    /// Remove all records.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
