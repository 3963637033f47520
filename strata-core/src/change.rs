//! Clustering-change events.
//!
//! A [`ClusteringChange`] describes one step of the clustering pipeline:
//! clusters that disappeared, clusters that appeared, and the membership of
//! the new ones. The registry consumes these events to keep cached values
//! valid without a full recompute.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::types::{ClusterId, MemberIndex};

/// Why the clustering changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Several clusters were merged into one.
    Merge,
    /// Members were reassigned across clusters (including splits).
    Assign,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Merge => "merge",
            ChangeKind::Assign => "assign",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merge" => Ok(ChangeKind::Merge),
            "assign" => Ok(ChangeKind::Assign),
            other => Err(RegistryError::UnsupportedChange {
                description: other.to_string(),
            }),
        }
    }
}

/// One clustering-change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusteringChange {
    /// Why the clustering changed.
    pub kind: ChangeKind,
    /// Cluster ids that are no longer valid.
    pub deleted: BTreeSet<ClusterId>,
    /// Cluster ids that are newly valid.
    pub added: BTreeSet<ClusterId>,
    /// Membership of each added cluster.
    pub new_members: BTreeMap<ClusterId, Vec<MemberIndex>>,
}

impl ClusteringChange {
    pub fn merge(
        deleted: BTreeSet<ClusterId>,
        added: BTreeSet<ClusterId>,
        new_members: BTreeMap<ClusterId, Vec<MemberIndex>>,
    ) -> Self {
        Self {
            kind: ChangeKind::Merge,
            deleted,
            added,
            new_members,
        }
    }

    pub fn assign(
        deleted: BTreeSet<ClusterId>,
        added: BTreeSet<ClusterId>,
        new_members: BTreeMap<ClusterId, Vec<MemberIndex>>,
    ) -> Self {
        Self {
            kind: ChangeKind::Assign,
            deleted,
            added,
            new_members,
        }
    }

    /// Check that every added cluster carries a membership entry.
    pub fn validate(&self) -> Result<(), RegistryError> {
        for &cluster in &self.added {
            if !self.new_members.contains_key(&cluster) {
                return Err(RegistryError::MissingNewMembers { cluster });
            }
        }
        Ok(())
    }
}
