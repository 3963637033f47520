//! Identity types and field routing locations.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::value::FieldValue;

/// Identifier of one cluster. Unique across both tiers at any instant.
pub type ClusterId = u32;

/// Index of one raw observation in the upstream model.
pub type MemberIndex = u64;

/// Name of a cached per-cluster attribute.
pub type FieldName = String;

/// A set of named field values for one cluster.
///
/// `BTreeMap` keeps iteration and serialization order deterministic, which
/// the persistent tier relies on for checksum stability.
pub type FieldMap = BTreeMap<FieldName, FieldValue>;

/// The tier a field is routed to.
///
/// A field name is assigned a location once (first registration) and keeps it
/// for the lifetime of the store. Re-registering the same name to a different
/// location is rejected with [`StoreError::LocationConflict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    /// In-process volatile tier.
    Memory,
    /// Durable on-disk tier.
    Disk,
}

impl Location {
    /// Canonical lowercase name, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Memory => "memory",
            Location::Disk => "disk",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(Location::Memory),
            "disk" => Ok(Location::Disk),
            other => Err(StoreError::InvalidLocation {
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parse_roundtrip() {
        assert_eq!("memory".parse::<Location>().unwrap(), Location::Memory);
        assert_eq!("disk".parse::<Location>().unwrap(), Location::Disk);
        assert_eq!(Location::Memory.to_string(), "memory");
        assert_eq!(Location::Disk.to_string(), "disk");
    }

    #[test]
    fn test_location_parse_rejects_unknown() {
        let err = "tape".parse::<Location>().unwrap_err();
        assert!(matches!(err, StoreError::InvalidLocation { value } if value == "tape"));
    }
}
