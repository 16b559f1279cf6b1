// ── Core identity type ──
//
// Every stored record carries an EntityId allocated by the DataStore.
// Ids are unique across all entity types within one store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

// ── EntityId ────────────────────────────────────────────────────────

/// Canonical identifier for any stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

impl From<u64> for EntityId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_display() {
        assert_eq!(EntityId::new(42).to_string(), "42");
    }

    #[test]
    fn entity_id_from_str_trims_whitespace() {
        let id: EntityId = " 17 ".parse().unwrap();
        assert_eq!(id.get(), 17);
    }

    #[test]
    fn entity_id_rejects_non_numeric() {
        assert!("rack-1".parse::<EntityId>().is_err());
        assert!("-3".parse::<EntityId>().is_err());
    }

    #[test]
    fn entity_id_serializes_as_bare_number() {
        let json = serde_json::to_string(&EntityId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EntityId::new(7));
    }
}
