// ── Common types shared across the domain model ──

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Every stored entity type. Used in errors, access rules and natural-key lookups.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Tenant,
    Provider,
    CircuitType,
    Circuit,
    CircuitTermination,
    Site,
    Rack,
    Device,
    Interface,
}

impl EntityKind {
    /// Human-readable label used in diagnostics ("circuit type", not "circuit_type").
    pub fn label(self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::Provider => "provider",
            Self::CircuitType => "circuit type",
            Self::Circuit => "circuit",
            Self::CircuitTermination => "circuit termination",
            Self::Site => "site",
            Self::Rack => "rack",
            Self::Device => "device",
            Self::Interface => "interface",
        }
    }
}

/// Created / last-updated bookkeeping embedded in audited entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub created: NaiveDate,
    pub last_updated: DateTime<Utc>,
}

impl Timestamps {
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            created: now.date_naive(),
            last_updated: now,
        }
    }

    /// Bump `last_updated`, keeping the creation date.
    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

impl Default for Timestamps {
    fn default() -> Self {
        Self::now()
    }
}

/// Operator-defined attributes attached to an entity. Insertion order is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomFields(IndexMap<String, serde_json::Value>);

impl CustomFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Set a value, returning the previous one if the key existed.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.0.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entity_kind_round_trips_through_snake_case() {
        assert_eq!(EntityKind::CircuitType.to_string(), "circuit_type");
        assert_eq!(
            "circuit_termination".parse::<EntityKind>().unwrap(),
            EntityKind::CircuitTermination
        );
        assert_eq!(EntityKind::CircuitType.label(), "circuit type");
    }

    #[test]
    fn custom_fields_keep_insertion_order() {
        let mut cf = CustomFields::new();
        cf.set("zeta", json!(1));
        cf.set("alpha", json!("x"));
        let keys: Vec<_> = cf.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["zeta", "alpha"]);

        assert_eq!(cf.set("zeta", json!(2)), Some(json!(1)));
        assert_eq!(cf.remove("zeta"), Some(json!(2)));
        assert_eq!(cf.len(), 1);
    }

    #[test]
    fn touch_keeps_creation_date() {
        let mut ts = Timestamps::now();
        let created = ts.created;
        let before = ts.last_updated;
        ts.touch();
        assert_eq!(ts.created, created);
        assert!(ts.last_updated >= before);
    }
}
