// ── Circuit domain types ──

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::common::{CustomFields, Timestamps};
use super::entity_id::EntityId;
use crate::error::CoreError;

/// A counterparty organization (usually a carrier) that circuits are bought from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: EntityId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub asn: Option<u32>,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub portal_url: String,
    #[serde(default)]
    pub noc_contact: String,
    #[serde(default)]
    pub admin_contact: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tenant_id: Option<EntityId>,
    #[serde(default)]
    pub timestamps: Timestamps,
    #[serde(default)]
    pub custom_fields: CustomFields,
}

/// Functional classification of circuits ("Long Haul", "Metro", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitType {
    pub id: EntityId,
    pub name: String,
    pub slug: String,
}

/// A communications circuit, identified by `cid` within its provider.
/// Rates are in Kbps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub id: EntityId,
    pub cid: String,
    pub provider_id: EntityId,
    pub type_id: EntityId,
    #[serde(default)]
    pub tenant_id: Option<EntityId>,
    #[serde(default)]
    pub install_date: Option<NaiveDate>,
    #[serde(default)]
    pub commit_rate: Option<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub timestamps: Timestamps,
    #[serde(default)]
    pub custom_fields: CustomFields,
}

/// One end of a circuit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
pub enum TermSide {
    A,
    Z,
}

impl TermSide {
    pub const fn opposite(self) -> Self {
        match self {
            Self::A => Self::Z,
            Self::Z => Self::A,
        }
    }

    /// Parse a side value, failing with a field-attributed validation error.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        raw.parse().map_err(|_| CoreError::Validation {
            field: "term_side".into(),
            reason: format!("expected 'A' or 'Z', got '{raw}'"),
        })
    }
}

/// The physical landing of one side of a circuit. Speeds are in Kbps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitTermination {
    pub id: EntityId,
    pub circuit_id: EntityId,
    pub side: TermSide,
    pub site_id: EntityId,
    #[serde(default)]
    pub interface_id: Option<EntityId>,
    pub port_speed: u32,
    #[serde(default)]
    pub upstream_speed: Option<u32>,
    #[serde(default)]
    pub xconnect_id: String,
    #[serde(default)]
    pub pp_info: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        assert_eq!(TermSide::A.opposite(), TermSide::Z);
        assert_eq!(TermSide::Z.opposite(), TermSide::A);
        for side in [TermSide::A, TermSide::Z] {
            assert_eq!(side.opposite().opposite(), side);
        }
    }

    #[test]
    fn parse_accepts_only_a_and_z() {
        assert_eq!(TermSide::parse("A").ok(), Some(TermSide::A));
        assert_eq!(TermSide::parse("Z").ok(), Some(TermSide::Z));
        assert!(matches!(
            TermSide::parse("B"),
            Err(CoreError::Validation { ref field, .. }) if field == "term_side"
        ));
        assert!(TermSide::parse("").is_err());
    }
}
