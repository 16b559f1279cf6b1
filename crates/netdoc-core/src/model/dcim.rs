// ── Data-center inventory types ──
//
// Sites, racks, devices and interfaces are the physical endpoints a
// circuit termination attaches to.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::common::{CustomFields, Timestamps};
use super::entity_id::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: EntityId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub tenant_id: Option<EntityId>,
    #[serde(default)]
    pub timestamps: Timestamps,
    #[serde(default)]
    pub custom_fields: CustomFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rack {
    pub id: EntityId,
    pub name: String,
    pub site_id: EntityId,
    #[serde(default)]
    pub tenant_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: EntityId,
    /// Unique when set; unnamed devices fall back to a derived display name.
    pub name: Option<String>,
    /// Device type label (e.g. "MX480").
    pub model: String,
    #[serde(default)]
    pub asset_tag: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    pub site_id: EntityId,
    #[serde(default)]
    pub rack_id: Option<EntityId>,
    #[serde(default)]
    pub tenant_id: Option<EntityId>,
    #[serde(default)]
    pub timestamps: Timestamps,
    #[serde(default)]
    pub custom_fields: CustomFields,
}

impl Device {
    /// Name shown to operators. Unnamed devices are labelled by model plus
    /// the first identifying attribute available.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_owned();
        }
        if let Some(tag) = self.asset_tag.as_deref().filter(|t| !t.is_empty()) {
            return format!("{} ({tag})", self.model);
        }
        if let Some(serial) = self.serial.as_deref().filter(|s| !s.is_empty()) {
            return format!("{} ({serial})", self.model);
        }
        format!("{} (#{})", self.model, self.id)
    }
}

/// Interface form factor class.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InterfaceKind {
    Physical,
    Virtual,
    Lag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub id: EntityId,
    pub device_id: EntityId,
    pub name: String,
    pub kind: InterfaceKind,
    #[serde(default)]
    pub mgmt_only: bool,
    /// Interface on the far end of a cable, if any.
    #[serde(default)]
    pub cabled_to: Option<EntityId>,
}

impl Interface {
    /// Physical, non-management interfaces are the only ones a circuit may terminate on.
    pub fn is_connectable(&self) -> bool {
        self.kind == InterfaceKind::Physical && !self.mgmt_only
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: Option<&str>, asset_tag: Option<&str>, serial: Option<&str>) -> Device {
        Device {
            id: EntityId::new(12),
            name: name.map(str::to_owned),
            model: "MX480".into(),
            asset_tag: asset_tag.map(str::to_owned),
            serial: serial.map(str::to_owned),
            site_id: EntityId::new(1),
            rack_id: None,
            tenant_id: None,
            timestamps: Timestamps::now(),
            custom_fields: CustomFields::new(),
        }
    }

    #[test]
    fn display_name_prefers_name() {
        assert_eq!(device(Some("edge-1"), Some("A100"), None).display_name(), "edge-1");
    }

    #[test]
    fn display_name_falls_back_to_asset_tag_then_serial_then_id() {
        assert_eq!(device(None, Some("A100"), Some("S9")).display_name(), "MX480 (A100)");
        assert_eq!(device(Some(""), None, Some("S9")).display_name(), "MX480 (S9)");
        assert_eq!(device(None, None, None).display_name(), "MX480 (#12)");
    }

    #[test]
    fn only_physical_non_mgmt_interfaces_are_connectable() {
        let mut iface = Interface {
            id: EntityId::new(3),
            device_id: EntityId::new(12),
            name: "xe-0/0/0".into(),
            kind: InterfaceKind::Physical,
            mgmt_only: false,
            cabled_to: None,
        };
        assert!(iface.is_connectable());

        iface.mgmt_only = true;
        assert!(!iface.is_connectable());

        iface.mgmt_only = false;
        iface.kind = InterfaceKind::Lag;
        assert!(!iface.is_connectable());
    }
}
