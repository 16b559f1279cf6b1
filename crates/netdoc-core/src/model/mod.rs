// ── Unified domain model ──
//
// Canonical record types held by the DataStore. Audited entities embed
// `Timestamps` and `CustomFields` values rather than sharing a base type.

pub mod circuits;
pub mod common;
pub mod dcim;
pub mod entity_id;
pub mod tenancy;

// ── Re-exports ──────────────────────────────────────────────────────

pub use circuits::{Circuit, CircuitTermination, CircuitType, Provider, TermSide};
pub use common::{CustomFields, EntityKind, Timestamps};
pub use dcim::{Device, Interface, InterfaceKind, Rack, Site};
pub use entity_id::EntityId;
pub use tenancy::Tenant;
