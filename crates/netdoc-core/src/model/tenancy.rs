// ── Tenancy domain type ──

use serde::{Deserialize, Serialize};

use super::common::{CustomFields, Timestamps};
use super::entity_id::EntityId;

/// An organization that owns records. Tenants are the visibility scope
/// that caller contexts are built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: EntityId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timestamps: Timestamps,
    #[serde(default)]
    pub custom_fields: CustomFields,
}
