// ── Natural-key resolution ──
//
// Bulk import rows reference providers, circuit types and tenants by
// name. Names are matched exactly against the store's unique name index;
// a record the caller cannot see is reported the same way as a missing one.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::access::{CallerContext, Repository};
use crate::error::FieldError;
use crate::model::{CircuitType, EntityId, EntityKind, Provider, Tenant};
use crate::store::{DataStore, Record};

/// A record type that import rows may reference by name.
pub trait NaturalKey: Record {
    /// Import column the reference appears in.
    const COLUMN: &'static str;
    /// Diagnostic for an unresolvable reference.
    const NOT_FOUND: &'static str;

    fn natural_key(&self) -> &str;

    fn by_natural_key(store: &DataStore, value: &str) -> Option<Arc<Self>>;
}

impl NaturalKey for Provider {
    const COLUMN: &'static str = "provider";
    const NOT_FOUND: &'static str = "Provider not found.";

    fn natural_key(&self) -> &str {
        &self.name
    }

    fn by_natural_key(store: &DataStore, value: &str) -> Option<Arc<Self>> {
        store.provider_by_name(value)
    }
}

impl NaturalKey for CircuitType {
    const COLUMN: &'static str = "type";
    const NOT_FOUND: &'static str = "Invalid circuit type.";

    fn natural_key(&self) -> &str {
        &self.name
    }

    fn by_natural_key(store: &DataStore, value: &str) -> Option<Arc<Self>> {
        store.circuit_type_by_name(value)
    }
}

impl NaturalKey for Tenant {
    const COLUMN: &'static str = "tenant";
    const NOT_FOUND: &'static str = "Tenant not found.";

    fn natural_key(&self) -> &str {
        &self.name
    }

    fn by_natural_key(store: &DataStore, value: &str) -> Option<Arc<Self>> {
        store.tenant_by_name(value)
    }
}

/// A resolved reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: EntityId,
    pub label: String,
}

#[derive(Clone, Copy)]
pub struct NaturalKeyResolver<'a> {
    repo: Repository<'a>,
}

impl<'a> NaturalKeyResolver<'a> {
    pub fn new(store: &'a DataStore) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    /// Resolve `value` to a visible `T`, or the column's not-found diagnostic.
    pub fn resolve<T: NaturalKey>(
        &self,
        ctx: &CallerContext,
        value: &str,
    ) -> Result<Arc<T>, FieldError> {
        let found = T::by_natural_key(self.repo.store(), value)
            .filter(|record| self.repo.is_visible::<T>(ctx, record));
        if found.is_none() {
            debug!(entity = %T::KIND, value, user = %ctx.username, "natural key unresolved");
        }
        found.ok_or_else(|| FieldError::new(T::COLUMN, T::NOT_FOUND))
    }

    /// Resolve a reference whose type is only known at runtime.
    pub fn resolve_by_kind(
        &self,
        ctx: &CallerContext,
        kind: EntityKind,
        value: &str,
    ) -> Result<EntityRef, FieldError> {
        match kind {
            EntityKind::Provider => self.entity_ref::<Provider>(ctx, value),
            EntityKind::CircuitType => self.entity_ref::<CircuitType>(ctx, value),
            EntityKind::Tenant => self.entity_ref::<Tenant>(ctx, value),
            other => Err(FieldError::new(
                other.to_string(),
                format!("A {} cannot be referenced by name.", other.label()),
            )),
        }
    }

    fn entity_ref<T: NaturalKey>(
        &self,
        ctx: &CallerContext,
        value: &str,
    ) -> Result<EntityRef, FieldError> {
        self.resolve::<T>(ctx, value).map(|record| EntityRef {
            kind: T::KIND,
            id: record.id(),
            label: record.natural_key().to_owned(),
        })
    }
}
