// ── Access-filtered repository ──
//
// Every read in the crate goes through `Repository`, which narrows the
// store to what a caller context may see. The scoping rule for a type is
// a pure `Predicate` built from the context; transitive predicates are
// evaluated in two stages (visible parent ids first, then the children).

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::model::{
    Circuit, CircuitTermination, CircuitType, Device, EntityId, EntityKind, Interface, Provider,
    Rack, Site, Tenant,
};
use crate::store::{DataStore, Record};

// ── Caller context ───────────────────────────────────────────────────

/// Identity and tenant scope a request runs under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    pub username: String,
    #[serde(default)]
    pub tenants: BTreeSet<EntityId>,
    #[serde(default)]
    pub superuser: bool,
}

impl CallerContext {
    /// A caller that sees everything.
    pub fn superuser(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            tenants: BTreeSet::new(),
            superuser: true,
        }
    }

    /// A caller limited to shared records and those of `tenants`.
    pub fn scoped(username: impl Into<String>, tenants: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            username: username.into(),
            tenants: tenants.into_iter().collect(),
            superuser: false,
        }
    }
}

// ── Predicates ───────────────────────────────────────────────────────

/// Visibility rule for one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// No restriction.
    All,
    /// Records whose scope column is unset or one of these tenants.
    Tenants(BTreeSet<EntityId>),
    /// Records whose parent is visible under `parent_predicate`.
    Via {
        parent: EntityKind,
        parent_predicate: Box<Predicate>,
    },
}

/// Build the visibility predicate of `kind` for `ctx`.
pub fn predicate_for(ctx: &CallerContext, kind: EntityKind) -> Predicate {
    if ctx.superuser {
        return Predicate::All;
    }
    match kind {
        EntityKind::CircuitType => Predicate::All,
        EntityKind::CircuitTermination => Predicate::Via {
            parent: EntityKind::Circuit,
            parent_predicate: Box::new(predicate_for(ctx, EntityKind::Circuit)),
        },
        EntityKind::Interface => Predicate::Via {
            parent: EntityKind::Device,
            parent_predicate: Box::new(predicate_for(ctx, EntityKind::Device)),
        },
        EntityKind::Tenant
        | EntityKind::Provider
        | EntityKind::Circuit
        | EntityKind::Site
        | EntityKind::Rack
        | EntityKind::Device => Predicate::Tenants(ctx.tenants.clone()),
    }
}

/// A predicate with its parent stage already evaluated.
enum Compiled<'p> {
    All,
    Tenants(&'p BTreeSet<EntityId>),
    Parents(HashSet<EntityId>),
}

impl Compiled<'_> {
    fn admits<T: Record>(&self, record: &T) -> bool {
        match self {
            Self::All => true,
            Self::Tenants(allowed) => record.tenant_id().is_none_or(|t| allowed.contains(&t)),
            Self::Parents(ids) => record.parent_id().is_some_and(|p| ids.contains(&p)),
        }
    }
}

// ── Repository ───────────────────────────────────────────────────────

/// Read access to the store, filtered by caller context.
#[derive(Clone, Copy)]
pub struct Repository<'a> {
    store: &'a DataStore,
}

impl<'a> Repository<'a> {
    pub fn new(store: &'a DataStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &'a DataStore {
        self.store
    }

    /// Visible records of `T` passing `extra`, in natural order.
    pub fn list<T: Record>(
        &self,
        ctx: &CallerContext,
        extra: Option<&dyn Fn(&T) -> bool>,
    ) -> Vec<Arc<T>> {
        let predicate = predicate_for(ctx, T::KIND);
        let compiled = self.compile(&predicate);

        let mut keyed: Vec<_> = T::collection(self.store)
            .snapshot()
            .iter()
            .filter(|r| {
                let record: &T = r;
                compiled.admits(record) && extra.is_none_or(|f| f(record))
            })
            .map(|r| (r.sort_key(self.store), Arc::clone(r)))
            .collect();
        keyed.sort_by(|(ka, a), (kb, b)| ka.cmp(kb).then_with(|| a.id().cmp(&b.id())));

        debug!(
            entity = %T::KIND,
            user = %ctx.username,
            count = keyed.len(),
            "listed visible records"
        );
        keyed.into_iter().map(|(_, r)| r).collect()
    }

    /// Shorthand for [`list`](Self::list) with a filter.
    pub fn list_where<T: Record>(
        &self,
        ctx: &CallerContext,
        filter: impl Fn(&T) -> bool,
    ) -> Vec<Arc<T>> {
        self.list(ctx, Some(&filter))
    }

    /// A visible record by id, or `None` when missing or hidden.
    pub fn find<T: Record>(&self, ctx: &CallerContext, id: EntityId) -> Option<Arc<T>> {
        let record = self.store.get::<T>(id)?;
        let predicate = predicate_for(ctx, T::KIND);
        self.admits(&predicate, &*record).then_some(record)
    }

    /// A visible record by id. Hidden records are reported as not found.
    pub fn get<T: Record>(&self, ctx: &CallerContext, id: EntityId) -> Result<Arc<T>> {
        self.find(ctx, id)
            .ok_or_else(|| CoreError::not_found(T::KIND, id))
    }

    pub fn is_visible<T: Record>(&self, ctx: &CallerContext, record: &T) -> bool {
        self.admits(&predicate_for(ctx, T::KIND), record)
    }

    // ── Evaluation ───────────────────────────────────────────────────

    /// Check one record, following `Via` through its ancestors.
    fn admits<T: Record>(&self, predicate: &Predicate, record: &T) -> bool {
        match predicate {
            Predicate::All => true,
            Predicate::Tenants(allowed) => {
                record.tenant_id().is_none_or(|t| allowed.contains(&t))
            }
            Predicate::Via {
                parent,
                parent_predicate,
            } => record
                .parent_id()
                .is_some_and(|p| self.id_admitted(*parent, parent_predicate, p)),
        }
    }

    fn id_admitted(&self, kind: EntityKind, predicate: &Predicate, id: EntityId) -> bool {
        match kind {
            EntityKind::Tenant => self.record_admitted::<Tenant>(predicate, id),
            EntityKind::Provider => self.record_admitted::<Provider>(predicate, id),
            EntityKind::CircuitType => self.record_admitted::<CircuitType>(predicate, id),
            EntityKind::Circuit => self.record_admitted::<Circuit>(predicate, id),
            EntityKind::CircuitTermination => {
                self.record_admitted::<CircuitTermination>(predicate, id)
            }
            EntityKind::Site => self.record_admitted::<Site>(predicate, id),
            EntityKind::Rack => self.record_admitted::<Rack>(predicate, id),
            EntityKind::Device => self.record_admitted::<Device>(predicate, id),
            EntityKind::Interface => self.record_admitted::<Interface>(predicate, id),
        }
    }

    fn record_admitted<T: Record>(&self, predicate: &Predicate, id: EntityId) -> bool {
        self.store
            .get::<T>(id)
            .is_some_and(|r| self.admits(predicate, &*r))
    }

    /// Evaluate the parent stage of a predicate once for a whole listing.
    fn compile<'p>(&self, predicate: &'p Predicate) -> Compiled<'p> {
        match predicate {
            Predicate::All => Compiled::All,
            Predicate::Tenants(allowed) => Compiled::Tenants(allowed),
            Predicate::Via {
                parent,
                parent_predicate,
            } => Compiled::Parents(self.visible_ids(*parent, parent_predicate)),
        }
    }

    fn visible_ids(&self, kind: EntityKind, predicate: &Predicate) -> HashSet<EntityId> {
        match kind {
            EntityKind::Tenant => self.ids_admitted::<Tenant>(predicate),
            EntityKind::Provider => self.ids_admitted::<Provider>(predicate),
            EntityKind::CircuitType => self.ids_admitted::<CircuitType>(predicate),
            EntityKind::Circuit => self.ids_admitted::<Circuit>(predicate),
            EntityKind::CircuitTermination => self.ids_admitted::<CircuitTermination>(predicate),
            EntityKind::Site => self.ids_admitted::<Site>(predicate),
            EntityKind::Rack => self.ids_admitted::<Rack>(predicate),
            EntityKind::Device => self.ids_admitted::<Device>(predicate),
            EntityKind::Interface => self.ids_admitted::<Interface>(predicate),
        }
    }

    fn ids_admitted<T: Record>(&self, predicate: &Predicate) -> HashSet<EntityId> {
        let compiled = self.compile(predicate);
        T::collection(self.store)
            .snapshot()
            .iter()
            .filter(|r| compiled.admits::<T>(r))
            .map(|r| r.id())
            .collect()
    }
}
