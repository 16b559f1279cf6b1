// ── Registry facade ──
//
// Owns the shared store and vends the per-concern services that operate
// on it. Services borrow the store, so they are cheap to create per call.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::access::Repository;
use crate::bulk::BulkIo;
use crate::chain::ChainResolver;
use crate::error::Result;
use crate::inventory::Inventory;
use crate::natural_key::NaturalKeyResolver;
use crate::snapshot::Snapshot;
use crate::store::DataStore;
use crate::termination::TerminationEngine;

/// Entry point for embedding the inventory.
///
/// Cheaply cloneable; clones share one store, so concurrent writers from
/// different threads are arbitrated by the store's unique indexes.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    store: Arc<DataStore>,
}

impl Registry {
    /// An empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an inventory from a snapshot, re-checking every integrity rule.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        Ok(Self {
            store: Arc::new(snapshot.restore()?),
        })
    }

    /// Load the snapshot file at `path`. A missing file yields an empty inventory.
    pub fn open(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "opening inventory");
        Self::from_snapshot(Snapshot::load(path)?)
    }

    /// Write the current contents to `path`.
    pub fn persist(&self, path: &Path) -> Result<()> {
        self.snapshot().save(path)
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.store
    }

    pub fn repository(&self) -> Repository<'_> {
        Repository::new(&self.store)
    }

    pub fn inventory(&self) -> Inventory<'_> {
        Inventory::new(&self.store)
    }

    pub fn terminations(&self) -> TerminationEngine<'_> {
        TerminationEngine::new(&self.store)
    }

    pub fn chain(&self) -> ChainResolver<'_> {
        ChainResolver::new(&self.store)
    }

    pub fn natural_keys(&self) -> NaturalKeyResolver<'_> {
        NaturalKeyResolver::new(&self.store)
    }

    pub fn bulk(&self) -> BulkIo<'_> {
        BulkIo::new(&self.store)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.store)
    }

    /// Changes whenever any record is written or removed.
    pub fn revision(&self) -> u64 {
        self.store.revision()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::access::CallerContext;
    use crate::inventory::NewTenant;

    #[test]
    fn clones_share_one_store() {
        let registry = Registry::new();
        let other = registry.clone();
        let before = registry.revision();

        other
            .inventory()
            .create_tenant(
                &CallerContext::superuser("admin"),
                NewTenant {
                    name: "Acme".into(),
                    slug: "acme".into(),
                    description: String::new(),
                },
            )
            .unwrap();

        assert_ne!(registry.revision(), before);
        assert!(registry.store().tenant_by_name("Acme").is_some());
    }

    #[test]
    fn persist_then_open_restores_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.json");
        let registry = Registry::open(&path).unwrap();
        assert!(registry.snapshot().is_empty());

        registry
            .inventory()
            .create_tenant(
                &CallerContext::superuser("admin"),
                NewTenant {
                    name: "Globex".into(),
                    slug: "globex".into(),
                    description: String::new(),
                },
            )
            .unwrap();
        registry.persist(&path).unwrap();

        let reopened = Registry::open(&path).unwrap();
        assert_eq!(reopened.snapshot(), registry.snapshot());
    }
}
