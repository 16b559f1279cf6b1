// ── Bulk CSV import / export ──
//
// Import is all-or-nothing: every row is validated and its references
// resolved before anything is written, and a failure while committing
// rolls back the rows already created.

pub mod export;
pub mod fields;
pub mod import;

pub use export::CsvExport;
pub use import::CsvImport;

use crate::access::Repository;
use crate::inventory::Inventory;
use crate::natural_key::NaturalKeyResolver;
use crate::store::DataStore;

/// CSV import and export over one store.
#[derive(Clone, Copy)]
pub struct BulkIo<'a> {
    store: &'a DataStore,
}

impl<'a> BulkIo<'a> {
    pub fn new(store: &'a DataStore) -> Self {
        Self { store }
    }

    fn repo(&self) -> Repository<'a> {
        Repository::new(self.store)
    }

    fn inventory(&self) -> Inventory<'a> {
        Inventory::new(self.store)
    }

    fn natural_keys(&self) -> NaturalKeyResolver<'a> {
        NaturalKeyResolver::new(self.store)
    }
}
