//! Integrity core of the netdoc network documentation inventory.
//!
//! This crate owns the domain model, the concurrent entity store and the
//! rules that keep circuit terminations consistent:
//!
//! - **[`Registry`]**: Facade holding the shared [`DataStore`] and vending
//!   the per-concern services below. Clones share one store.
//!
//! - **[`DataStore`]**: Per-type `EntityCollection<T>` storage (`DashMap` +
//!   `tokio::sync::watch` snapshots) plus unique indexes. Every unique key
//!   is claimed with a single entry operation, so two concurrent writers
//!   can never both win the same circuit side or interface.
//!
//! - **[`TerminationEngine`]**: Creates, updates and deletes the A/Z ends
//!   of a circuit and answers peer lookups.
//!
//! - **[`Repository`]**: Access-filtered reads. A [`CallerContext`] is
//!   turned into a per-type [`Predicate`](access::Predicate); hidden
//!   records are indistinguishable from missing ones.
//!
//! - **[`ChainResolver`]**: Options for the site → rack → device →
//!   interface selection chain, driven by the static [`CHAIN`] table.
//!
//! - **[`NaturalKeyResolver`]** and **[`BulkIo`]**: Name-based references
//!   and all-or-nothing CSV import, plus CSV export.
//!
//! - **[`Snapshot`]**: JSON persistence of the whole store.

pub mod access;
pub mod bulk;
pub mod chain;
pub mod error;
pub mod inventory;
pub mod model;
pub mod natural_key;
pub mod registry;
pub mod snapshot;
pub mod store;
pub mod termination;
pub mod util;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use access::{CallerContext, Repository};
pub use bulk::{BulkIo, CsvExport, CsvImport};
pub use chain::{CHAIN, ChainField, ChainLink, ChainResolver, SelectOption, Selections};
pub use error::{ConflictKind, CoreError, FieldError, ImportReport};
pub use inventory::{
    Inventory, NewCircuit, NewCircuitType, NewDevice, NewInterface, NewProvider, NewRack,
    NewSite, NewTenant,
};
pub use natural_key::{EntityRef, NaturalKey, NaturalKeyResolver};
pub use registry::Registry;
pub use snapshot::Snapshot;
pub use store::{DataStore, Record};
pub use termination::{TerminationEngine, TerminationRequest};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Circuit, CircuitTermination, CircuitType, CustomFields, Device, EntityId, EntityKind,
    Interface, InterfaceKind, Provider, Rack, Site, TermSide, Tenant, Timestamps,
};
