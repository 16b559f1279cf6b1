// ── Entity store ──
//
// Concurrent per-type collections plus the uniqueness indexes that make
// the store the sole arbiter of every integrity rule.

mod collection;
mod data_store;
mod gate;
mod index;
mod record;

pub use collection::EntityCollection;
pub use data_store::DataStore;
pub use record::Record;

pub(crate) use record::Keyed;
