// ── CSV export ──

use std::io;

use csv::WriterBuilder;
use tracing::info;

use super::BulkIo;
use crate::access::CallerContext;
use crate::error::Result;
use crate::model::{Circuit, CircuitType, EntityId, Provider, Tenant};
use crate::store::{DataStore, Record};

/// A record type that renders as one CSV row.
pub trait CsvExport: Record {
    const HEADERS: &'static [&'static str];

    /// Cells in `HEADERS` order. Unset optionals render as "".
    fn csv_row(&self, store: &DataStore) -> Vec<String>;
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn name_of<T: Record>(store: &DataStore, id: EntityId) -> String {
    store.get::<T>(id).map(|r| r.label()).unwrap_or_default()
}

impl CsvExport for Provider {
    const HEADERS: &'static [&'static str] = &["name", "slug", "asn", "account", "portal_url"];

    fn csv_row(&self, _store: &DataStore) -> Vec<String> {
        vec![
            self.name.clone(),
            self.slug.clone(),
            optional(self.asn),
            self.account.clone(),
            self.portal_url.clone(),
        ]
    }
}

impl CsvExport for Circuit {
    const HEADERS: &'static [&'static str] = &[
        "cid",
        "provider",
        "type",
        "tenant",
        "install_date",
        "commit_rate",
        "description",
    ];

    fn csv_row(&self, store: &DataStore) -> Vec<String> {
        vec![
            self.cid.clone(),
            name_of::<Provider>(store, self.provider_id),
            name_of::<CircuitType>(store, self.type_id),
            self.tenant_id
                .map(|t| name_of::<Tenant>(store, t))
                .unwrap_or_default(),
            optional(self.install_date.map(|d| d.format("%Y-%m-%d"))),
            optional(self.commit_rate),
            self.description.clone(),
        ]
    }
}

impl BulkIo<'_> {
    /// Write every visible `T` as CSV, in natural order. Returns the row count.
    pub fn export<T: CsvExport>(&self, ctx: &CallerContext, writer: impl io::Write) -> Result<usize> {
        let records = self.repo().list::<T>(ctx, None);
        let mut csv = WriterBuilder::new().from_writer(writer);

        csv.write_record(T::HEADERS)?;
        for record in &records {
            csv.write_record(record.csv_row(self.store))?;
        }
        csv.flush()?;

        info!(entity = %T::KIND, count = records.len(), user = %ctx.username, "exported");
        Ok(records.len())
    }
}
