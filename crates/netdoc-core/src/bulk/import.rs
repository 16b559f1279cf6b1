// ── CSV import ──

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{info, warn};

use super::{BulkIo, fields};
use crate::access::CallerContext;
use crate::error::{CoreError, FieldError, ImportReport, Result};
use crate::inventory::{
    ACCOUNT_MAX, CID_MAX, DESCRIPTION_MAX, Inventory, NAME_MAX, NewCircuit, NewProvider,
    SLUG_MAX, URL_MAX,
};
use crate::model::{Circuit, CircuitType, EntityId, Provider, Tenant};
use crate::natural_key::{NaturalKey, NaturalKeyResolver};
use crate::store::{DataStore, Record};

/// A record type that can be created from CSV rows.
pub trait CsvImport: Record {
    /// Every column the header may contain.
    const COLUMNS: &'static [&'static str];
    /// Columns the header must contain.
    const REQUIRED: &'static [&'static str];

    /// A validated row with its references resolved.
    type Row;

    fn parse_row(
        cells: &RowCells<'_>,
        ctx: &CallerContext,
        keys: &NaturalKeyResolver<'_>,
    ) -> std::result::Result<Self::Row, Vec<FieldError>>;

    fn create(inventory: &Inventory<'_>, ctx: &CallerContext, row: Self::Row) -> Result<Arc<Self>>;

    /// Undo a create during batch rollback.
    fn discard(store: &DataStore, id: EntityId);
}

// ── Header ───────────────────────────────────────────────────────────

/// Column positions of a validated header row.
#[derive(Debug)]
pub struct Header {
    positions: HashMap<String, usize>,
}

impl Header {
    fn parse<T: CsvImport>(raw: &StringRecord) -> std::result::Result<Self, Vec<FieldError>> {
        let mut positions = HashMap::new();
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for (index, column) in raw.iter().enumerate() {
            if !T::COLUMNS.contains(&column) {
                errors.push(FieldError::new(
                    column,
                    format!("Unexpected column header \"{column}\" found."),
                ));
            } else if !seen.insert(column) {
                errors.push(FieldError::new(
                    column,
                    format!("Duplicate or conflicting column header for \"{column}\"."),
                ));
            } else {
                positions.insert(column.to_owned(), index);
            }
        }
        for required in T::REQUIRED {
            if !seen.contains(required) {
                errors.push(FieldError::new(
                    *required,
                    format!("Required column \"{required}\" not found."),
                ));
            }
        }

        if errors.is_empty() {
            Ok(Self { positions })
        } else {
            Err(errors)
        }
    }
}

/// Cells of one data row, addressed by column name.
pub struct RowCells<'r> {
    header: &'r Header,
    record: &'r StringRecord,
}

impl RowCells<'_> {
    /// The cell under `column`; empty when the column is absent.
    pub fn get(&self, column: &str) -> &str {
        self.header
            .positions
            .get(column)
            .and_then(|&i| self.record.get(i))
            .unwrap_or("")
    }
}

/// Accumulates diagnostics while a row is parsed.
#[derive(Default)]
struct RowErrors(Vec<FieldError>);

impl RowErrors {
    fn keep<T: Default>(&mut self, result: std::result::Result<T, FieldError>) -> T {
        result.unwrap_or_else(|err| {
            self.0.push(err);
            T::default()
        })
    }

    /// A required reference column.
    fn reference<T: NaturalKey>(
        &mut self,
        keys: &NaturalKeyResolver<'_>,
        ctx: &CallerContext,
        value: &str,
    ) -> Option<Arc<T>> {
        if value.is_empty() {
            self.0.push(FieldError::new(T::COLUMN, fields::REQUIRED));
            return None;
        }
        self.keep(keys.resolve::<T>(ctx, value).map(Some))
    }

    /// An optional reference column.
    fn optional_reference<T: NaturalKey>(
        &mut self,
        keys: &NaturalKeyResolver<'_>,
        ctx: &CallerContext,
        value: &str,
    ) -> Option<Arc<T>> {
        if value.is_empty() {
            return None;
        }
        self.keep(keys.resolve::<T>(ctx, value).map(Some))
    }

    fn finish<R>(self, row: R) -> std::result::Result<R, Vec<FieldError>> {
        if self.0.is_empty() { Ok(row) } else { Err(self.0) }
    }
}

// ── Import ───────────────────────────────────────────────────────────

impl BulkIo<'_> {
    /// Import every row of `reader` or none of them.
    ///
    /// Header and row diagnostics are collected across the whole batch and
    /// returned together as [`CoreError::Import`]. Rows are numbered from 1,
    /// not counting the header.
    pub fn import<T: CsvImport>(
        &self,
        ctx: &CallerContext,
        reader: impl io::Read,
    ) -> Result<Vec<Arc<T>>> {
        let mut csv = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let header = Header::parse::<T>(csv.headers()?).map_err(|errors| {
            warn!(entity = %T::KIND, errors = errors.len(), "import header rejected");
            CoreError::Import(ImportReport { errors })
        })?;

        let keys = self.natural_keys();
        let mut rows = Vec::new();
        let mut errors = Vec::new();
        for (index, record) in csv.records().enumerate() {
            let number = index + 1;
            let record = record?;
            let cells = RowCells {
                header: &header,
                record: &record,
            };
            match T::parse_row(&cells, ctx, &keys) {
                Ok(row) => rows.push((number, row)),
                Err(row_errors) => {
                    errors.extend(row_errors.into_iter().map(|e| e.at_row(number)));
                }
            }
        }
        if !errors.is_empty() {
            warn!(entity = %T::KIND, errors = errors.len(), user = %ctx.username, "import rejected");
            return Err(CoreError::Import(ImportReport { errors }));
        }

        self.commit::<T>(ctx, rows)
    }

    fn commit<T: CsvImport>(
        &self,
        ctx: &CallerContext,
        rows: Vec<(usize, T::Row)>,
    ) -> Result<Vec<Arc<T>>> {
        let inventory = self.inventory();
        let mut created: Vec<Arc<T>> = Vec::with_capacity(rows.len());

        for (number, row) in rows {
            match T::create(&inventory, ctx, row) {
                Ok(record) => created.push(record),
                Err(err) => {
                    for record in created.iter().rev() {
                        T::discard(self.store, record.id());
                    }
                    warn!(
                        entity = %T::KIND,
                        row = number,
                        rolled_back = created.len(),
                        error = %err,
                        "import commit failed"
                    );
                    return Err(CoreError::Import(ImportReport {
                        errors: vec![row_error::<T>(err).at_row(number)],
                    }));
                }
            }
        }

        info!(entity = %T::KIND, count = created.len(), user = %ctx.username, "import committed");
        Ok(created)
    }
}

/// Attribute a commit-time failure to the column that caused it.
fn row_error<T: Record>(err: CoreError) -> FieldError {
    match err {
        CoreError::Conflict { entity, kind } => {
            let field = kind.field();
            FieldError::new(
                field,
                format!("{} with this {field} already exists.", capitalize(entity.label())),
            )
        }
        CoreError::Field(field_error) => field_error,
        CoreError::Validation { field, reason } => FieldError::new(field, reason),
        other => FieldError::new(T::KIND.to_string(), other.to_string()),
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

// ── Importable types ─────────────────────────────────────────────────

impl CsvImport for Provider {
    const COLUMNS: &'static [&'static str] =
        &["name", "slug", "asn", "account", "portal_url", "comments"];
    const REQUIRED: &'static [&'static str] = &["name", "slug"];

    type Row = NewProvider;

    fn parse_row(
        cells: &RowCells<'_>,
        _ctx: &CallerContext,
        _keys: &NaturalKeyResolver<'_>,
    ) -> std::result::Result<NewProvider, Vec<FieldError>> {
        let mut errors = RowErrors::default();
        let row = NewProvider {
            name: errors.keep(fields::text("name", cells.get("name"), NAME_MAX, true)),
            slug: errors.keep(fields::slug("slug", cells.get("slug"), SLUG_MAX)),
            asn: errors.keep(fields::asn("asn", cells.get("asn"))),
            account: errors.keep(fields::text("account", cells.get("account"), ACCOUNT_MAX, false)),
            portal_url: errors.keep(fields::url("portal_url", cells.get("portal_url"), URL_MAX)),
            comments: cells.get("comments").to_owned(),
            ..NewProvider::default()
        };
        errors.finish(row)
    }

    fn create(inventory: &Inventory<'_>, ctx: &CallerContext, row: NewProvider) -> Result<Arc<Self>> {
        inventory.create_provider(ctx, row)
    }

    fn discard(store: &DataStore, id: EntityId) {
        store.remove::<Self>(id);
    }
}

impl CsvImport for Circuit {
    const COLUMNS: &'static [&'static str] = &[
        "cid",
        "provider",
        "type",
        "tenant",
        "install_date",
        "commit_rate",
        "description",
        "comments",
    ];
    const REQUIRED: &'static [&'static str] = &["cid", "provider", "type"];

    type Row = NewCircuit;

    fn parse_row(
        cells: &RowCells<'_>,
        ctx: &CallerContext,
        keys: &NaturalKeyResolver<'_>,
    ) -> std::result::Result<NewCircuit, Vec<FieldError>> {
        let mut errors = RowErrors::default();
        let cid = errors.keep(fields::text("cid", cells.get("cid"), CID_MAX, true));
        let provider = errors.reference::<Provider>(keys, ctx, cells.get("provider"));
        let circuit_type = errors.reference::<CircuitType>(keys, ctx, cells.get("type"));
        let tenant = errors.optional_reference::<Tenant>(keys, ctx, cells.get("tenant"));
        let install_date = errors.keep(fields::date("install_date", cells.get("install_date")));
        let commit_rate = errors.keep(fields::kbps("commit_rate", cells.get("commit_rate")));
        let description = errors.keep(fields::text(
            "description",
            cells.get("description"),
            DESCRIPTION_MAX,
            false,
        ));

        match (provider, circuit_type) {
            (Some(provider), Some(circuit_type)) => errors.finish(NewCircuit {
                cid,
                provider: provider.id,
                circuit_type: circuit_type.id,
                tenant: tenant.map(|t| t.id),
                install_date,
                commit_rate,
                description,
                comments: cells.get("comments").to_owned(),
            }),
            _ => Err(errors.0),
        }
    }

    fn create(inventory: &Inventory<'_>, ctx: &CallerContext, row: NewCircuit) -> Result<Arc<Self>> {
        inventory.create_circuit(ctx, row)
    }

    fn discard(store: &DataStore, id: EntityId) {
        store.remove::<Self>(id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use pretty_assertions::assert_eq;

    fn report(err: CoreError) -> Vec<FieldError> {
        match err {
            CoreError::Import(report) => report.errors,
            other => panic!("expected an import report, got {other}"),
        }
    }

    #[test]
    fn imports_providers() {
        let fx = Fixture::new();
        let csv = "name,slug,asn,portal_url\n\
                   Cogent,cogent,174,https://portal.cogentco.com/\n\
                   Lumen,lumen,,\n";
        let created = fx.bulk().import::<Provider>(&fx.admin(), csv.as_bytes()).unwrap();
        let names: Vec<_> = created.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Cogent", "Lumen"]);
        assert_eq!(created[0].asn, Some(174));
        assert!(fx.store.provider_by_name("Lumen").is_some());
    }

    #[test]
    fn unknown_provider_rejects_the_whole_batch() {
        let fx = Fixture::new();
        let before = fx.store.all::<Circuit>().len();
        let csv = "cid,provider,type\n\
                   N1,Zayo,Metro\n\
                   N2,Nonexistent,Metro\n";
        let errors = report(
            fx.bulk()
                .import::<Circuit>(&fx.admin(), csv.as_bytes())
                .unwrap_err(),
        );
        assert_eq!(
            errors,
            [FieldError::new("provider", "Provider not found.").at_row(2)]
        );
        assert_eq!(fx.store.all::<Circuit>().len(), before);
        assert!(fx.store.circuit_by_cid(fx.zayo, "N1").is_none());
    }

    #[test]
    fn every_row_error_is_reported() {
        let fx = Fixture::new();
        let csv = "cid,provider,type,tenant,install_date,commit_rate\n\
                   ,Zayo,Metro,,,\n\
                   N2,Zayo,Dark Fiber,Initech,2016-13-01,fast\n";
        let errors = report(
            fx.bulk()
                .import::<Circuit>(&fx.admin(), csv.as_bytes())
                .unwrap_err(),
        );
        assert_eq!(
            errors,
            [
                FieldError::new("cid", fields::REQUIRED).at_row(1),
                FieldError::new("type", "Invalid circuit type.").at_row(2),
                FieldError::new("tenant", "Tenant not found.").at_row(2),
                FieldError::new("install_date", fields::INVALID_DATE).at_row(2),
                FieldError::new("commit_rate", fields::INVALID_NUMBER).at_row(2),
            ]
        );
    }

    #[test]
    fn header_must_use_known_columns_once_and_carry_required_ones() {
        let fx = Fixture::new();
        let errors = report(
            fx.bulk()
                .import::<Provider>(&fx.admin(), "name,name,color\nx,y,z\n".as_bytes())
                .unwrap_err(),
        );
        let columns: Vec<_> = errors.iter().map(|e| e.column.as_str()).collect();
        assert_eq!(columns, ["name", "color", "slug"]);
        assert!(errors.iter().all(|e| e.row.is_none()));
    }

    #[test]
    fn duplicate_within_batch_rolls_back_earlier_rows() {
        let fx = Fixture::new();
        let csv = "cid,provider,type\n\
                   N1,Zayo,Metro\n\
                   N2,Zayo,Metro\n\
                   N1,Zayo,Long Haul\n";
        let errors = report(
            fx.bulk()
                .import::<Circuit>(&fx.admin(), csv.as_bytes())
                .unwrap_err(),
        );
        assert_eq!(
            errors,
            [FieldError::new("cid", "Circuit with this cid already exists.").at_row(3)]
        );
        assert!(fx.store.circuit_by_cid(fx.zayo, "N1").is_none());
        assert!(fx.store.circuit_by_cid(fx.zayo, "N2").is_none());
    }

    #[test]
    fn hidden_provider_is_not_found_for_scoped_caller() {
        let fx = Fixture::new();
        let csv = "cid,provider,type\nN1,Globex Carrier,Metro\n";
        let errors = report(
            fx.bulk()
                .import::<Circuit>(&fx.acme(), csv.as_bytes())
                .unwrap_err(),
        );
        assert_eq!(errors[0].message, "Provider not found.");
        assert!(fx.bulk().import::<Circuit>(&fx.globex(), csv.as_bytes()).is_ok());
    }

    #[test]
    fn capitalize_handles_multi_word_labels() {
        assert_eq!(capitalize("circuit type"), "Circuit type");
        assert_eq!(capitalize(""), "");
    }
}
