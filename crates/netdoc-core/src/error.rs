// ── Core error types ──
//
// Every integrity violation is surfaced to the immediate caller. Nothing
// here is retried or downgraded to a warning.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{EntityId, EntityKind};

/// Which uniqueness rule a rejected write violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictKind {
    /// The circuit already has a termination on the requested side.
    DuplicateSide,
    /// The interface is already held by another circuit termination.
    InterfaceInUse,
    /// Another record already owns this unique column value.
    DuplicateKey { field: &'static str },
}

impl ConflictKind {
    /// The input field the conflict is attributed to.
    pub fn field(self) -> &'static str {
        match self {
            Self::DuplicateSide => "term_side",
            Self::InterfaceInUse => "interface",
            Self::DuplicateKey { field } => field,
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateSide => {
                write!(f, "a termination already exists for this circuit and side")
            }
            Self::InterfaceInUse => {
                write!(f, "interface is already linked to another circuit termination")
            }
            Self::DuplicateKey { field } => write!(f, "{field} is already in use"),
        }
    }
}

/// A field-attributed diagnostic. Import diagnostics carry the 1-based data
/// row they came from; header diagnostics carry none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub row: Option<usize>,
    pub column: String,
    pub message: String,
}

impl FieldError {
    pub fn new(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row: None,
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn at_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "row {row}, {}: {}", self.column, self.message),
            None => write!(f, "{}: {}", self.column, self.message),
        }
    }
}

impl std::error::Error for FieldError {}

/// Every diagnostic from a rejected import batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub errors: Vec<FieldError>,
}

impl ImportReport {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s)", self.errors.len())?;
        for err in &self.errors {
            write!(f, "; {err}")?;
        }
        Ok(())
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lookup ───────────────────────────────────────────────────────
    /// Missing, or not visible to the caller. Both are reported identically.
    #[error("{} {id} not found", .entity.label())]
    NotFound { entity: EntityKind, id: EntityId },

    // ── Integrity ────────────────────────────────────────────────────
    #[error("{} conflict: {kind}", .entity.label())]
    Conflict {
        entity: EntityKind,
        kind: ConflictKind,
    },

    #[error(
        "cannot delete {} {id}: referenced by {count} {}(s)",
        .entity.label(),
        .referenced_by.label()
    )]
    ReferentialProtection {
        entity: EntityKind,
        id: EntityId,
        referenced_by: EntityKind,
        count: usize,
    },

    // ── Input ────────────────────────────────────────────────────────
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("import rejected: {0}")]
    Import(ImportReport),

    // ── Files ────────────────────────────────────────────────────────
    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("snapshot error: {message}")]
    Snapshot { message: String },

    #[error("snapshot decoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub(crate) fn not_found(entity: EntityKind, id: EntityId) -> Self {
        Self::NotFound { entity, id }
    }

    pub(crate) fn conflict(entity: EntityKind, kind: ConflictKind) -> Self {
        Self::Conflict { entity, kind }
    }

    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// The conflict kind, if this is a uniqueness violation.
    pub fn conflict_kind(&self) -> Option<ConflictKind> {
        match self {
            Self::Conflict { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_error_display_includes_row_when_known() {
        let err = FieldError::new("provider", "Provider not found.").at_row(3);
        assert_eq!(err.to_string(), "row 3, provider: Provider not found.");
        assert_eq!(
            FieldError::new("cid", "This field is required.").to_string(),
            "cid: This field is required."
        );
    }

    #[test]
    fn conflict_message_names_entity_and_rule() {
        let err = CoreError::conflict(EntityKind::CircuitTermination, ConflictKind::InterfaceInUse);
        assert_eq!(
            err.to_string(),
            "circuit termination conflict: interface is already linked to another circuit termination"
        );
        assert_eq!(err.conflict_kind(), Some(ConflictKind::InterfaceInUse));
    }

    #[test]
    fn protection_message_counts_references() {
        let err = CoreError::ReferentialProtection {
            entity: EntityKind::Provider,
            id: EntityId::new(4),
            referenced_by: EntityKind::Circuit,
            count: 2,
        };
        assert_eq!(err.to_string(), "cannot delete provider 4: referenced by 2 circuit(s)");
    }

    #[test]
    fn import_report_lists_every_error() {
        let report = ImportReport {
            errors: vec![
                FieldError::new("provider", "Provider not found.").at_row(1),
                FieldError::new("type", "Invalid circuit type.").at_row(2),
            ],
        };
        assert_eq!(
            report.to_string(),
            "2 error(s); row 1, provider: Provider not found.; row 2, type: Invalid circuit type."
        );
    }
}
