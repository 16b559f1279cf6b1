//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use netdoc_config::ConfigError;
use netdoc_core::{CoreError, EntityKind, FieldError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(netdoc::not_found),
        help("Run: netdoc {list_command} to see available records")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{resource_type} rejected: {reason}")]
    #[diagnostic(code(netdoc::conflict), help("Conflicting field: {field}"))]
    Conflict {
        resource_type: String,
        reason: String,
        field: String,
    },

    #[error("Cannot delete {resource_type} {identifier}: still referenced by {count} {referenced_by}(s)")]
    #[diagnostic(
        code(netdoc::protected),
        help("Delete or reassign the referencing {referenced_by} records first.")
    )]
    Protected {
        resource_type: String,
        identifier: String,
        referenced_by: String,
        count: usize,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netdoc::validation))]
    Validation { field: String, reason: String },

    #[error("Import rejected with {count} error(s); nothing was written")]
    #[diagnostic(code(netdoc::import), help("{details}"))]
    Import { count: usize, details: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(netdoc::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: netdoc config init --name {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(netdoc::config))]
    Config(#[from] ConfigError),

    #[error("Inventory file {path} is unusable: {message}")]
    #[diagnostic(
        code(netdoc::inventory),
        help("Restore the file from a backup, or point --inventory at another file.")
    )]
    Inventory { path: String, message: String },

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(netdoc::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(netdoc::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(netdoc::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } | Self::Protected { .. } => exit_code::CONFLICT,
            Self::Validation { .. }
            | Self::Import { .. }
            | Self::ProfileNotFound { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Config(ConfigError::UnknownProfile { .. } | ConfigError::UnknownTenant { .. }) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

/// The subcommand that lists records of `kind`.
pub fn list_command(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Tenant => "tenants list",
        EntityKind::Provider => "providers list",
        EntityKind::CircuitType => "circuit-types list",
        EntityKind::Circuit => "circuits list",
        EntityKind::CircuitTermination => "terminations list <circuit>",
        EntityKind::Site => "sites list",
        EntityKind::Rack => "racks list",
        EntityKind::Device => "devices list",
        EntityKind::Interface => "interfaces list --device <device>",
    }
}

fn import_details(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity, id } => CliError::NotFound {
                resource_type: entity.label().into(),
                identifier: id.to_string(),
                list_command: list_command(entity).into(),
            },

            CoreError::Conflict { entity, kind } => CliError::Conflict {
                resource_type: entity.label().into(),
                reason: kind.to_string(),
                field: kind.field().into(),
            },

            CoreError::ReferentialProtection {
                entity,
                id,
                referenced_by,
                count,
            } => CliError::Protected {
                resource_type: entity.label().into(),
                identifier: id.to_string(),
                referenced_by: referenced_by.label().into(),
                count,
            },

            CoreError::Validation { field, reason } => CliError::Validation { field, reason },

            CoreError::Field(FieldError {
                column, message, ..
            }) => CliError::Validation {
                field: column,
                reason: message,
            },

            CoreError::Import(report) => CliError::Import {
                count: report.errors.len(),
                details: import_details(&report.errors),
            },

            CoreError::Csv(e) => CliError::Validation {
                field: "csv".into(),
                reason: e.to_string(),
            },

            CoreError::Snapshot { message } => CliError::Inventory {
                path: "(inventory)".into(),
                message,
            },

            CoreError::Json(e) => CliError::Json(e),
            CoreError::Io(e) => CliError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netdoc_core::{ConflictKind, EntityId, ImportReport};

    #[test]
    fn core_errors_map_to_stable_exit_codes() {
        let not_found: CliError = CoreError::NotFound {
            entity: EntityKind::Circuit,
            id: EntityId::new(7),
        }
        .into();
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);

        let conflict: CliError = CoreError::Conflict {
            entity: EntityKind::CircuitTermination,
            kind: ConflictKind::DuplicateSide,
        }
        .into();
        assert_eq!(conflict.exit_code(), exit_code::CONFLICT);

        let import: CliError = CoreError::Import(ImportReport {
            errors: vec![FieldError::new("provider", "Provider not found.").at_row(2)],
        })
        .into();
        assert_eq!(import.exit_code(), exit_code::USAGE);
        assert!(matches!(
            import,
            CliError::Import { count: 1, ref details } if details == "row 2, provider: Provider not found."
        ));
    }
}
