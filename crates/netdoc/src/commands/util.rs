//! Shared helpers for command handlers.

use std::fs::File;
use std::io::{self, IsTerminal, Read, Write};
use std::path::Path;

use netdoc_core::{CoreError, DataStore, EntityId, Record, Tenant};

use crate::config::Session;
use crate::error::CliError;

/// Label of a referenced record, or "" when unset.
pub fn label_of<T: Record>(store: &DataStore, id: Option<EntityId>) -> String {
    id.and_then(|id| store.get::<T>(id))
        .map(|r| r.label())
        .unwrap_or_default()
}

/// Resolve an optional tenant given by name.
pub fn tenant_ref(session: &Session, name: Option<&str>) -> Result<Option<EntityId>, CliError> {
    name.map(|name| {
        session
            .registry
            .natural_keys()
            .resolve::<Tenant>(&session.ctx, name)
            .map(|t| t.id)
            .map_err(|e| CliError::from(CoreError::from(e)))
    })
    .transpose()
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(io::Error::other(e)))?;
    Ok(confirmed)
}

/// CSV input from a file, or stdin for `-`.
pub fn open_input(path: &Path) -> Result<Box<dyn Read>, CliError> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    Ok(Box::new(File::open(path)?))
}

/// CSV output to a file, or stdout.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, CliError> {
    match path {
        Some(path) => Ok(Box::new(File::create(path)?)),
        None => Ok(Box::new(io::stdout().lock())),
    }
}
