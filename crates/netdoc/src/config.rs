//! CLI configuration: thin wrapper around `netdoc_config` shared types.
//!
//! Adds `GlobalOpts`-aware resolution (--config, --profile, --inventory)
//! and the `Session` every inventory command runs in.

use std::path::{Path, PathBuf};

use tracing::debug;

use netdoc_core::{CallerContext, CoreError, Registry};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use netdoc_config::{Config, ConfigError, Profile};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Config file selected by `--config`, else the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(netdoc_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(netdoc_config::load_config_from(&config_file(global))?)
}

pub fn save(global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    Ok(netdoc_config::save_config_to(cfg, &config_file(global))?)
}

/// Resolve the active profile from CLI flags and config.
pub fn resolve_profile(global: &GlobalOpts, cfg: &Config) -> Result<(String, Profile), CliError> {
    let name = cfg.active_profile_name(global.profile.as_deref());
    match cfg.profile(&name) {
        Ok(profile) => Ok((name, profile)),
        Err(ConfigError::UnknownProfile { name }) => Err(CliError::ProfileNotFound {
            available: available_profiles(cfg),
            name,
        }),
        Err(other) => Err(other.into()),
    }
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        return "(none)".into();
    }
    cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
}

// ── Session ─────────────────────────────────────────────────────────

/// An opened inventory plus the caller it is accessed as.
pub struct Session {
    pub registry: Registry,
    pub ctx: CallerContext,
    path: PathBuf,
    revision: u64,
}

impl Session {
    /// Load config, pick the profile, open its inventory and resolve the caller.
    pub fn open(global: &GlobalOpts) -> Result<Self, CliError> {
        let cfg = load(global)?;
        let (profile_name, profile) = resolve_profile(global, &cfg)?;
        let path = global
            .inventory
            .clone()
            .unwrap_or_else(|| profile.inventory_path());

        let registry = Registry::open(&path).map_err(|e| inventory_error(&path, e))?;
        let ctx = netdoc_config::caller_context(&profile, &profile_name, registry.store())?;
        debug!(
            profile = %profile_name,
            inventory = %path.display(),
            user = %ctx.username,
            superuser = ctx.superuser,
            "session opened"
        );

        let revision = registry.revision();
        Ok(Self {
            registry,
            ctx,
            path,
            revision,
        })
    }

    /// Write the inventory back if anything changed.
    pub fn commit(&self) -> Result<(), CliError> {
        if self.registry.revision() == self.revision {
            debug!("inventory unchanged, not saving");
            return Ok(());
        }
        self.registry
            .persist(&self.path)
            .map_err(|e| inventory_error(&self.path, e))
    }
}

fn inventory_error(path: &Path, err: CoreError) -> CliError {
    match err {
        CoreError::Snapshot { message } => CliError::Inventory {
            path: path.display().to_string(),
            message,
        },
        CoreError::Json(e) => CliError::Inventory {
            path: path.display().to_string(),
            message: e.to_string(),
        },
        other => other.into(),
    }
}
