//! Shared configuration for netdoc tools.
//!
//! TOML profiles layered under `NETDOC_` environment overrides, plus
//! translation of a profile into the `netdoc_core::CallerContext` that
//! every core operation runs under.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use netdoc_core::{CallerContext, DataStore, EntityId, Tenant};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("profile '{profile}' references unknown tenant '{tenant}'")]
    UnknownTenant { profile: String, tenant: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named inventory profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some(DEFAULT_PROFILE.into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

pub const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// A named inventory profile: which snapshot to work on, and as whom.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Inventory snapshot file. Defaults to the platform data directory.
    pub inventory: Option<PathBuf>,

    /// Username recorded in logs.
    pub user: Option<String>,

    /// Tenant slugs or names this profile is scoped to.
    #[serde(default)]
    pub tenants: Vec<String>,

    /// See every record regardless of tenant.
    #[serde(default)]
    pub superuser: bool,
}

impl Profile {
    /// Snapshot path for this profile.
    pub fn inventory_path(&self) -> PathBuf {
        self.inventory.clone().unwrap_or_else(default_inventory_path)
    }

    pub fn username(&self) -> String {
        self.user.clone().unwrap_or_else(|| "netdoc".into())
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "netdoc", "netdoc")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("netdoc");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Where the inventory snapshot lives when a profile does not say.
pub fn default_inventory_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("inventory.json"),
        |dirs| dirs.data_dir().join("inventory.json"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config at `path`, layered as defaults → TOML → `NETDOC_` env.
///
/// Nested env keys use a double underscore, e.g.
/// `NETDOC_DEFAULTS__OUTPUT=json`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NETDOC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load the full Config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Profile resolution ──────────────────────────────────────────────

impl Config {
    /// Name of the profile to use: explicit choice, then the configured default.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| DEFAULT_PROFILE.into())
    }

    /// Look up a profile. The implicit default profile may be absent from
    /// the file, in which case an empty profile stands in for it.
    pub fn profile(&self, name: &str) -> Result<Profile, ConfigError> {
        match self.profiles.get(name) {
            Some(profile) => Ok(profile.clone()),
            None if name == DEFAULT_PROFILE => Ok(Profile {
                superuser: true,
                ..Profile::default()
            }),
            None => Err(ConfigError::UnknownProfile { name: name.into() }),
        }
    }
}

/// Build the caller context a profile runs under.
///
/// Tenant references match a tenant's slug first, then its name.
pub fn caller_context(
    profile: &Profile,
    profile_name: &str,
    store: &DataStore,
) -> Result<CallerContext, ConfigError> {
    let username = profile.username();
    if profile.superuser {
        return Ok(CallerContext::superuser(username));
    }

    let tenants = store.all::<Tenant>();
    let ids = profile
        .tenants
        .iter()
        .map(|reference| {
            tenants
                .iter()
                .find(|t| t.slug == *reference)
                .or_else(|| tenants.iter().find(|t| t.name == *reference))
                .map(|t| t.id)
                .ok_or_else(|| ConfigError::UnknownTenant {
                    profile: profile_name.into(),
                    tenant: reference.clone(),
                })
        })
        .collect::<Result<Vec<EntityId>, _>>()?;

    Ok(CallerContext::scoped(username, ids))
}
