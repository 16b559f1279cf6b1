//! Clap derive structures for the `netdoc` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Records are addressed by their numeric id; `-o plain` prints ids.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netdoc -- circuit and data-center inventory from the command line
#[derive(Debug, Parser)]
#[command(
    name = "netdoc",
    version,
    about = "Document circuits, their terminations and the network they land on",
    long_about = "Keeps an inventory of providers, circuits and circuit terminations,\n\
        plus the sites, racks, devices and interfaces they terminate on.\n\n\
        Every write is checked against the termination rules: one A and one Z\n\
        side per circuit, and one termination per interface.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Inventory profile to use
    #[arg(long, short = 'p', env = "NETDOC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "NETDOC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Inventory snapshot file (overrides profile)
    #[arg(long, short = 'i', env = "NETDOC_INVENTORY", global = true)]
    pub inventory: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NETDOC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage tenants
    Tenants(TenantsArgs),

    /// Manage sites
    Sites(SitesArgs),

    /// Manage racks
    Racks(RacksArgs),

    /// Manage devices
    #[command(alias = "dev")]
    Devices(DevicesArgs),

    /// Manage device interfaces and cabling
    #[command(alias = "if")]
    Interfaces(InterfacesArgs),

    /// Manage circuit types
    CircuitTypes(CircuitTypesArgs),

    /// Manage circuit providers
    Providers(ProvidersArgs),

    /// Manage circuits
    #[command(alias = "ckt")]
    Circuits(CircuitsArgs),

    /// Manage circuit terminations (A/Z sides)
    #[command(alias = "term")]
    Terminations(TerminationsArgs),

    /// Resolve the site / rack / device / interface selection chain
    Chain(ChainArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Tenants ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TenantsArgs {
    #[command(subcommand)]
    pub command: TenantsCommand,
}

#[derive(Debug, Subcommand)]
pub enum TenantsCommand {
    /// List tenants
    #[command(alias = "ls")]
    List,

    /// Create a tenant
    Create {
        /// Tenant name
        name: String,
        /// URL-friendly slug
        #[arg(long)]
        slug: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Delete a tenant
    #[command(alias = "rm")]
    Delete {
        /// Tenant id
        id: u64,
    },
}

// ── Sites ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SitesArgs {
    #[command(subcommand)]
    pub command: SitesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SitesCommand {
    /// List sites
    #[command(alias = "ls")]
    List,

    /// Create a site
    Create {
        /// Site name
        name: String,
        /// URL-friendly slug
        #[arg(long)]
        slug: String,
        /// Owning tenant, by name
        #[arg(long)]
        tenant: Option<String>,
    },

    /// Delete a site
    #[command(alias = "rm")]
    Delete {
        /// Site id
        id: u64,
    },
}

// ── Racks ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RacksArgs {
    #[command(subcommand)]
    pub command: RacksCommand,
}

#[derive(Debug, Subcommand)]
pub enum RacksCommand {
    /// List racks
    #[command(alias = "ls")]
    List {
        /// Only racks in this site
        #[arg(long)]
        site: Option<u64>,
    },

    /// Create a rack
    Create {
        /// Rack name, unique within its site
        name: String,
        /// Site id
        #[arg(long)]
        site: u64,
        /// Owning tenant, by name
        #[arg(long)]
        tenant: Option<String>,
    },
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices
    #[command(alias = "ls")]
    List {
        /// Only devices in this site
        #[arg(long)]
        site: Option<u64>,
    },

    /// Create a device
    Create {
        /// Device name
        name: String,
        /// Site id
        #[arg(long)]
        site: u64,
        /// Rack id (must be in the same site)
        #[arg(long)]
        rack: Option<u64>,
        /// Hardware model
        #[arg(long, default_value = "")]
        model: String,
        /// Owning tenant, by name
        #[arg(long)]
        tenant: Option<String>,
    },

    /// Delete a device and its interfaces
    #[command(alias = "rm")]
    Delete {
        /// Device id
        id: u64,
    },
}

// ── Interfaces ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InterfacesArgs {
    #[command(subcommand)]
    pub command: InterfacesCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum InterfaceKindArg {
    Physical,
    Virtual,
    Lag,
}

#[derive(Debug, Subcommand)]
pub enum InterfacesCommand {
    /// List a device's interfaces
    #[command(alias = "ls")]
    List {
        /// Device id
        #[arg(long)]
        device: u64,
    },

    /// Create an interface
    Create {
        /// Interface name, unique within its device
        name: String,
        /// Device id
        #[arg(long)]
        device: u64,
        #[arg(long, value_enum, default_value = "physical")]
        kind: InterfaceKindArg,
        /// Management-only interface (cannot terminate a circuit)
        #[arg(long)]
        mgmt_only: bool,
    },

    /// Cable two interfaces together
    Cable {
        /// First interface id
        a: u64,
        /// Second interface id
        b: u64,
    },

    /// Remove the cable from an interface
    Uncable {
        /// Interface id
        id: u64,
    },

    /// Delete an interface
    #[command(alias = "rm")]
    Delete {
        /// Interface id
        id: u64,
    },
}

// ── Circuit types ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CircuitTypesArgs {
    #[command(subcommand)]
    pub command: CircuitTypesCommand,
}

#[derive(Debug, Subcommand)]
pub enum CircuitTypesCommand {
    /// List circuit types
    #[command(alias = "ls")]
    List,

    /// Create a circuit type
    Create {
        /// Type name
        name: String,
        /// URL-friendly slug
        #[arg(long)]
        slug: String,
    },
}

// ── Providers ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProvidersArgs {
    #[command(subcommand)]
    pub command: ProvidersCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProvidersCommand {
    /// List providers
    #[command(alias = "ls")]
    List,

    /// Import providers from CSV (all rows or none)
    Import(ImportArgs),

    /// Export providers as CSV
    Export(ExportArgs),

    /// Delete a provider
    #[command(alias = "rm")]
    Delete {
        /// Provider id
        id: u64,
    },
}

// ── Circuits ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CircuitsArgs {
    #[command(subcommand)]
    pub command: CircuitsCommand,
}

#[derive(Debug, Subcommand)]
pub enum CircuitsCommand {
    /// List circuits
    #[command(alias = "ls")]
    List {
        /// Only circuits of this provider, by name
        #[arg(long)]
        provider: Option<String>,
    },

    /// Import circuits from CSV (all rows or none)
    Import(ImportArgs),

    /// Export circuits as CSV
    Export(ExportArgs),

    /// Delete a circuit and its terminations
    #[command(alias = "rm")]
    Delete {
        /// Circuit id
        id: u64,
    },
}

// ── Shared bulk arguments ────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// CSV file with a header row; `-` reads stdin
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Write to this file instead of stdout
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,
}

// ── Terminations ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TerminationsArgs {
    #[command(subcommand)]
    pub command: TerminationsCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SideArg {
    #[value(name = "A", alias = "a")]
    A,
    #[value(name = "Z", alias = "z")]
    Z,
}

#[derive(Debug, Subcommand)]
pub enum TerminationsCommand {
    /// List a circuit's terminations, A side first
    #[command(alias = "ls")]
    List {
        /// Circuit id
        circuit: u64,
    },

    /// Create a termination, or update one with --id
    Set(TerminationSetArgs),

    /// Show the termination on the opposite side
    Peer {
        /// Termination id
        id: u64,
    },

    /// Delete a termination
    #[command(alias = "rm")]
    Delete {
        /// Termination id
        id: u64,
    },
}

#[derive(Debug, Args)]
pub struct TerminationSetArgs {
    /// Circuit id
    pub circuit: u64,

    /// Termination side
    #[arg(value_enum)]
    pub side: SideArg,

    /// Site id
    #[arg(long)]
    pub site: u64,

    /// Interface id (physical, non-management)
    #[arg(long)]
    pub interface: Option<u64>,

    /// Port speed in Kbps
    #[arg(long)]
    pub port_speed: u32,

    /// Upstream speed in Kbps, if different
    #[arg(long)]
    pub upstream_speed: Option<u32>,

    /// Cross-connect id
    #[arg(long, default_value = "")]
    pub xconnect_id: String,

    /// Patch panel / port(s)
    #[arg(long, default_value = "")]
    pub pp_info: String,

    /// Update this existing termination instead of creating one
    #[arg(long)]
    pub id: Option<u64>,
}

// ── Chain ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ChainArgs {
    #[command(subcommand)]
    pub command: ChainCommand,
}

#[derive(Debug, Subcommand)]
pub enum ChainCommand {
    /// Options for one chain field given the parent selections
    Resolve {
        /// Field to resolve: site, rack, device or interface
        field: String,
        #[arg(long)]
        site: Option<u64>,
        #[arg(long)]
        rack: Option<u64>,
        #[arg(long)]
        device: Option<u64>,
        /// Termination being edited (its own interface stays selectable)
        #[arg(long)]
        editing: Option<u64>,
    },

    /// Selections that reproduce an existing termination
    Seed {
        /// Termination id
        id: u64,
    },

    /// Print the filter template of every chain field
    Templates,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Create or replace a profile
    Init {
        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,
        /// Inventory snapshot file
        #[arg(long)]
        inventory: Option<PathBuf>,
        /// Username recorded in logs
        #[arg(long)]
        user: Option<String>,
        /// Scope the profile to this tenant (repeatable)
        #[arg(long = "tenant")]
        tenants: Vec<String>,
        /// See every record regardless of tenant
        #[arg(long)]
        superuser: bool,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
