//! Command dispatch: bridges CLI args -> core services -> output formatting.

pub mod chain;
pub mod circuit_types;
pub mod circuits;
pub mod config_cmd;
pub mod devices;
pub mod interfaces;
pub mod providers;
pub mod racks;
pub mod sites;
pub mod tenants;
pub mod terminations;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;

/// Dispatch an inventory-bound command to the appropriate handler.
pub fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Tenants(args) => tenants::handle(session, args, global),
        Command::Sites(args) => sites::handle(session, args, global),
        Command::Racks(args) => racks::handle(session, args, global),
        Command::Devices(args) => devices::handle(session, args, global),
        Command::Interfaces(args) => interfaces::handle(session, args, global),
        Command::CircuitTypes(args) => circuit_types::handle(session, args, global),
        Command::Providers(args) => providers::handle(session, args, global),
        Command::Circuits(args) => circuits::handle(session, args, global),
        Command::Terminations(args) => terminations::handle(session, args, global),
        Command::Chain(args) => chain::handle(session, args, global),
        // Config and Completions are handled before a session is opened
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
