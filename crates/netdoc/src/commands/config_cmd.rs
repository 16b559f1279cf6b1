//! Config command handlers.
//!
//! These run without an open inventory, so a broken profile can still be
//! inspected and repaired.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Profile};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let rendered = toml::to_string_pretty(&cfg).map_err(config::ConfigError::from)?;
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init {
            name,
            inventory,
            user,
            tenants,
            superuser,
        } => {
            let mut cfg = config::load(global)?;
            let profile = Profile {
                inventory,
                user,
                tenants,
                superuser,
            };
            let replaced = cfg.profiles.insert(name.clone(), profile).is_some();
            if cfg.default_profile.is_none() {
                cfg.default_profile = Some(name.clone());
            }
            config::save(global, &cfg)?;

            let verb = if replaced { "Replaced" } else { "Created" };
            output::notice(
                &format!(
                    "{verb} profile '{name}' in {}",
                    config::config_file(global).display()
                ),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load(global)?;
            let active = cfg.active_profile_name(global.profile.as_deref());
            let lines: Vec<String> = cfg
                .profiles
                .keys()
                .map(|name| {
                    let marker = if *name == active { "*" } else { " " };
                    format!("{marker} {name}")
                })
                .collect();
            if lines.is_empty() {
                output::notice(
                    "No profiles configured. Create one with: netdoc config init",
                    global.quiet,
                );
            } else {
                output::print_output(&lines.join("\n"), global.quiet);
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load(global)?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save(global, &cfg)?;
            output::notice(&format!("Default profile set to '{name}'"), global.quiet);
            Ok(())
        }
    }
}
