//! Config subcommand handlers.

use serde::Serialize;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct ShownConfig<'a> {
    path: String,
    profile: &'a str,
    settings: &'a fireboard_config::Profile,
}

/// Print the config file location. Works even when the file is unreadable.
pub fn print_path() {
    println!("{}", fireboard_config::config_path().display());
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            print_path();
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load()?;
            let (name, profile) = config::effective_profile(&cfg, global)?;
            let shown = ShownConfig {
                path: fireboard_config::config_path().display().to_string(),
                profile: &name,
                settings: &profile,
            };
            let out = match global.output_format() {
                OutputFormat::Table | OutputFormat::Plain => {
                    let body = toml::to_string_pretty(&profile).map_err(|e| CliError::Validation {
                        field: "config".into(),
                        reason: format!("failed to render profile: {e}"),
                    })?;
                    format!("# {} (profile: {name})\n{body}", shown.path)
                }
                _ => output::render_single(global.output_format(), &shown, |_| String::new(), |_| String::new()),
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let mut cfg = config::load()?;
            let name = cfg.profile_name(global.profile.as_deref()).to_owned();

            if cfg.profiles.contains_key(&name) && !force {
                return Err(CliError::Validation {
                    field: "profile".into(),
                    reason: format!("'{name}' already exists, pass --force"),
                });
            }

            let mut profile = cfg.profiles.get(&name).cloned().unwrap_or_default();
            config::apply_overrides(&mut profile, global);
            // Reject unusable URLs before writing anything.
            fireboard_config::profile_to_board_config(&profile, &cfg.defaults)?;

            cfg.profiles.insert(name.clone(), profile);
            if cfg.default_profile.is_none() {
                cfg.default_profile = Some(name.clone());
            }
            let path = fireboard_config::save_config(&cfg)?;

            output::status_line(
                &format!("Saved profile '{name}' to {}", path.display()),
                output::should_color(global.color_mode()),
                global.quiet,
            );
            Ok(())
        }
    }
}
