//! Flag-aware wrappers over `fireboard-config`.
//!
//! Precedence: command-line flag > environment > profile > built-in default.

use clap::ValueEnum;
use fireboard_config::{Config, ConfigError, Defaults, Profile};
use fireboard_core::BoardConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the config file (missing file yields defaults).
pub fn load() -> Result<Config, CliError> {
    Ok(fireboard_config::load_config()?)
}

/// Resolve the active profile and apply flag overrides on top.
pub fn effective_profile(cfg: &Config, global: &GlobalOpts) -> Result<(String, Profile), CliError> {
    let (name, mut profile) = match cfg.resolve_profile(global.profile.as_deref()) {
        Ok(found) => found,
        Err(ConfigError::UnknownProfile(name)) => {
            let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        Err(e) => return Err(e.into()),
    };

    apply_overrides(&mut profile, global);
    Ok((name, profile))
}

/// Overlay command-line flags onto a profile.
pub fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref node) = global.node {
        profile.node.clone_from(node);
    }
    if let Some(ref events) = global.events {
        profile.events = Some(events.clone());
    }
    if let Some(ref namespace) = global.namespace {
        profile.namespace.clone_from(namespace);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}

/// Fill `--output` / `--color` from the file's `[defaults]` when neither the
/// flag nor its environment variable was given.
pub fn apply_display_defaults(global: &mut GlobalOpts, defaults: &Defaults) -> Result<(), CliError> {
    if global.output.is_none() {
        global.output = Some(parse_setting("defaults.output", &defaults.output)?);
    }
    if global.color.is_none() {
        global.color = Some(parse_setting("defaults.color", &defaults.color)?);
    }
    Ok(())
}

fn parse_setting<T: ValueEnum>(field: &str, raw: &str) -> Result<T, CliError> {
    T::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}

/// Build the `BoardConfig` for a node-bound command.
pub fn build_board_config(global: &GlobalOpts) -> Result<BoardConfig, CliError> {
    let cfg = load()?;
    let (name, profile) = effective_profile(&cfg, global)?;
    tracing::debug!(profile = %name, node = %profile.node, "resolved profile");
    Ok(fireboard_config::profile_to_board_config(&profile, &cfg.defaults)?)
}
