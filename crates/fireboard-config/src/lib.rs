//! Shared configuration for the fireboard CLI and TUI.
//!
//! TOML profiles layered under `FIREBOARD__*` environment overrides, and
//! translation to `fireboard_core::BoardConfig`. The CLI adds flag-aware
//! wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use fireboard_core::config::{DEFAULT_NAMESPACE, DEFAULT_NODE_URL};
use fireboard_core::{BoardConfig, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{0}' not found")]
    UnknownProfile(String),

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

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named node profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named node profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Node root URL (e.g., "http://localhost:5000").
    #[serde(default = "default_node")]
    pub node: String,

    /// Event-stream endpoint. Derived from `node` when absent.
    pub events: Option<String>,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Subscribe to live updates (TUI / watch).
    pub live_updates: Option<bool>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            node: default_node(),
            events: None,
            namespace: default_namespace(),
            ca_cert: None,
            insecure: None,
            timeout: None,
            live_updates: None,
        }
    }
}

fn default_node() -> String {
    DEFAULT_NODE_URL.into()
}
fn default_namespace() -> String {
    DEFAULT_NAMESPACE.into()
}

impl Config {
    /// Name of the profile to use: explicit choice, then `default_profile`,
    /// then `"default"`.
    pub fn profile_name<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }

    /// Look up a profile. A missing *implicit* profile falls back to the
    /// built-in local-node defaults; a missing explicit one is an error.
    pub fn resolve_profile(&self, explicit: Option<&str>) -> Result<(String, Profile), ConfigError> {
        let name = self.profile_name(explicit);
        match self.profiles.get(name) {
            Some(profile) => Ok((name.to_owned(), profile.clone())),
            None if explicit.is_some() => Err(ConfigError::UnknownProfile(name.to_owned())),
            None => Ok((name.to_owned(), Profile::default())),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "fireboard", "fireboard").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("fireboard");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (missing file is fine) layered under `FIREBOARD__*`
/// env vars, e.g. `FIREBOARD__DEFAULTS__TIMEOUT=5`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FIREBOARD__").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

/// Build a `BoardConfig` from a profile plus global defaults, no CLI flags.
pub fn profile_to_board_config(profile: &Profile, defaults: &Defaults) -> Result<BoardConfig, ConfigError> {
    let node_url = parse_url("node", &profile.node)?;
    if !matches!(node_url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "node".into(),
            reason: format!("expected an http(s) URL, got '{}'", profile.node),
        });
    }

    let events_url = profile
        .events
        .as_deref()
        .map(|raw| parse_url("events", raw))
        .transpose()?;

    if profile.namespace.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "namespace".into(),
            reason: "must not be empty".into(),
        });
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(BoardConfig {
        node_url,
        events_url,
        namespace: profile.namespace.clone(),
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        live_updates: profile.live_updates.unwrap_or(true),
        ..BoardConfig::default()
    })
}
