//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` / `ConfigError` into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use fireboard_config::ConfigError;
use fireboard_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Node ─────────────────────────────────────────────────────────
    #[error("Could not reach node at {url}")]
    #[diagnostic(
        code(fireboard::connection_failed),
        help(
            "Check that the node is running and accessible.\n\
             URL: {url}\n\
             Reason: {reason}\n\
             Try: fireboard status --node <URL>"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Node rejected the request ({status}): {message}")]
    #[diagnostic(code(fireboard::rejected))]
    Rejected { status: u16, message: String },

    #[error("Unexpected response from node")]
    #[diagnostic(
        code(fireboard::decode),
        help("The node answered with a shape this version does not understand.\n{message}")
    )]
    Decode { message: String },

    // ── Unsupported ──────────────────────────────────────────────────
    #[error("{feature} is not supported")]
    #[diagnostic(
        code(fireboard::unsupported),
        help("Only broadcast messages can be sent.")
    )]
    Unsupported { feature: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fireboard::validation))]
    Validation { field: String, reason: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fireboard::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: fireboard config init --profile {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(fireboard::config))]
    Config(ConfigError),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Rejected { .. } => exit_code::CONNECTION,
            Self::Validation { .. } | Self::ProfileNotFound { .. } | Self::Config(_) => {
                exit_code::USAGE
            }
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::Decode { .. } => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

impl CliError {
    /// Translate a core error, naming the node that was contacted.
    pub fn from_core(err: CoreError, node: &url::Url) -> Self {
        match err {
            CoreError::Transport {
                status: Some(status),
                message,
            } => Self::Rejected { status, message },
            CoreError::Transport {
                status: None,
                message,
            } => Self::ConnectionFailed {
                url: node.to_string(),
                reason: message,
            },
            CoreError::Decode { message } => Self::Decode { message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}
