//! Clap derive structures for the `fireboard` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fireboard -- message board for a data-exchange node
#[derive(Debug, Parser)]
#[command(
    name = "fireboard",
    version,
    about = "Read and broadcast messages on a data-exchange node",
    long_about = "A message board for a data-exchange node.\n\n\
        Lists broadcast messages with their resolved data, sends new\n\
        broadcasts, and follows the node's live event stream.",
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
    /// Node profile to use
    #[arg(long, short = 'p', env = "FIREBOARD_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Node URL (overrides profile)
    #[arg(long, short = 'n', env = "FIREBOARD_NODE", global = true)]
    pub node: Option<String>,

    /// Event-stream URL (default: derived from the node URL)
    #[arg(long, env = "FIREBOARD_EVENTS", global = true)]
    pub events: Option<String>,

    /// Namespace to read and broadcast in
    #[arg(long, short = 's', env = "FIREBOARD_NAMESPACE", global = true)]
    pub namespace: Option<String>,

    /// Output format [default: config `defaults.output`, else table]
    #[arg(long, short = 'o', env = "FIREBOARD_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: config `defaults.color`, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "FIREBOARD_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "FIREBOARD_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    /// Effective output format once config defaults have been applied.
    pub fn output_format(&self) -> &OutputFormat {
        self.output.as_ref().unwrap_or(&OutputFormat::Table)
    }

    pub fn color_mode(&self) -> &ColorMode {
        self.color.as_ref().unwrap_or(&ColorMode::Auto)
    }
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
    /// Plain text, one message per line
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
    /// List broadcast messages with their data
    #[command(visible_alias = "ls")]
    Messages,

    /// Broadcast a text message
    Send(SendArgs),

    /// Follow the feed, printing it whenever the node reports a change
    Watch,

    /// Show node identity and defaults
    Status,

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Message text
    pub text: String,

    /// Send privately to specific members (not supported)
    #[arg(long, hide = true)]
    pub private: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,
    /// Show the resolved configuration
    Show,
    /// Write a profile built from the current flags
    Init {
        /// Overwrite an existing profile of the same name
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
