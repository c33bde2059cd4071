//! `fireboard-tui` — terminal message board for a data-exchange node.
//!
//! Shows the broadcast feed of one namespace with a compose field below it.
//! The feed refreshes on demand (Ctrl+R) and whenever the node's event
//! stream reports a change.
//!
//! Logs are written to a file (default `/tmp/fireboard-tui.log`) to avoid
//! corrupting the terminal UI.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screens;
mod theme;
mod tui;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use fireboard_core::{BoardConfig, FeedController};

use crate::app::App;

/// Terminal message board for a data-exchange node.
#[derive(Parser, Debug)]
#[command(name = "fireboard-tui", version, about)]
struct Cli {
    /// Config profile to use
    #[arg(short, long, env = "FIREBOARD_PROFILE")]
    profile: Option<String>,

    /// Node root URL (overrides the profile)
    #[arg(short, long, env = "FIREBOARD_NODE")]
    node: Option<String>,

    /// Event-stream endpoint (overrides the profile)
    #[arg(long, env = "FIREBOARD_EVENTS")]
    events: Option<String>,

    /// Namespace for the feed (overrides the profile)
    #[arg(short = 's', long, env = "FIREBOARD_NAMESPACE")]
    namespace: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(short = 'k', long, env = "FIREBOARD_INSECURE")]
    insecure: bool,

    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "FIREBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Log file path (defaults to /tmp/fireboard-tui.log)
    #[arg(long, default_value = "/tmp/fireboard-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing; stdout belongs to the terminal UI. The returned guard
/// must be held until exit so logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "fireboard_tui={log_level},fireboard_core={log_level},fireboard_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("fireboard-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Resolve the profile from the shared config file, then layer flags on top.
fn build_board_config(cli: &Cli) -> Result<BoardConfig> {
    let path = cli.config.clone().unwrap_or_else(fireboard_config::config_path);
    let cfg = fireboard_config::load_config_from(&path)
        .wrap_err_with(|| format!("could not load {}", path.display()))?;
    let (name, mut profile) = cfg
        .resolve_profile(cli.profile.as_deref())
        .wrap_err("could not resolve profile")?;

    if let Some(ref node) = cli.node {
        profile.node.clone_from(node);
    }
    if let Some(ref events) = cli.events {
        profile.events = Some(events.clone());
    }
    if let Some(ref namespace) = cli.namespace {
        profile.namespace.clone_from(namespace);
    }
    if cli.insecure {
        profile.insecure = Some(true);
    }

    let config = fireboard_config::profile_to_board_config(&profile, &cfg.defaults)
        .wrap_err_with(|| format!("invalid settings for profile '{name}'"))?;
    info!(profile = %name, node = %config.node_url, "resolved board config");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks BEFORE entering the terminal
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);
    info!("starting fireboard-tui");

    let config = build_board_config(&cli)?;
    let controller = FeedController::new(config).wrap_err("could not create node client")?;

    let mut app = App::new(controller);
    app.run().await?;

    info!("fireboard-tui exited cleanly");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cli_with_config(path: &std::path::Path) -> Cli {
        Cli::try_parse_from(["fireboard-tui", "--config", path.to_str().unwrap()]).unwrap()
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[profiles.default\nnode = ").unwrap();

        let err = build_board_config(&cli_with_config(&path)).unwrap_err();
        assert!(format!("{err}").contains("could not load"), "got: {err:?}");
    }

    #[test]
    fn missing_config_file_uses_local_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = build_board_config(&cli_with_config(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.node_url.as_str(), "http://localhost:5000/");
        assert_eq!(config.namespace, "default");
    }

    #[test]
    fn flags_override_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[profiles.default]\nnode = \"http://node-a:5000\"\nnamespace = \"ops\"\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "fireboard-tui",
            "--config",
            path.to_str().unwrap(),
            "--namespace",
            "dev",
        ])
        .unwrap();
        let config = build_board_config(&cli).unwrap();
        assert_eq!(config.node_url.as_str(), "http://node-a:5000/");
        assert_eq!(config.namespace, "dev");
    }
}
