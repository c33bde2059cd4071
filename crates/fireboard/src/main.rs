mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ConfigArgs, ConfigCommand};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(mut cli: Cli) -> Result<(), CliError> {
    // Neither needs the config file
    match &cli.command {
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "fireboard", &mut std::io::stdout());
            return Ok(());
        }
        Command::Config(ConfigArgs {
            command: ConfigCommand::Path,
        }) => {
            commands::config_cmd::print_path();
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load()?;
    config::apply_display_defaults(&mut cli.global, &cfg.defaults)?;

    match cli.command {
        // Config commands don't talk to the node
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        cmd => {
            let board_config = config::build_board_config(&cli.global)?;
            tracing::debug!(command = ?cmd, node = %board_config.node_url, "dispatching command");
            commands::dispatch(cmd, board_config, &cli.global).await
        }
    }
}
