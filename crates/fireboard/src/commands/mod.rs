//! Command dispatch: bridges CLI args -> feed controller -> output formatting.

pub mod config_cmd;
pub mod messages;
pub mod send;
pub mod status;
pub mod watch;

use fireboard_core::BoardConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a node-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, config: BoardConfig, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Messages => messages::handle(config, global).await,
        Command::Send(args) => send::handle(config, args, global).await,
        Command::Watch => watch::handle(config, global).await,
        Command::Status => status::handle(config, global).await,
        // Config and Completions never reach the node
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
