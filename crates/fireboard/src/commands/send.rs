//! Broadcast a text message.

use fireboard_core::{BoardConfig, FeedController};
use serde::Serialize;

use crate::cli::{GlobalOpts, SendArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Receipt {
    /// Accepted message id, when the node echoed one.
    id: Option<String>,
    namespace: String,
}

pub async fn handle(config: BoardConfig, args: SendArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if args.private {
        return Err(CliError::Unsupported {
            feature: "Private send".into(),
        });
    }
    if args.text.is_empty() {
        return Err(CliError::Validation {
            field: "text".into(),
            reason: "message text cannot be empty".into(),
        });
    }

    let node = config.node_url.clone();
    let namespace = config.namespace.clone();
    let text = args.text;
    let id = FeedController::oneshot(config, |ctrl| async move { ctrl.submit(&text).await })
        .await
        .map_err(|e| CliError::from_core(e, &node))?;

    let receipt = Receipt { id, namespace };
    let out = output::render_single(
        global.output_format(),
        &receipt,
        |r| match r.id {
            Some(ref id) => format!("Broadcast accepted: {id}"),
            None => "Broadcast accepted".into(),
        },
        |r| r.id.clone().unwrap_or_default(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
