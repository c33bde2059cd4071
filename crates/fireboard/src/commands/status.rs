//! Node status check.

use fireboard_core::{BoardConfig, CoreError, FeedController, NodeStatus};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(s: &NodeStatus) -> String {
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    [
        format!("Node:        {}", or_dash(&s.node.name)),
        format!("Registered:  {}", yes_no(s.node.registered)),
        format!("Org:         {}", or_dash(&s.org.name)),
        format!("Identity:    {}", s.org.identity.as_deref().unwrap_or("-")),
        format!("Namespace:   {}", s.defaults.namespace.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

pub async fn handle(config: BoardConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let node = config.node_url.clone();
    let status = FeedController::oneshot(config, |ctrl| async move {
        ctrl.client().node_status().await.map_err(CoreError::from)
    })
    .await
    .map_err(|e| CliError::from_core(e, &node))?;

    let out = output::render_single(global.output_format(), &status, detail, |s| s.node.name.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
