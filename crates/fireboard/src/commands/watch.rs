//! Follow the feed until Ctrl-C.

use fireboard_core::{BoardConfig, FeedController, NoticeLevel, StreamStatus};
use tokio::sync::broadcast::error::RecvError;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn describe(status: StreamStatus) -> String {
    match status {
        StreamStatus::Connecting => "live updates: connecting".into(),
        StreamStatus::Connected => "live updates: connected".into(),
        StreamStatus::Reconnecting { attempt } => format!("live updates: reconnecting (attempt {attempt})"),
        StreamStatus::Stopped => "live updates: stopped".into(),
    }
}

pub async fn handle(config: BoardConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config;
    cfg.live_updates = true;
    let node = cfg.node_url.clone();
    let color = output::should_color(global.color_mode());

    let ctrl = FeedController::new(cfg).map_err(|e| CliError::from_core(e, &node))?;
    let mut snapshots = ctrl.subscribe_snapshot();
    let mut notices = ctrl.notices();
    let mut status = ctrl.stream_status();

    ctrl.start().await.map_err(|e| CliError::from_core(e, &node))?;

    let initial = snapshots.borrow_and_update().clone();
    output::print_output(&super::messages::render(&initial, global), global.quiet);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = snapshots.borrow_and_update().clone();
                output::print_output(&super::messages::render(&snap, global), global.quiet);
            }
            notice = notices.recv() => match notice {
                Ok(n) if n.level == NoticeLevel::Info => output::status_line(&n.message, color, global.quiet),
                Ok(n) => output::warn_line(&n.message, color),
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let s = *status.borrow_and_update();
                output::status_line(&describe(s), color, global.quiet);
            }
        }
    }

    ctrl.shutdown().await;
    Ok(())
}
