//! Data bridge — connects [`FeedController`] streams to TUI actions.
//!
//! Subscribes to the snapshot, load state, notices, and stream status, then
//! starts the controller and forwards every change as an [`Action`].

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use fireboard_core::{FeedController, Notice};

use crate::action::Action;

pub async fn spawn_data_bridge(
    controller: FeedController,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    // Subscribe first so nothing raised during start() is missed.
    let mut snapshots = controller.subscribe_snapshot();
    let mut state = controller.state();
    let mut notices = controller.notices();
    let mut stream = controller.stream_status();
    let mut last_refresh = controller.subscribe_last_refresh();

    if let Err(e) = controller.start().await {
        warn!(error = %e, "failed to start feed");
        let _ = action_tx.send(Action::Notify(Notice::error(format!("{e}"))));
    }

    let _ = action_tx.send(Action::SnapshotUpdated(snapshots.borrow_and_update().clone()));
    let _ = action_tx.send(Action::FeedStateChanged(*state.borrow_and_update()));
    let _ = action_tx.send(Action::StreamStatusChanged(*stream.borrow_and_update()));
    if let Some(at) = *last_refresh.borrow_and_update() {
        let _ = action_tx.send(Action::LastRefresh(at));
    }

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = snapshots.changed() => {
                debug!("dispatching SnapshotUpdated");
                let snap = snapshots.borrow_and_update().clone();
                let _ = action_tx.send(Action::SnapshotUpdated(snap));
            }
            Ok(()) = state.changed() => {
                let s = *state.borrow_and_update();
                let _ = action_tx.send(Action::FeedStateChanged(s));
            }
            Ok(()) = stream.changed() => {
                let s = *stream.borrow_and_update();
                let _ = action_tx.send(Action::StreamStatusChanged(s));
            }
            Ok(()) = last_refresh.changed() => {
                if let Some(at) = *last_refresh.borrow_and_update() {
                    let _ = action_tx.send(Action::LastRefresh(at));
                }
            }
            notice = notices.recv() => match notice {
                Ok(n) => {
                    let _ = action_tx.send(Action::Notify(n));
                }
                Err(RecvError::Lagged(n)) => debug!(skipped = n, "notice receiver lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    controller.shutdown().await;
    debug!("data bridge shut down");
}
