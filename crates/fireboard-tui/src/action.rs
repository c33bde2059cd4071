//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::sync::Arc;

use fireboard_core::{FeedSnapshot, FeedState, Notice, StreamStatus};

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ─────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),
    ToggleHelp,

    // ── Feed data (from the data bridge) ──────────────────────────
    SnapshotUpdated(Arc<FeedSnapshot>),
    FeedStateChanged(FeedState),
    StreamStatusChanged(StreamStatus),
    LastRefresh(chrono::DateTime<chrono::Utc>),

    // ── Commands (to the controller) ──────────────────────────────
    Refresh,
    Submit(String),
    SubmitSucceeded,
    SubmitFailed(String),

    // ── Notices ───────────────────────────────────────────────────
    Notify(Notice),
    DismissNotice,
}
