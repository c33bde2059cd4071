//! Message feed layer between `fireboard-api` and UI consumers (CLI / TUI).
//!
//! - **[`FeedController`]** — Owns the single long-lived
//!   [`ExchangeClient`](fireboard_api::ExchangeClient), the current
//!   [`FeedSnapshot`], and the live-update subscription.
//!   [`start()`](FeedController::start) runs once per controller: it opens the
//!   auto-reconnecting event stream and performs the initial refresh. Every
//!   change tick from the node triggers another
//!   [`refresh()`](FeedController::refresh).
//!
//! - **[`FeedSnapshot`]** — The atomic (messages, resolved data) pair. Always
//!   replaced as a whole, never patched.
//!
//! - **[`Notice`]** — Non-fatal, user-visible failures (a refresh that could
//!   not reach the node, a broadcast that was rejected).

pub mod config;
pub mod controller;
pub mod error;
pub mod notice;
pub mod snapshot;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{BoardConfig, TlsVerification};
pub use controller::{FeedController, FeedState};
pub use error::CoreError;
pub use notice::{Notice, NoticeLevel};
pub use snapshot::{FeedItem, FeedSnapshot};

// Wire types consumers render directly.
pub use fireboard_api::{ChangeTick, Data, DataRef, Message, MessageHeader, NodeStatus, StreamStatus};
