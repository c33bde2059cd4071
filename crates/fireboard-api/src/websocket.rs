//! Live-update WebSocket with auto-reconnect.
//!
//! Connects to the node's event stream in ephemeral, auto-acknowledge mode
//! and turns every inbound frame into an opaque [`ChangeTick`] on a
//! [`tokio::sync::broadcast`] channel. Frame contents are never parsed: a
//! tick only means "something changed on the node".
//!
//! Reconnection with exponential backoff + jitter is handled here, so
//! consumers never re-implement retry logic.
//!
//! # Example
//!
//! ```rust,ignore
//! use fireboard_api::websocket::{self, EventStreamHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let endpoint = websocket::derive_endpoint(&"http://localhost:5000".parse()?)?;
//! let url = websocket::subscription_url(&endpoint, "default");
//! let handle = EventStreamHandle::connect(url, ReconnectConfig::default(), CancellationToken::new());
//! let mut rx = handle.subscribe();
//!
//! while let Ok(tick) = rx.recv().await {
//!     println!("node changed at {}", tick.received_at);
//! }
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use tokio::sync::{broadcast, watch};
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── Broadcast channel capacity ───────────────────────────────────────

const TICK_CHANNEL_CAPACITY: usize = 256;

// ── ChangeTick ───────────────────────────────────────────────────────

/// "Something changed" notification. Carries no node payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeTick {
    pub received_at: DateTime<Utc>,
}

impl ChangeTick {
    pub fn now() -> Self {
        Self {
            received_at: Utc::now(),
        }
    }
}

// ── StreamStatus ─────────────────────────────────────────────────────

/// Connection state of the live-update stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamStatus {
    #[default]
    Connecting,
    Connected,
    Reconnecting {
        attempt: u32,
    },
    /// The loop exited (cancelled or retry limit reached).
    Stopped,
}

// ── URL helpers ──────────────────────────────────────────────────────

/// Derive the WebSocket endpoint from the node's HTTP URL.
///
/// `http` becomes `ws`, `https` becomes `wss`, and `/ws` is appended to
/// the node's base path.
pub fn derive_endpoint(node_url: &Url) -> Result<Url, Error> {
    let mut url = node_url.clone();
    let scheme = match node_url.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme).map_err(|()| {
        Error::WebSocketConnect(format!("cannot derive WebSocket URL from {node_url}"))
    })?;
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut path = url.path_segments_mut().map_err(|()| {
            Error::WebSocketConnect(format!("cannot derive WebSocket URL from {node_url}"))
        })?;
        path.pop_if_empty().push("ws");
    }
    Ok(url)
}

/// Scope an endpoint to `namespace` in ephemeral, auto-acknowledge mode:
/// `…/ws?namespace=<ns>&ephemeral&autoack`.
pub fn subscription_url(endpoint: &Url, namespace: &str) -> Url {
    let mut url = endpoint.clone();
    url.set_query(None);
    url.query_pairs_mut()
        .append_pair("namespace", namespace)
        .append_key_only("ephemeral")
        .append_key_only("autoack");
    url
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for WebSocket reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── EventStreamHandle ────────────────────────────────────────────────

/// Handle to a running live-update stream.
///
/// Call [`shutdown`](Self::shutdown) (or cancel the token passed to
/// [`connect`](Self::connect)) to tear down the background task.
pub struct EventStreamHandle {
    tick_rx: broadcast::Receiver<ChangeTick>,
    status_rx: watch::Receiver<StreamStatus>,
    cancel: CancellationToken,
}

impl EventStreamHandle {
    /// Spawn the reconnection loop for `url` and return immediately.
    ///
    /// The first connection attempt happens asynchronously. Must be called
    /// from within a tokio runtime.
    pub fn connect(url: Url, reconnect: ReconnectConfig, cancel: CancellationToken) -> Self {
        let (tick_tx, tick_rx) = broadcast::channel(TICK_CHANNEL_CAPACITY);
        let (status_tx, status_rx) = watch::channel(StreamStatus::Connecting);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            ws_loop(url, tick_tx, status_tx, reconnect, task_cancel).await;
        });

        Self {
            tick_rx,
            status_rx,
            cancel,
        }
    }

    /// Get a new receiver for change ticks.
    ///
    /// A consumer that falls behind receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeTick> {
        self.tick_rx.resubscribe()
    }

    /// Observe connection state transitions.
    pub fn status(&self) -> watch::Receiver<StreamStatus> {
        self.status_rx.clone()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
async fn ws_loop(
    url: Url,
    tick_tx: broadcast::Sender<ChangeTick>,
    status_tx: watch::Sender<StreamStatus>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&url, &tick_tx, &status_tx, &cancel) => {
                match result {
                    // Clean disconnect: reset the attempt counter and reconnect immediately.
                    Ok(()) => {
                        if cancel.is_cancelled() {
                            break;
                        }
                        tracing::info!("live-update stream closed, reconnecting");
                        attempt = 0;
                        let _ = status_tx.send(StreamStatus::Connecting);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "live-update stream error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "live-update reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        attempt += 1;
                        let _ = status_tx.send(StreamStatus::Reconnecting { attempt });

                        let delay = calculate_backoff(attempt - 1, &reconnect);
                        tracing::info!(
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            attempt,
                            "waiting before reconnect"
                        );

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }
        }
    }

    let _ = status_tx.send(StreamStatus::Stopped);
    tracing::debug!("live-update loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish a single connection and forward ticks until it drops.
async fn connect_and_read(
    url: &Url,
    tick_tx: &broadcast::Sender<ChangeTick>,
    status_tx: &watch::Sender<StreamStatus>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::debug!(url = %url, "connecting to live-update stream");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::info!("WebSocket connected");
    let _ = status_tx.send(StreamStatus::Connected);

    // Auto-acknowledge mode: nothing is ever written back.
    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(_) | tungstenite::Message::Binary(_))) => {
                        // No subscribers right now is not an error.
                        let _ = tick_tx.send(ChangeTick::now());
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "WebSocket close frame received"
                            );
                        } else {
                            tracing::info!("WebSocket close frame received (no payload)");
                        }
                        return close_outcome(frame.as_ref());
                    }
                    Some(Ok(_)) => {
                        // Ping / Pong / raw frames; tungstenite answers pings itself.
                        tracing::trace!("WebSocket control frame");
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("WebSocket stream ended");
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Normal and going-away closes are clean disconnects. Any other close code
/// is an error, so the loop backs off before reconnecting.
fn close_outcome(frame: Option<&CloseFrame>) -> Result<(), Error> {
    match frame {
        Some(cf) if !matches!(cf.code, CloseCode::Normal | CloseCode::Away) => {
            Err(Error::WebSocketClosed {
                code: u16::from(cf.code),
                reason: cf.reason.to_string(),
            })
        }
        _ => Ok(()),
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 ± 0.25)`
///
/// The jitter is deterministic in the attempt number.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(30)).unwrap_or(30);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}

// ── Tests ────────────────────────────────────────────────────────────
