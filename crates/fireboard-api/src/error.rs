use thiserror::Error;

/// Top-level error type for the `fireboard-api` crate.
///
/// Covers every failure mode of the node's HTTP API and the live-update
/// WebSocket. `fireboard-core` folds these into two user-facing classes:
/// transport failures and decode failures.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The node answered with a non-2xx status.
    #[error("Node returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed unexpectedly.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` for network/HTTP-layer failures, including non-2xx answers.
    pub fn is_transport(&self) -> bool {
        !self.is_decode()
    }

    /// Returns `true` if the response arrived but did not match the expected shape.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Deserialization { .. })
    }

    /// The HTTP status the node answered with, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
