// ── Runtime board configuration ──
//
// Describes *which* node to talk to and how. Never touches disk: the CLI/TUI
// build a `BoardConfig` from their profile layer and hand it in.

use std::time::Duration;

use fireboard_api::websocket::{self, ReconnectConfig};
use fireboard_api::{TlsMode, TransportConfig};
use url::Url;

use crate::error::CoreError;

/// Default node root for a local development stack.
///
/// REST and the event stream share this host and port unless `events_url`
/// is set. Nodes that split them (REST on 5001, events on 5000) need an
/// explicit `events_url`.
pub const DEFAULT_NODE_URL: &str = "http://localhost:5000";

/// Default namespace.
pub const DEFAULT_NAMESPACE: &str = "default";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed development nodes).
    DangerAcceptInvalid,
}

/// Configuration for one board session against a single node.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Node root URL (e.g., `http://localhost:5000`).
    pub node_url: Url,
    /// Explicit event-stream endpoint. Derived from `node_url` when `None`.
    pub events_url: Option<Url>,
    /// Namespace all reads and broadcasts are scoped to.
    pub namespace: String,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Open the live-update stream on start.
    pub live_updates: bool,
    pub reconnect_initial_delay: Duration,
    pub reconnect_max_delay: Duration,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            node_url: Url::parse(DEFAULT_NODE_URL).expect("default node URL is valid"),
            events_url: None,
            namespace: DEFAULT_NAMESPACE.into(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            live_updates: true,
            reconnect_initial_delay: Duration::from_secs(1),
            reconnect_max_delay: Duration::from_secs(30),
        }
    }
}

impl BoardConfig {
    /// Config for `node_url` with every other field defaulted.
    pub fn for_node(node_url: Url) -> Self {
        Self {
            node_url,
            ..Self::default()
        }
    }

    /// Transport settings for the single HTTP client.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }

    /// Backoff settings for the live-update stream. Retries forever.
    pub fn reconnect(&self) -> ReconnectConfig {
        ReconnectConfig {
            initial_delay: self.reconnect_initial_delay,
            max_delay: self.reconnect_max_delay,
            max_retries: None,
        }
    }

    /// Full subscription URL, including the namespace and ack-mode query.
    pub fn subscription_url(&self) -> Result<Url, CoreError> {
        let endpoint = match &self.events_url {
            Some(url) => url.clone(),
            None => websocket::derive_endpoint(&self.node_url)?,
        };
        Ok(websocket::subscription_url(&endpoint, &self.namespace))
    }
}
