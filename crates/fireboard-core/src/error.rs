// ── Core error types ──
//
// Consumers see two failure classes: the node could not be reached (or
// refused the request), or it answered with something we could not read.
// `From<fireboard_api::Error>` does the classification.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Node request failed: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },

    #[error("Unexpected response from node: {message}")]
    Decode { message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// HTTP status, when the node answered with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<fireboard_api::Error> for CoreError {
    fn from(err: fireboard_api::Error) -> Self {
        match err {
            fireboard_api::Error::Deserialization { message, .. } => Self::Decode { message },
            fireboard_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("invalid URL: {e}"),
            },
            fireboard_api::Error::Tls(message) => Self::Config { message },
            other => Self::Transport {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialization_maps_to_decode() {
        let err: CoreError = fireboard_api::Error::Deserialization {
            message: "expected array".into(),
            body: "{}".into(),
        }
        .into();
        assert!(err.is_decode());
    }

    #[test]
    fn http_maps_to_transport_with_status() {
        let err: CoreError = fireboard_api::Error::Http {
            status: 503,
            message: "unavailable".into(),
        }
        .into();
        assert!(err.is_transport());
        assert_eq!(err.status(), Some(503));
    }
}
