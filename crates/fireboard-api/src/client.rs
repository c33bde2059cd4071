// Hand-written async HTTP client for the data-exchange node REST API.
//
// Base path: {node}/api/v1/
// Namespaced resources live under /api/v1/namespaces/{namespace}/.

use futures_util::future::join_all;
use indexmap::IndexSet;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::models::{BroadcastRequest, Data, DataInput, DataRef, Message, NodeStatus};
use crate::transport::TransportConfig;

// ── Error response shape from the node ───────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Typed facade over the node's message, data, and broadcast endpoints.
///
/// Stateless apart from the pooled `reqwest::Client`; construct once and
/// share. No call is retried here -- a failed request is reported upward.
#[derive(Debug, Clone)]
pub struct ExchangeClient {
    http: reqwest::Client,
    base_url: Url,
    namespace: String,
}

impl ExchangeClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `node_url` scoped to `namespace`.
    pub fn new(
        node_url: &Url,
        namespace: impl Into<String>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(node_url, namespace, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(
        node_url: &Url,
        namespace: impl Into<String>,
        http: reqwest::Client,
    ) -> Result<Self, Error> {
        if node_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        Ok(Self {
            http,
            base_url: node_url.clone(),
            namespace: namespace.into(),
        })
    }

    /// The namespace every message/data call is scoped to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The node root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/api/v1/{segments..}` with each segment percent-encoded.
    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in the constructor: the base URL can always take segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v1"]).extend(segments);
        }
        url
    }

    /// `{base}/api/v1/namespaces/{ns}/{segments..}`
    fn namespace_url(&self, segments: &[&str]) -> Url {
        let mut all = vec!["namespaces", self.namespace.as_str()];
        all.extend_from_slice(segments);
        self.api_url(&all)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// List messages in node order.
    ///
    /// `GET /api/v1/namespaces/{ns}/messages`
    pub async fn list_messages(&self) -> Result<Vec<Message>, Error> {
        let url = self.namespace_url(&["messages"]);
        self.get(url).await
    }

    /// Fetch a single data blob.
    ///
    /// `GET /api/v1/namespaces/{ns}/data/{id}`
    pub async fn get_data(&self, id: &str) -> Result<Data, Error> {
        let url = self.namespace_url(&["data", id]);
        self.get(url).await
    }

    /// Resolve the data referenced by `refs`, best-effort.
    ///
    /// Each distinct id is requested once, concurrently. Ids the node
    /// answers with a non-2xx status are left out of the result; entries
    /// for ids that were not requested are ignored. Network failures and
    /// undecodable bodies fail the whole call. Results follow the
    /// first-seen order of `refs`.
    pub async fn fetch_data(&self, refs: &[DataRef]) -> Result<Vec<Data>, Error> {
        let ids: IndexSet<&str> = refs.iter().map(|r| r.id.as_str()).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = ids.len(), "resolving data refs");
        let results = join_all(ids.iter().map(|id| self.get_data(id))).await;

        let mut resolved = Vec::with_capacity(ids.len());
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(data) if data.id == *id => resolved.push(data),
                Ok(data) => {
                    debug!(requested = id, returned = %data.id, "ignoring unrequested data entry");
                }
                Err(Error::Http { status, message }) => {
                    debug!(id, status, %message, "data unavailable, leaving unresolved");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(resolved)
    }

    /// Broadcast `values` to every member of the namespace.
    ///
    /// `POST /api/v1/namespaces/{ns}/broadcast/message`
    ///
    /// Returns the accepted message when the node echoes one back in a
    /// recognizable shape. Only a failed request is an error.
    pub async fn send_broadcast(&self, values: &[DataInput]) -> Result<Option<Message>, Error> {
        let url = self.namespace_url(&["broadcast", "message"]);
        let body = BroadcastRequest {
            data: values.to_vec(),
        };
        let raw = self.post_raw(url, &body).await?;

        if raw.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<Message>(&raw) {
            Ok(msg) => Ok(Some(msg)),
            Err(e) => {
                warn!(error = %e, "broadcast accepted but response was not a message");
                Ok(None)
            }
        }
    }

    /// Node identity and defaults.
    ///
    /// `GET /api/v1/status`
    pub async fn node_status(&self) -> Result<NodeStatus, Error> {
        let url = self.api_url(&["status"]);
        self.get(url).await
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn post_raw<B: Serialize + Sync>(&self, url: Url, body: &B) -> Result<String, Error> {
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp.text().await?)
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|err| err.error.or(err.message))
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            });

        Error::Http {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str, ns: &str) -> ExchangeClient {
        let url = Url::parse(base).unwrap();
        ExchangeClient::from_reqwest(&url, ns, reqwest::Client::new()).unwrap()
    }

    #[test]
    fn namespace_urls() {
        let c = client("http://localhost:5000", "default");
        assert_eq!(
            c.namespace_url(&["messages"]).as_str(),
            "http://localhost:5000/api/v1/namespaces/default/messages"
        );
        assert_eq!(
            c.namespace_url(&["broadcast", "message"]).as_str(),
            "http://localhost:5000/api/v1/namespaces/default/broadcast/message"
        );
    }

    #[test]
    fn base_path_is_preserved() {
        let c = client("https://gateway.example.com/node1/", "ns1");
        assert_eq!(
            c.namespace_url(&["data", "d1"]).as_str(),
            "https://gateway.example.com/node1/api/v1/namespaces/ns1/data/d1"
        );
        assert_eq!(
            c.api_url(&["status"]).as_str(),
            "https://gateway.example.com/node1/api/v1/status"
        );
    }

    #[test]
    fn segments_are_percent_encoded() {
        let c = client("http://localhost:5000", "team a");
        assert_eq!(
            c.namespace_url(&["data", "x/y"]).as_str(),
            "http://localhost:5000/api/v1/namespaces/team%20a/data/x%2Fy"
        );
    }

    #[test]
    fn cannot_be_a_base_url_is_rejected() {
        let url = Url::parse("mailto:ops@example.com").unwrap();
        let res = ExchangeClient::from_reqwest(&url, "default", reqwest::Client::new());
        assert!(matches!(res, Err(Error::InvalidUrl(_))));
    }
}
