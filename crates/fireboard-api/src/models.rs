// Node API wire types
//
// Models for the data-exchange node's JSON API. Fields use `#[serde(default)]`
// liberally because node versions disagree about which fields are present;
// anything not modelled explicitly lands in `extra` so nothing is dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Message ──────────────────────────────────────────────────────────

/// A message as listed by `GET messages`.
///
/// Immutable once received. `local` marks messages authored by this node
/// and is a display hint only, not part of the message identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub header: MessageHeader,
    /// Ordered references to the data blobs carried by this message.
    #[serde(default)]
    pub data: Vec<DataRef>,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub batch: Option<String>,
    /// Delivery state reported by the node, e.g. `"confirmed"`.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub confirmed: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    /// Stable message identifier.
    pub fn id(&self) -> &str {
        &self.header.id
    }
}

/// Message header: identity, authorship, and routing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageHeader {
    pub id: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    /// Message type, e.g. `"broadcast"` or `"private"`.
    #[serde(default, rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Data ─────────────────────────────────────────────────────────────

/// Pointer to a data blob embedded in a [`Message`]. Carries no value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataRef {
    pub id: String,
    #[serde(default)]
    pub hash: Option<String>,
}

impl DataRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            hash: None,
        }
    }
}

/// A resolved data payload, as returned by `GET data/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data {
    pub id: String,
    /// Arbitrary structured content. `Null` when the node omits it.
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub validator: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Broadcast ────────────────────────────────────────────────────────

/// One value to attach to a broadcast message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataInput {
    pub value: serde_json::Value,
}

impl DataInput {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: serde_json::Value::String(value.into()),
        }
    }
}

/// Body of `POST broadcast/message`.
///
/// ```json
/// { "data": [ { "value": "hello" } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub data: Vec<DataInput>,
}

// ── Status ───────────────────────────────────────────────────────────

/// Node identity from `GET /api/v1/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeStatus {
    #[serde(default)]
    pub node: NodeIdentity,
    #[serde(default)]
    pub org: OrgIdentity,
    #[serde(default)]
    pub defaults: NodeDefaults,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeIdentity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub registered: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrgIdentity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub registered: bool,
    #[serde(default)]
    pub identity: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeDefaults {
    #[serde(default)]
    pub namespace: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_message_decodes() {
        let msg: Message = serde_json::from_value(json!({
            "header": { "id": "m1", "author": "org1" },
            "data": [{ "id": "d1" }],
            "local": false
        }))
        .unwrap();

        assert_eq!(msg.id(), "m1");
        assert_eq!(msg.header.author, "org1");
        assert_eq!(msg.data, vec![DataRef::new("d1")]);
        assert!(!msg.local);
        assert!(msg.header.created.is_none());
    }

    #[test]
    fn full_message_keeps_unknown_fields() {
        let msg: Message = serde_json::from_value(json!({
            "header": {
                "id": "4ea27cce-a103-4187-b318-f7b20fd87bf3",
                "type": "broadcast",
                "txtype": "batch_pin",
                "author": "0x1d5b5f3ab0a8ac2c4a0e58e4c1e8c1c2e27b1e6e",
                "created": "2021-07-01T18:06:23.214Z",
                "namespace": "default",
                "topics": ["default"],
                "datahash": "b2f5"
            },
            "hash": "3f8a",
            "batch": "b1",
            "state": "confirmed",
            "data": [{ "id": "d1", "hash": "aa11" }, { "id": "d2" }],
            "local": true,
            "pins": ["p1"]
        }))
        .unwrap();

        assert_eq!(msg.header.msg_type, "broadcast");
        assert_eq!(msg.header.topics, vec!["default".to_string()]);
        assert_eq!(msg.header.extra["txtype"], "batch_pin");
        assert_eq!(msg.data[0].hash.as_deref(), Some("aa11"));
        assert_eq!(msg.state.as_deref(), Some("confirmed"));
        assert_eq!(msg.extra["pins"], json!(["p1"]));
        assert!(msg.local);
        assert!(msg.header.created.is_some());
    }

    #[test]
    fn message_without_header_id_is_rejected() {
        let res = serde_json::from_value::<Message>(json!({ "header": { "author": "org1" } }));
        assert!(res.is_err());
    }

    #[test]
    fn data_value_may_be_structured_or_missing() {
        let structured: Data =
            serde_json::from_value(json!({ "id": "d1", "value": { "a": [1, 2] } })).unwrap();
        assert_eq!(structured.value, json!({ "a": [1, 2] }));

        let missing: Data = serde_json::from_value(json!({ "id": "d2" })).unwrap();
        assert!(missing.value.is_null());
    }

    #[test]
    fn broadcast_request_wire_shape() {
        let body = BroadcastRequest {
            data: vec![DataInput::text("ping")],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "data": [{ "value": "ping" }] })
        );
    }
}
