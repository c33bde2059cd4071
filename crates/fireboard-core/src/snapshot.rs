// ── Feed snapshot ──
//
// The (messages, resolved data) pair a UI renders from. Built once per
// successful refresh and swapped in whole; nothing mutates it afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use fireboard_api::{Data, Message};
use serde_json::Value;

/// Messages in node order plus every data blob that resolved, by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    pub messages: Vec<Arc<Message>>,
    pub data: HashMap<String, Arc<Data>>,
}

impl FeedSnapshot {
    pub fn new(messages: Vec<Message>, data: Vec<Data>) -> Self {
        Self {
            messages: messages.into_iter().map(Arc::new).collect(),
            data: data.into_iter().map(|d| (d.id.clone(), Arc::new(d))).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Look up each of `message`'s refs, in order. `None` marks a ref that
    /// did not resolve.
    pub fn resolve<'a>(&'a self, message: &Message) -> Vec<Option<&'a Data>> {
        message
            .data
            .iter()
            .map(|r| self.data.get(&r.id).map(Arc::as_ref))
            .collect()
    }

    /// Render-ready view of every message, in node order.
    pub fn items(&self) -> impl Iterator<Item = FeedItem<'_>> {
        self.messages.iter().map(|m| FeedItem {
            message: m,
            values: self.resolve(m),
        })
    }

    /// Distinct referenced ids with no resolved data, in first-seen order.
    pub fn unresolved_ids(&self) -> Vec<&str> {
        let mut missing: Vec<&str> = Vec::new();
        for r in self.messages.iter().flat_map(|m| m.data.iter()) {
            if !self.data.contains_key(&r.id) && !missing.contains(&r.id.as_str()) {
                missing.push(&r.id);
            }
        }
        missing
    }
}

// ── FeedItem ────────────────────────────────────────────────────────

/// One message joined with its resolved values.
#[derive(Debug, Clone)]
pub struct FeedItem<'a> {
    pub message: &'a Message,
    pub values: Vec<Option<&'a Data>>,
}

impl FeedItem<'_> {
    /// `"self"` for messages this node authored, otherwise the author.
    pub fn sender(&self) -> &str {
        if self.message.local {
            "self"
        } else {
            &self.message.header.author
        }
    }

    /// Compact JSON array of the values, `null` where a ref is unresolved.
    pub fn values_json(&self) -> String {
        let values: Vec<Option<&Value>> = self.values.iter().map(|d| d.map(|d| &d.value)).collect();
        serde_json::to_string(&values).unwrap_or_else(|_| String::from("[]"))
    }

    /// `From <sender>: <values>`
    pub fn line(&self) -> String {
        format!("From {}: {}", self.sender(), self.values_json())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn message(id: &str, author: &str, local: bool, refs: &[&str]) -> Message {
        serde_json::from_value(json!({
            "header": { "id": id, "author": author },
            "data": refs.iter().map(|r| json!({ "id": r })).collect::<Vec<_>>(),
            "local": local
        }))
        .unwrap()
    }

    fn data(id: &str, value: Value) -> Data {
        serde_json::from_value(json!({ "id": id, "value": value })).unwrap()
    }

    #[test]
    fn resolved_message_renders_author_and_values() {
        let snap = FeedSnapshot::new(
            vec![message("m1", "org1", false, &["d1"])],
            vec![data("d1", json!("hello"))],
        );
        let lines: Vec<String> = snap.items().map(|i| i.line()).collect();
        assert_eq!(lines, vec![r#"From org1: ["hello"]"#.to_string()]);
    }

    #[test]
    fn local_message_renders_as_self() {
        let snap = FeedSnapshot::new(
            vec![message("m1", "org1", true, &["d1"])],
            vec![data("d1", json!({ "n": 1 }))],
        );
        let item = snap.items().next().unwrap();
        assert_eq!(item.sender(), "self");
        assert_eq!(item.line(), r#"From self: [{"n":1}]"#);
    }

    #[test]
    fn unresolved_ref_renders_null_and_is_reported() {
        let snap = FeedSnapshot::new(
            vec![
                message("m1", "org1", false, &["d1", "d2"]),
                message("m2", "org2", false, &["d2"]),
            ],
            vec![data("d1", json!("hello"))],
        );
        let first = snap.items().next().unwrap();
        assert_eq!(first.line(), r#"From org1: ["hello",null]"#);
        assert!(first.values[1].is_none());
        assert_eq!(snap.unresolved_ids(), vec!["d2"]);
    }

    #[test]
    fn items_keep_node_order() {
        let snap = FeedSnapshot::new(
            vec![
                message("m2", "b", false, &[]),
                message("m1", "a", false, &[]),
            ],
            Vec::new(),
        );
        let ids: Vec<&str> = snap.items().map(|i| i.message.id()).collect();
        assert_eq!(ids, vec!["m2", "m1"]);
        assert_eq!(snap.items().next().unwrap().values_json(), "[]");
    }

    #[test]
    fn snapshots_compare_by_value() {
        let build = || {
            FeedSnapshot::new(
                vec![message("m1", "org1", false, &["d1"])],
                vec![data("d1", json!("hello"))],
            )
        };
        assert_eq!(build(), build());
        assert!(FeedSnapshot::default().is_empty());
    }
}
