//! Feed listing.

use chrono::{DateTime, Utc};
use fireboard_core::{BoardConfig, FeedController, FeedItem, FeedSnapshot};
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Serializable entry ──────────────────────────────────────────────

/// One feed line in machine-readable form.
#[derive(Debug, Serialize)]
pub struct FeedEntry {
    pub id: String,
    pub sender: String,
    pub author: String,
    pub local: bool,
    pub created: Option<DateTime<Utc>>,
    /// Resolved values in reference order; `null` where unresolved.
    pub values: Vec<Value>,
    pub line: String,
}

impl From<&FeedItem<'_>> for FeedEntry {
    fn from(item: &FeedItem<'_>) -> Self {
        Self {
            id: item.message.id().to_owned(),
            sender: item.sender().to_owned(),
            author: item.message.header.author.clone(),
            local: item.message.local,
            created: item.message.header.created,
            values: item
                .values
                .iter()
                .map(|d| d.map_or(Value::Null, |d| d.value.clone()))
                .collect(),
            line: item.line(),
        }
    }
}

pub fn entries(snapshot: &FeedSnapshot) -> Vec<FeedEntry> {
    snapshot.items().map(|item| FeedEntry::from(&item)).collect()
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct MessageRow {
    #[tabled(rename = "From")]
    sender: String,
    #[tabled(rename = "Values")]
    values: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl From<&FeedEntry> for MessageRow {
    fn from(e: &FeedEntry) -> Self {
        Self {
            sender: e.sender.clone(),
            values: serde_json::to_string(&e.values).unwrap_or_default(),
            created: e
                .created
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            id: e.id.clone(),
        }
    }
}

/// Render the feed in the selected output format.
pub fn render(snapshot: &FeedSnapshot, global: &GlobalOpts) -> String {
    let entries = entries(snapshot);
    output::render_list(global.output_format(), &entries, |e| MessageRow::from(e), |e| e.line.clone())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(config: BoardConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let node = config.node_url.clone();
    let snapshot = FeedController::oneshot(config, |ctrl| async move {
        ctrl.refresh().await?;
        Ok(ctrl.snapshot())
    })
    .await
    .map_err(|e| CliError::from_core(e, &node))?;

    let unresolved = snapshot.unresolved_ids();
    if !unresolved.is_empty() {
        tracing::info!(ids = ?unresolved, "some data could not be resolved");
    }

    output::print_output(&render(&snapshot, global), global.quiet);
    Ok(())
}
