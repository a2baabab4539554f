//! Row-level change notifications fanned out to listing views and chat streams.

use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use utoipa::ToSchema;

/// Table a change event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Games,
    Profiles,
    GameMessages,
}

/// Kind of row mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Notification emitted after a successful write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub event: ChangeKind,
    pub table: Table,
    pub new_row: Option<Value>,
    pub old_row: Option<Value>,
}

impl ChangeEvent {
    /// Deserialize the new row (or the old one for deletions) into a typed entity.
    pub fn row<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        let row = self.new_row.as_ref().or(self.old_row.as_ref())?;
        serde_json::from_value(row.clone()).ok()
    }
}

/// Error raised when a `column=eq.value` filter cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid change filter `{0}`, expected `column=eq.value`")]
pub struct FilterParseError(String);

/// Equality filter over a row column, written `column=eq.value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFilter {
    column: String,
    value: String,
}

impl ChangeFilter {
    /// Filter rows whose `column` equals `value`.
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Self {
            column: column.into(),
            value: value.to_string(),
        }
    }

    /// Whether the new row (or, for deletions, the old row) satisfies the filter.
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        let Some(row) = event.new_row.as_ref().or(event.old_row.as_ref()) else {
            return false;
        };
        match row.get(&self.column) {
            Some(Value::String(value)) => *value == self.value,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == self.value,
        }
    }
}

impl FromStr for ChangeFilter {
    type Err = FilterParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (column, rest) = raw
            .split_once('=')
            .ok_or_else(|| FilterParseError(raw.into()))?;
        let value = rest
            .strip_prefix("eq.")
            .ok_or_else(|| FilterParseError(raw.into()))?;
        if column.is_empty() || value.is_empty() {
            return Err(FilterParseError(raw.into()));
        }
        Ok(Self::eq(column, value))
    }
}

/// Broadcast hub carrying every change event of the process.
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    /// Construct a new feed backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Listen to events on `table`, optionally narrowed by `filter`.
    pub fn subscribe(&self, table: Table, filter: Option<ChangeFilter>) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            table,
            filter,
        }
    }

    /// Publish a typed row change, ignoring delivery errors (no subscriber).
    pub fn publish<T: Serialize>(
        &self,
        event: ChangeKind,
        table: Table,
        new_row: Option<&T>,
        old_row: Option<&T>,
    ) {
        let (new_row, old_row) = match (new_row.map(to_row).transpose(), old_row.map(to_row).transpose()) {
            (Ok(new_row), Ok(old_row)) => (new_row, old_row),
            (Err(err), _) | (_, Err(err)) => {
                warn!(?table, ?event, error = %err, "failed to serialize change event row");
                return;
            }
        };

        let _ = self.sender.send(ChangeEvent {
            event,
            table,
            new_row,
            old_row,
        });
    }
}

fn to_row<T: Serialize>(row: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(row)
}

/// Live subscription; dropping it closes the channel.
pub struct Subscription {
    receiver: broadcast::Receiver<ChangeEvent>,
    table: Table,
    filter: Option<ChangeFilter>,
}

impl Subscription {
    /// Wait for the next matching event. Returns `None` once the feed is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(table = ?self.table, skipped, "change subscription lagged");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn accepts(&self, event: &ChangeEvent) -> bool {
        event.table == self.table
            && self
                .filter
                .as_ref()
                .is_none_or(|filter| filter.matches(event))
    }
}
