// src/queue/trigger.rs

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static TRIGGER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^trigger_(\d+)\.json$").expect("trigger name pattern is valid")
});

/// One trigger file, identified by the epoch-millis id in its name.
///
/// Ordering is by `id` first, so sorting a batch gives arrival order even
/// when ids differ in length.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Trigger {
    id: u64,
    name: String,
}

impl Trigger {
    /// Recognise `trigger_<digits>.json`; anything else (temp files, `.bad`
    /// markers, the status/log files) is not a trigger.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let caps = TRIGGER_NAME.captures(name)?;
        let id = caps.get(1)?.as_str().parse().ok()?;
        Some(Self {
            id,
            name: name.to_string(),
        })
    }

    /// True for `trigger_<digits>.json` even when the id does not fit a
    /// `u64`, so callers can report names that look like triggers but can
    /// never be processed.
    pub fn has_trigger_shape(name: &str) -> bool {
        TRIGGER_NAME.is_match(name)
    }

    pub fn from_id(id: u64) -> Self {
        Self {
            id,
            name: format!("trigger_{id}.json"),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Parsed trigger body: `{ "receivedAt": ..., "payload": { ... } }`.
///
/// Only the JSON syntax is mandatory; missing fields degrade to `None` so an
/// unusual webhook payload still deploys.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerDocument {
    pub received_at: Option<String>,
    pub payload: Value,
}

impl TriggerDocument {
    /// Parse raw file bytes; invalid UTF-8 is a parse error like any other.
    pub fn parse(raw: impl AsRef<[u8]>) -> Result<Self, serde_json::Error> {
        let mut doc: Value = serde_json::from_slice(raw.as_ref())?;
        let received_at = doc
            .get("receivedAt")
            .and_then(Value::as_str)
            .map(str::to_string);
        let payload = doc.get_mut("payload").map(Value::take).unwrap_or(Value::Null);
        Ok(Self {
            received_at,
            payload,
        })
    }

    /// `payload.repository.full_name`, the repository that caused the push.
    pub fn repository(&self) -> Option<&str> {
        self.payload
            .pointer("/repository/full_name")
            .and_then(Value::as_str)
    }
}
