#![forbid(unsafe_code)]

//! Bounded per-pane record of event dispatch outcomes, for JSONL traces.

use std::collections::VecDeque;

use serde::Serialize;

use crate::router::IgnoredReason;

/// Entries kept per pane before the oldest are dropped.
pub const EVENT_LOG_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum LogOutcome {
    Delivered,
    Ignored(IgnoredReason),
    /// Accepted by routing but dropped by a guard (duplicate or empty paste).
    Suppressed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaneLogEntry {
    pub topic: &'static str,
    pub at_ms: u64,
    #[serde(flatten)]
    pub outcome: LogOutcome,
}

#[derive(Debug, Clone)]
pub struct PaneEventLog {
    entries: VecDeque<PaneLogEntry>,
    capacity: usize,
}

impl Default for PaneEventLog {
    fn default() -> Self {
        Self::with_capacity(EVENT_LOG_CAPACITY)
    }
}

impl PaneEventLog {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, entry: PaneLogEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaneLogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&PaneLogEntry> {
        self.entries.back()
    }

    /// Count entries for `topic` with the given outcome.
    #[must_use]
    pub fn count(&self, topic: &str, outcome: LogOutcome) -> usize {
        self.entries
            .iter()
            .filter(|e| e.topic == topic && e.outcome == outcome)
            .count()
    }

    /// One JSON object per line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        Ok(out)
    }
}
