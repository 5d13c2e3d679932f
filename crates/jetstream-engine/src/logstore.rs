//! Bounded in-memory operational log — append-only ring, queryable by
//! bundle and limit. Entries are mirrored to `tracing` so the console
//! stays useful alongside the API.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Retained entry cap; oldest entries are evicted first.
pub const MAX_LOGS: usize = 5000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

/// What happened, in the job lifecycle vocabulary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    JobStart,
    JobFinish,
    SendAttempt,
    SendSuccess,
    SendError,
}

impl LogKind {
    fn as_str(&self) -> &'static str {
        match self {
            LogKind::JobStart => "job_start",
            LogKind::JobFinish => "job_finish",
            LogKind::SendAttempt => "send_attempt",
            LogKind::SendSuccess => "send_success",
            LogKind::SendError => "send_error",
        }
    }
}

/// One observability record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub ts: DateTime<Utc>,
    pub level: LogLevel,
    #[serde(rename = "type")]
    pub kind: LogKind,
    #[serde(rename = "jobId")]
    pub job_id: String,
    pub bundle: String,
    pub message: String,
    pub meta: serde_json::Value,
}

/// Append-only bounded log sink. Safe under concurrent appends from
/// multiple jobs' dispatch callbacks.
pub struct LogStore {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl Default for LogStore {
    fn default() -> Self {
        Self::with_capacity(MAX_LOGS)
    }
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Stamp and append an entry, evicting from the front past
    /// capacity.
    pub fn append(
        &self,
        level: LogLevel,
        kind: LogKind,
        job_id: &str,
        bundle: &str,
        message: String,
        meta: serde_json::Value,
    ) {
        match level {
            LogLevel::Info => {
                tracing::info!(kind = kind.as_str(), job_id, bundle, "{message}")
            }
            LogLevel::Error => {
                tracing::error!(kind = kind.as_str(), job_id, bundle, "{message}")
            }
        }

        let entry = LogEntry {
            ts: Utc::now(),
            level,
            kind,
            job_id: job_id.to_string(),
            bundle: bundle.to_string(),
            message,
            meta,
        };

        let mut entries = self.entries.lock().unwrap();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Matching entries in oldest→newest order: exact bundle match if
    /// given, then the most recent `limit` if given.
    pub fn query(&self, bundle: Option<&str>, limit: Option<usize>) -> Vec<LogEntry> {
        let entries = self.entries.lock().unwrap();
        let matching: Vec<LogEntry> = entries
            .iter()
            .filter(|e| bundle.is_none_or(|b| e.bundle == b))
            .cloned()
            .collect();

        match limit {
            Some(n) if n < matching.len() => matching[matching.len() - n..].to_vec(),
            _ => matching,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(store: &LogStore, bundle: &str, message: &str) {
        store.append(
            LogLevel::Info,
            LogKind::SendAttempt,
            "job-1",
            bundle,
            message.to_string(),
            serde_json::json!({}),
        );
    }

    #[test]
    fn capacity_evicts_oldest_preserving_order() {
        let store = LogStore::with_capacity(5);
        for i in 0..8 {
            push(&store, "com.example.app", &format!("m{i}"));
        }
        assert_eq!(store.len(), 5);
        let got: Vec<String> = store
            .query(None, None)
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(got, vec!["m3", "m4", "m5", "m6", "m7"]);
    }

    #[test]
    fn bundle_filter_matches_exactly() {
        let store = LogStore::new();
        push(&store, "com.example.app", "a");
        push(&store, "com.example.app2", "b");
        push(&store, "com.example.app", "c");

        let got = store.query(Some("com.example.app"), None);
        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|e| e.bundle == "com.example.app"));
    }

    #[test]
    fn limit_returns_most_recent_in_order() {
        let store = LogStore::new();
        for i in 0..6 {
            push(&store, "com.example.app", &format!("m{i}"));
        }
        let got: Vec<String> = store
            .query(None, Some(2))
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(got, vec!["m4", "m5"]);

        // Limit larger than the store returns everything.
        assert_eq!(store.query(None, Some(100)).len(), 6);
    }

    #[test]
    fn entry_serializes_wire_field_names() {
        let store = LogStore::new();
        push(&store, "com.example.app", "m");
        let entry = &store.query(None, None)[0];
        let json = serde_json::to_value(entry).unwrap();
        assert_eq!(json["type"], "send_attempt");
        assert_eq!(json["level"], "info");
        assert!(json.get("jobId").is_some());
    }
}
