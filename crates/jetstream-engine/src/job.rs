//! Job definitions — the core data model for paced dispatch runs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jetstream_core::types::EventRecord;
use serde::{Deserialize, Serialize};

/// Job lifecycle status. Transitions are one-way: `Running → Finished`
/// or `Running → Stopped`, never out of a terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Stopped,
    Finished,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Stopped => "stopped",
            JobStatus::Finished => "finished",
        }
    }
}

/// One paced batch-dispatch run over a fixed set of records.
#[derive(Debug, Clone)]
pub struct Job {
    /// Unique job ID, assigned at creation.
    pub id: String,
    /// Target app bundle id, forwarded to the delivery endpoint.
    pub bundle: String,
    /// Delivery credential; never logged in full.
    pub dev_key: String,
    /// The batch, set once at creation. Shared so snapshots stay cheap.
    pub records: Arc<Vec<EventRecord>>,
    /// Display label of the uploaded file.
    pub file_name: String,
    /// Record count; equals `records.len()`.
    pub total: usize,
    /// Pacing interval between ticks, in milliseconds.
    pub interval_ms: f64,
    /// Cursor into `records`; advanced on every attempt, success or not.
    pub index: usize,
    /// Records actually delivered. `sent <= index <= total` always.
    pub sent: usize,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub expected_end_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    /// Gates error-notification spam: only the first failed send per
    /// job produces a push.
    pub first_error_notified: bool,
}

impl Job {
    /// Build a fresh job from a batch spec, deriving the pacing
    /// interval so the whole batch spans `days` days.
    ///
    /// Precondition (enforced by the boundary layer): `total > 0` and
    /// `days > 0`.
    pub fn new(spec: JobSpec) -> Self {
        let total = spec.records.len();
        let total_seconds = spec.days * 86_400.0;
        let interval_ms = (total_seconds * 1000.0) / total as f64;
        let created_at = Utc::now();
        let expected_end_at = created_at
            + chrono::Duration::milliseconds((total_seconds * 1000.0) as i64);

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            bundle: spec.bundle,
            dev_key: spec.dev_key,
            records: Arc::new(spec.records),
            file_name: spec.file_name,
            total,
            interval_ms,
            index: 0,
            sent: 0,
            status: JobStatus::Running,
            created_at,
            expected_end_at,
            finished_at: None,
            stopped_at: None,
            first_error_notified: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != JobStatus::Running
    }

    /// Wire-facing summary, ordered-by-creation listing shape.
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            bundle: self.bundle.clone(),
            file_name: self.file_name.clone(),
            created_at: self.created_at,
            expected_end_at: self.expected_end_at,
            sent: self.sent,
            total: self.total,
            status: self.status,
        }
    }

    /// Per-job projection for the twice-daily reports.
    pub fn status_report(&self) -> JobStatusReport {
        JobStatusReport {
            id: self.id.clone(),
            bundle: self.bundle.clone(),
            file_name: self.file_name.clone(),
            status: self.status,
            sent: self.sent,
            total: self.total,
            created_at: self.created_at,
            expected_end_at: self.expected_end_at,
            finished_at: self.finished_at,
            stopped_at: self.stopped_at,
        }
    }
}

/// Input for starting a job: one uploaded batch plus pacing window.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub bundle: String,
    pub dev_key: String,
    pub days: f64,
    pub records: Vec<EventRecord>,
    pub file_name: String,
}

/// Returned to the caller when a job is armed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedJob {
    pub job_id: String,
    pub total: usize,
    pub interval_ms: f64,
}

/// Aggregate counts by status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Totals {
    pub total: usize,
    pub running: usize,
    pub finished: usize,
    pub stopped: usize,
}

/// Listing shape for the jobs API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: String,
    pub bundle: String,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub expected_end_at: DateTime<Utc>,
    pub sent: usize,
    pub total: usize,
    pub status: JobStatus,
}

/// Per-job projection for operational reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusReport {
    pub id: String,
    pub bundle: String,
    pub file_name: String,
    pub status: JobStatus,
    pub sent: usize,
    pub total: usize,
    pub created_at: DateTime<Utc>,
    pub expected_end_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use jetstream_core::types::EventRecord;

    fn records(n: usize) -> Vec<EventRecord> {
        (0..n)
            .map(|i| EventRecord {
                advertising_id: format!("ad-{i}"),
                appsflyer_id: format!("af-{i}"),
                android_id: None,
                country: "US".into(),
                user_ip: "10.0.0.1".into(),
                eventname: None,
                eventtime: None,
            })
            .collect()
    }

    fn spec(n: usize, days: f64) -> JobSpec {
        JobSpec {
            bundle: "com.example.app".into(),
            dev_key: "secret".into(),
            days,
            records: records(n),
            file_name: "batch.csv".into(),
        }
    }

    #[test]
    fn interval_is_window_over_total() {
        let job = Job::new(spec(100, 2.0));
        assert_eq!(job.interval_ms, 2.0 * 86_400.0 * 1000.0 / 100.0);
        assert_eq!(job.total, 100);
        assert_eq!(job.index, 0);
        assert_eq!(job.sent, 0);
        assert_eq!(job.status, JobStatus::Running);
    }

    #[test]
    fn fractional_days_produce_fractional_intervals() {
        let job = Job::new(spec(7, 0.5));
        assert_eq!(job.interval_ms, 0.5 * 86_400.0 * 1000.0 / 7.0);
    }

    #[test]
    fn expected_end_spans_the_window() {
        let job = Job::new(spec(10, 1.0));
        let window = job.expected_end_at - job.created_at;
        assert_eq!(window.num_seconds(), 86_400);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Running).unwrap(),
            "\"running\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Finished).unwrap(),
            "\"finished\""
        );
    }

    #[test]
    fn summary_uses_camel_case_keys() {
        let job = Job::new(spec(3, 1.0));
        let json = serde_json::to_value(job.summary()).unwrap();
        assert!(json.get("fileName").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("expectedEndAt").is_some());
    }
}
