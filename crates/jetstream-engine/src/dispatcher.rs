//! Dispatcher — exactly one unit of work per tick for a given job.
//!
//! Failed records are skipped, never retried: a stalled record must
//! not block the pacing schedule. The failure is counted, logged, and
//! (once per job) notified.

use std::sync::Arc;

use chrono::Utc;
use jetstream_core::traits::{DeliveryTransport, Notifier};
use jetstream_core::types::EventPayload;

use crate::job::{Job, JobStatus};
use crate::logstore::{LogKind, LogLevel, LogStore};
use crate::messages;
use crate::registry::{self, JobRegistry};

/// Error body cap inside log sink meta.
const LOG_BODY_CAP: usize = 300;

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// One record was attempted (delivered or skipped on failure).
    Dispatched,
    /// The job reached a terminal state; the timer loop should end.
    Finished,
    /// The previous tick for this job is still in flight; nothing ran.
    Skipped,
    /// The job is gone (deleted mid-flight); the timer loop should end.
    Missing,
}

pub struct Dispatcher {
    registry: Arc<JobRegistry>,
    logs: Arc<LogStore>,
    transport: Arc<dyn DeliveryTransport>,
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<JobRegistry>,
        logs: Arc<LogStore>,
        transport: Arc<dyn DeliveryTransport>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            registry,
            logs,
            transport,
            notifier,
        }
    }

    /// Process one tick for `job_id`, under the job's single-flight
    /// guard. Never panics the timer loop; every failure path is
    /// logged and absorbed here.
    pub async fn tick(&self, job_id: &str) -> TickOutcome {
        let Some(handle) = self.registry.flight_handle(job_id) else {
            return TickOutcome::Missing;
        };
        let Some(_flight) = registry::try_flight(handle) else {
            return TickOutcome::Skipped;
        };
        let Some(job) = self.registry.snapshot(job_id) else {
            return TickOutcome::Missing;
        };

        if job.status != JobStatus::Running || job.index >= job.total {
            return self.finish(&job).await;
        }

        let position = job.index + 1;
        let Some(record) = job.records.get(job.index) else {
            // Cursor and batch disagree; keep the loop alive and leave
            // the cursor where it is.
            self.logs.append(
                LogLevel::Error,
                LogKind::SendError,
                &job.id,
                &job.bundle,
                format!("Unexpected error: record {position}/{} missing", job.total),
                serde_json::json!({}),
            );
            return TickOutcome::Dispatched;
        };

        let payload = EventPayload::from_record(record, Utc::now());

        self.logs.append(
            LogLevel::Info,
            LogKind::SendAttempt,
            &job.id,
            &job.bundle,
            format!("Attempt {position}/{} for bundle={}", job.total, job.bundle),
            serde_json::json!({
                "index": position,
                "total": job.total,
                "eventName": payload.event_name,
                "advertising_id": payload.advertising_id,
            }),
        );

        match self
            .transport
            .deliver(&job.bundle, &job.dev_key, &payload)
            .await
        {
            Ok(()) => {
                self.registry.advance_index(job_id);
                self.registry.increment_sent(job_id);
                self.logs.append(
                    LogLevel::Info,
                    LogKind::SendSuccess,
                    &job.id,
                    &job.bundle,
                    format!("Success {position}/{}", job.total),
                    serde_json::json!({
                        "index": position,
                        "total": job.total,
                        "eventName": payload.event_name,
                    }),
                );
            }
            Err(failure) => {
                // Skip the record and move on; pacing stays fixed.
                self.registry.advance_index(job_id);
                let truncated: String =
                    failure.message.chars().take(LOG_BODY_CAP).collect();
                self.logs.append(
                    LogLevel::Error,
                    LogKind::SendError,
                    &job.id,
                    &job.bundle,
                    format!("Error {position}/{}: {failure}", job.total),
                    serde_json::json!({
                        "index": position,
                        "total": job.total,
                        "status": failure.status,
                        "data": truncated,
                    }),
                );
                if self.registry.mark_first_error(job_id) {
                    let text = messages::send_error(&job, position, &failure);
                    if let Err(e) = self.notifier.notify(&text).await {
                        tracing::warn!("Error notification failed: {e}");
                    }
                }
            }
        }

        TickOutcome::Dispatched
    }

    /// Terminal transition: cancel the timer, mark finished (only from
    /// `Running`), log and notify on the actual transition.
    async fn finish(&self, job: &Job) -> TickOutcome {
        self.registry.cancel_timer(&job.id);
        if let Some(finished) = self.registry.mark_finished(&job.id) {
            self.logs.append(
                LogLevel::Info,
                LogKind::JobFinish,
                &finished.id,
                &finished.bundle,
                format!(
                    "Job finished for bundle={}, file={}, total={}",
                    finished.bundle, finished.file_name, finished.total
                ),
                serde_json::json!({ "total": finished.total }),
            );
            if let Err(e) = self.notifier.notify(&messages::job_finished(&finished)).await {
                tracing::warn!("Finish notification failed: {e}");
            }
        }
        TickOutcome::Finished
    }
}
