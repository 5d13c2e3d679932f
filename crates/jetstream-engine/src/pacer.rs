//! Pacer — translates a batch + duration into a recurring per-job
//! schedule and owns the timer lifecycle.

use std::sync::Arc;
use std::time::Duration;

use jetstream_core::traits::Notifier;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::dispatcher::{Dispatcher, TickOutcome};
use crate::job::{Job, JobSpec, StartedJob};
use crate::logstore::{LogKind, LogLevel, LogStore};
use crate::messages;
use crate::registry::JobRegistry;

pub struct Pacer {
    registry: Arc<JobRegistry>,
    logs: Arc<LogStore>,
    dispatcher: Arc<Dispatcher>,
    notifier: Arc<dyn Notifier>,
}

impl Pacer {
    pub fn new(
        registry: Arc<JobRegistry>,
        logs: Arc<LogStore>,
        dispatcher: Arc<Dispatcher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            registry,
            logs,
            dispatcher,
            notifier,
        }
    }

    /// Register the job, emit the start log/notification, and arm its
    /// recurring timer. The first record goes out one interval after
    /// start, not immediately.
    ///
    /// Precondition (boundary-enforced): `records` is non-empty and
    /// `days > 0`, so the derived interval is finite and positive.
    pub fn start(&self, spec: JobSpec) -> StartedJob {
        let days = spec.days;
        let job = Job::new(spec);
        let cancel = CancellationToken::new();
        let started = StartedJob {
            job_id: job.id.clone(),
            total: job.total,
            interval_ms: job.interval_ms,
        };

        self.registry.register(job.clone(), cancel.clone());

        self.logs.append(
            LogLevel::Info,
            LogKind::JobStart,
            &job.id,
            &job.bundle,
            format!(
                "Job started for bundle={}, file={}, total={}, days={}, interval={:.2}s",
                job.bundle,
                job.file_name,
                job.total,
                days,
                job.interval_ms / 1000.0,
            ),
            serde_json::json!({
                "fileName": job.file_name,
                "total": job.total,
                "days": days,
                "intervalSec": job.interval_ms / 1000.0,
            }),
        );

        let notifier = self.notifier.clone();
        let text = messages::job_started(&job, days);
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&text).await {
                tracing::warn!("Start notification failed: {e}");
            }
        });

        let dispatcher = self.dispatcher.clone();
        let job_id = job.id.clone();
        let interval_ms = job.interval_ms;
        tokio::spawn(async move {
            run_job_timer(dispatcher, job_id, interval_ms, cancel).await;
        });

        started
    }
}

/// The per-job timer loop. Ends on cancellation (stop/delete) or when
/// the dispatcher reports a terminal outcome. The task receives the
/// job id only; all state lives in the registry.
async fn run_job_timer(
    dispatcher: Arc<Dispatcher>,
    job_id: String,
    interval_ms: f64,
    cancel: CancellationToken,
) {
    let period = Duration::from_secs_f64(interval_ms / 1000.0);
    let mut ticker = tokio::time::interval(period);
    // Ticks slower than the schedule (a 15s delivery against a 2s
    // interval) skip forward instead of bursting.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // interval() fires immediately; swallow that so the first record
    // waits one full period.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match dispatcher.tick(&job_id).await {
                    TickOutcome::Finished | TickOutcome::Missing => break,
                    TickOutcome::Dispatched | TickOutcome::Skipped => {}
                }
            }
        }
    }
}
