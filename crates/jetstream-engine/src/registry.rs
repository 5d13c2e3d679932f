//! Job registry — authoritative, internally synchronized job state.
//!
//! The registry owns the canonical `Job` records. Each entry also
//! carries the job's timer cancellation handle and a per-job
//! single-flight guard; mutations for different job ids are
//! independent, same-id dispatch is serialized through the guard.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

use crate::job::{Job, JobStatus, JobStatusReport, JobSummary, Totals};

struct JobEntry {
    job: Job,
    /// Cancels the pacing timer. Level-triggered: cancelling twice is
    /// a no-op, and cancelling a finished job's timer is safe.
    cancel: CancellationToken,
    /// At most one in-flight dispatch per job at any time.
    flight: Arc<AsyncMutex<()>>,
}

/// In-memory job registry. State lives for the process lifetime only.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, JobEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job and its timer handle. A duplicate id is a caller
    /// error; the last write wins.
    pub fn register(&self, job: Job, cancel: CancellationToken) {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.insert(
            job.id.clone(),
            JobEntry {
                job,
                cancel,
                flight: Arc::new(AsyncMutex::new(())),
            },
        );
    }

    /// Copy of the job's current state.
    pub fn snapshot(&self, job_id: &str) -> Option<Job> {
        let jobs = self.jobs.lock().unwrap();
        jobs.get(job_id).map(|e| e.job.clone())
    }

    /// The job's single-flight guard handle, for the dispatcher to
    /// try-lock around one tick.
    pub fn flight_handle(&self, job_id: &str) -> Option<Arc<AsyncMutex<()>>> {
        let jobs = self.jobs.lock().unwrap();
        jobs.get(job_id).map(|e| e.flight.clone())
    }

    /// Advance the record cursor by one. No-op once the job has left
    /// `Running`, so a tick that raced a stop cannot mutate counters
    /// after `stopped_at`.
    pub fn advance_index(&self, job_id: &str) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(entry) = jobs.get_mut(job_id)
            && entry.job.status == JobStatus::Running
            && entry.job.index < entry.job.total
        {
            entry.job.index += 1;
        }
    }

    /// Count one successful delivery. Running-guarded like
    /// [`advance_index`](Self::advance_index); keeps `sent <= index`.
    pub fn increment_sent(&self, job_id: &str) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(entry) = jobs.get_mut(job_id)
            && entry.job.status == JobStatus::Running
            && entry.job.sent < entry.job.index
        {
            entry.job.sent += 1;
        }
    }

    /// Record that a send failed for this job; returns `true` exactly
    /// once per job, for the first failure, so error pushes stay
    /// bounded.
    pub fn mark_first_error(&self, job_id: &str) -> bool {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.get_mut(job_id) {
            Some(entry) if !entry.job.first_error_notified => {
                entry.job.first_error_notified = true;
                true
            }
            _ => false,
        }
    }

    /// Transition `Running → Finished`. Returns the finished job only
    /// on an actual transition; repeated calls (or a finish racing a
    /// stop) are no-ops returning `None`.
    pub fn mark_finished(&self, job_id: &str) -> Option<Job> {
        let mut jobs = self.jobs.lock().unwrap();
        let entry = jobs.get_mut(job_id)?;
        if entry.job.status != JobStatus::Running {
            return None;
        }
        entry.job.status = JobStatus::Finished;
        entry.job.finished_at = Some(Utc::now());
        Some(entry.job.clone())
    }

    /// Cancel the job's timer without touching job state.
    pub fn cancel_timer(&self, job_id: &str) {
        let jobs = self.jobs.lock().unwrap();
        if let Some(entry) = jobs.get(job_id) {
            entry.cancel.cancel();
        }
    }

    /// Stop a job: cancel its timer first, then transition
    /// `Running → Stopped`. Stopping an already-terminal job only
    /// re-cancels the (already dead) timer. Returns the job, or `None`
    /// for an unknown id.
    pub fn stop(&self, job_id: &str) -> Option<Job> {
        let mut jobs = self.jobs.lock().unwrap();
        let entry = jobs.get_mut(job_id)?;
        entry.cancel.cancel();
        if entry.job.status == JobStatus::Running {
            entry.job.status = JobStatus::Stopped;
            entry.job.stopped_at = Some(Utc::now());
        }
        Some(entry.job.clone())
    }

    /// Remove a job, cancelling its timer. Returns the removed job, or
    /// `None` for an unknown id. Refusing deletion of a running job is
    /// boundary-layer policy, not enforced here.
    pub fn delete(&self, job_id: &str) -> Option<Job> {
        let mut jobs = self.jobs.lock().unwrap();
        let entry = jobs.remove(job_id)?;
        entry.cancel.cancel();
        Some(entry.job)
    }

    /// Snapshot of all jobs. Ordering is the caller's responsibility.
    pub fn list(&self) -> Vec<Job> {
        let jobs = self.jobs.lock().unwrap();
        jobs.values().map(|e| e.job.clone()).collect()
    }

    /// Listing summaries ordered by creation time.
    pub fn summaries_by_creation(&self) -> Vec<JobSummary> {
        let mut all: Vec<JobSummary> = self.list().iter().map(Job::summary).collect();
        all.sort_by_key(|s| s.created_at);
        all
    }

    /// Aggregate counts by status.
    pub fn totals(&self) -> Totals {
        let jobs = self.jobs.lock().unwrap();
        let mut totals = Totals {
            total: jobs.len(),
            ..Totals::default()
        };
        for entry in jobs.values() {
            match entry.job.status {
                JobStatus::Running => totals.running += 1,
                JobStatus::Finished => totals.finished += 1,
                JobStatus::Stopped => totals.stopped += 1,
            }
        }
        totals
    }

    /// Per-job projection for the twice-daily reports.
    pub fn status_per_job(&self) -> Vec<JobStatusReport> {
        let jobs = self.jobs.lock().unwrap();
        let mut reports: Vec<JobStatusReport> =
            jobs.values().map(|e| e.job.status_report()).collect();
        reports.sort_by_key(|r| r.created_at);
        reports
    }
}

/// Convenience for the dispatcher: try to take the single-flight guard.
pub fn try_flight(handle: Arc<AsyncMutex<()>>) -> Option<OwnedMutexGuard<()>> {
    handle.try_lock_owned().ok()
}
