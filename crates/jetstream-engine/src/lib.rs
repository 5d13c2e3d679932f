//! # JetStream Engine
//!
//! The job scheduling & dispatch engine: converts a batch size and a
//! target duration into a fixed per-record send interval, drives one
//! recurring dispatch tick per job, keeps authoritative job state under
//! concurrent ticks and external stop/delete, and runs the two global
//! reporting timers.
//!
//! ## Architecture
//! ```text
//! Pacer (one tokio interval loop per job)
//!   └── each tick → Dispatcher
//!         ├── reads/writes JobRegistry (single-flight per job)
//!         ├── appends to LogStore (bounded ring, 5000 entries)
//!         ├── DeliveryTransport::deliver (15s bound, skip on failure)
//!         └── Notifier (job lifecycle + first error per job)
//!
//! Reporting (global, independent of jobs)
//!   ├── heartbeat every 8h → uptime + totals
//!   └── 60s wall-clock poll → per-job status at 09:00 / 18:00
//! ```

pub mod dispatcher;
pub mod job;
pub mod logstore;
pub mod messages;
pub mod pacer;
pub mod registry;
pub mod reporting;

pub use dispatcher::{Dispatcher, TickOutcome};
pub use job::{Job, JobSpec, JobStatus, JobStatusReport, JobSummary, StartedJob, Totals};
pub use logstore::{LogEntry, LogKind, LogLevel, LogStore, MAX_LOGS};
pub use pacer::Pacer;
pub use registry::JobRegistry;
pub use reporting::StatusSlots;
