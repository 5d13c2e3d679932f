//! Notification message templates — Telegram Markdown texts for job
//! lifecycle events and the periodic reports.

use std::time::Duration;

use jetstream_core::types::DeliveryFailure;

use crate::job::{Job, JobStatusReport, Totals};

/// Error body cap inside notification texts.
const NOTIFY_BODY_CAP: usize = 400;

pub fn server_started(port: u16) -> String {
    format!("✅ *JetStream server started*\nPort: `{port}`")
}

pub fn job_started(job: &Job, days: f64) -> String {
    format!(
        "▶️ *Sharing started*\n\
         Bundle: `{}`\n\
         File: `{}`\n\
         Records: *{}*\n\
         Days: *{}*\n\
         Interval: ~*{:.2}s*\n\
         Expected end: `{}`\n\
         Job ID: `{}`",
        job.bundle,
        job.file_name,
        job.total,
        days,
        job.interval_ms / 1000.0,
        job.expected_end_at.to_rfc3339(),
        job.id,
    )
}

pub fn job_finished(job: &Job) -> String {
    format!(
        "✅ *Sharing finished*\n\
         Bundle: `{}`\n\
         File: `{}`\n\
         Sent: *{}* / *{}*\n\
         Job ID: `{}`",
        job.bundle, job.file_name, job.sent, job.total, job.id,
    )
}

/// First-failure-per-job push; the body is capped so one giant error
/// response cannot blow the message past Telegram limits.
pub fn send_error(job: &Job, position: usize, failure: &DeliveryFailure) -> String {
    let status = failure
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "n/a".into());
    let body: String = failure.message.chars().take(NOTIFY_BODY_CAP).collect();
    format!(
        "❌ *AppsFlyer error*\n\
         Bundle: `{}`\n\
         File: `{}`\n\
         Job ID: `{}`\n\
         Record: *{}* / *{}*\n\
         Status: *{}*\n\
         Message:\n```{}```",
        job.bundle, job.file_name, job.id, position, job.total, status, body,
    )
}

pub fn heartbeat(uptime: Duration, totals: &Totals) -> String {
    let hours = uptime.as_secs() / 3600;
    let minutes = (uptime.as_secs() % 3600) / 60;
    format!(
        "🟢 *JetStream heartbeat*\n\
         Uptime: *{hours}h {minutes}m*\n\
         Jobs: *{}* (running {}, finished {}, stopped {})",
        totals.total, totals.running, totals.finished, totals.stopped,
    )
}

/// Twice-daily status text; `None` when there is nothing to report.
pub fn status_report(slot: &str, reports: &[JobStatusReport]) -> Option<String> {
    if reports.is_empty() {
        return None;
    }
    let lines: Vec<String> = reports
        .iter()
        .map(|r| {
            format!(
                "• `{}` {}: {}/{} ({})",
                r.bundle,
                r.file_name,
                r.sent,
                r.total,
                r.status.as_str(),
            )
        })
        .collect();
    Some(format!(
        "📊 *JetStream status report ({slot})*\n{}",
        lines.join("\n")
    ))
}
