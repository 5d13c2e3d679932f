//! Reporting scheduler — two independent long-period loops feeding the
//! notification channel: an 8-hour heartbeat and a twice-daily status
//! summary keyed to the local wall clock.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use jetstream_core::traits::Notifier;
use tokio::task::JoinHandle;

use crate::messages;
use crate::registry::JobRegistry;

const HEARTBEAT_PERIOD: Duration = Duration::from_secs(8 * 60 * 60);
const STATUS_POLL_PERIOD: Duration = Duration::from_secs(60);

/// Per-slot dedup for the twice-daily report. Each slot tracks the
/// last calendar date it fired on independently, so a missed morning
/// report never suppresses the evening one.
#[derive(Debug, Default)]
pub struct StatusSlots {
    morning_sent: Option<NaiveDate>,
    evening_sent: Option<NaiveDate>,
}

impl StatusSlots {
    /// Which slots fire at `now`. Minute-exact match, at most once per
    /// slot per date; a second poll inside the same minute is a no-op.
    pub fn due(&mut self, now: NaiveDateTime) -> Vec<&'static str> {
        let date = now.date();
        let mut fired = Vec::new();

        if now.hour() == 9 && now.minute() == 0 && self.morning_sent != Some(date) {
            self.morning_sent = Some(date);
            fired.push("09:00");
        }
        if now.hour() == 18 && now.minute() == 0 && self.evening_sent != Some(date) {
            self.evening_sent = Some(date);
            fired.push("18:00");
        }

        fired
    }
}

/// Heartbeat loop: uptime + totals every 8 hours. Failures are logged
/// and swallowed; nothing here can take the loop down.
pub fn spawn_heartbeat(
    registry: Arc<JobRegistry>,
    notifier: Arc<dyn Notifier>,
    started_at: Instant,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(HEARTBEAT_PERIOD);
        // Skip the immediate firing; the first heartbeat comes after
        // one full period.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let totals = registry.totals();
            let text = messages::heartbeat(started_at.elapsed(), &totals);
            if let Err(e) = notifier.notify(&text).await {
                tracing::warn!("Heartbeat notification failed: {e}");
            }
        }
    })
}

/// Twice-daily status loop: polls the local wall clock every minute
/// and reports per-job status at 09:00 and 18:00.
pub fn spawn_daily_status(
    registry: Arc<JobRegistry>,
    notifier: Arc<dyn Notifier>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut slots = StatusSlots::default();
        let mut ticker = tokio::time::interval(STATUS_POLL_PERIOD);
        loop {
            ticker.tick().await;
            let now = chrono::Local::now().naive_local();
            for slot in slots.due(now) {
                let reports = registry.status_per_job();
                if let Some(text) = messages::status_report(slot, &reports) {
                    if let Err(e) = notifier.notify(&text).await {
                        tracing::warn!("Status report ({slot}) failed: {e}");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(date: (i32, u32, u32), hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn fires_each_slot_once_per_date() {
        let mut slots = StatusSlots::default();
        let day = (2026, 3, 5);

        // A minute-long match window polled several times.
        assert_eq!(slots.due(at(day, 9, 0)), vec!["09:00"]);
        assert!(slots.due(at(day, 9, 0)).is_empty());
        assert!(slots.due(at(day, 9, 1)).is_empty());

        assert_eq!(slots.due(at(day, 18, 0)), vec!["18:00"]);
        assert!(slots.due(at(day, 18, 0)).is_empty());
    }

    #[test]
    fn slots_are_tracked_independently() {
        let mut slots = StatusSlots::default();
        // Morning never fires (process was down); evening still does.
        assert_eq!(slots.due(at((2026, 3, 5), 18, 0)), vec!["18:00"]);
        // Next morning fires normally.
        assert_eq!(slots.due(at((2026, 3, 6), 9, 0)), vec!["09:00"]);
        // And the new date re-arms the evening slot.
        assert_eq!(slots.due(at((2026, 3, 6), 18, 0)), vec!["18:00"]);
    }

    #[test]
    fn off_slot_minutes_never_fire() {
        let mut slots = StatusSlots::default();
        let day = (2026, 3, 5);
        assert!(slots.due(at(day, 8, 59)).is_empty());
        assert!(slots.due(at(day, 9, 1)).is_empty());
        assert!(slots.due(at(day, 17, 59)).is_empty());
        assert!(slots.due(at(day, 0, 0)).is_empty());
    }
}
