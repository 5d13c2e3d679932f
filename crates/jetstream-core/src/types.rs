//! Record and wire payload types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ingested batch row.
///
/// Rows come from a CSV with a header line; unknown extra columns are
/// ignored. Empty optional cells deserialize as `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    pub advertising_id: String,
    pub appsflyer_id: String,
    #[serde(default)]
    pub android_id: Option<String>,
    pub country: String,
    pub user_ip: String,
    #[serde(default)]
    pub eventname: Option<String>,
    #[serde(default)]
    pub eventtime: Option<String>,
}

/// Outbound in-app-event payload, shaped for the AppsFlyer S2S API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventPayload {
    pub appsflyer_id: String,
    pub advertising_id: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android_id: Option<String>,
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(rename = "eventTime")]
    pub event_time: String,
    /// JSON-encoded string, as the API expects: `{"af_revenue":"70",...}`.
    #[serde(rename = "eventValue")]
    pub event_value: String,
    pub ip: String,
}

impl EventPayload {
    /// Build the outbound payload for one record.
    ///
    /// Missing event name defaults to `"confirmed"`; missing event time
    /// defaults to `now` in `YYYY-MM-DD HH:mm:ss.SSS` form.
    pub fn from_record(record: &EventRecord, now: DateTime<Utc>) -> Self {
        Self {
            appsflyer_id: record.appsflyer_id.clone(),
            advertising_id: record.advertising_id.clone(),
            country: record.country.clone(),
            android_id: record.android_id.clone(),
            event_name: record
                .eventname
                .clone()
                .unwrap_or_else(|| "confirmed".into()),
            event_time: record
                .eventtime
                .clone()
                .unwrap_or_else(|| format_event_time(now)),
            event_value: serde_json::json!({
                "af_revenue": "70",
                "af_currency": "USD",
            })
            .to_string(),
            ip: record.user_ip.clone(),
        }
    }
}

/// Format a timestamp as `YYYY-MM-DD HH:mm:ss.SSS`.
pub fn format_event_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// A failed delivery attempt, as reported by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryFailure {
    /// HTTP status if the endpoint answered, `None` for network errors
    /// and timeouts.
    pub status: Option<u16>,
    /// Response body or error text.
    pub message: String,
}

impl std::fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(code) => write!(f, "status={} msg={}", code, self.message),
            None => write!(f, "status=n/a msg={}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> EventRecord {
        EventRecord {
            advertising_id: "ad-1".into(),
            appsflyer_id: "af-1".into(),
            android_id: None,
            country: "US".into(),
            user_ip: "10.0.0.1".into(),
            eventname: None,
            eventtime: None,
        }
    }

    #[test]
    fn payload_defaults_event_name_and_time() {
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 12, 30, 45).unwrap();
        let payload = EventPayload::from_record(&record(), now);
        assert_eq!(payload.event_name, "confirmed");
        assert_eq!(payload.event_time, "2026-03-05 12:30:45.000");
        assert_eq!(payload.ip, "10.0.0.1");
    }

    #[test]
    fn payload_keeps_explicit_event_fields() {
        let mut rec = record();
        rec.eventname = Some("purchase".into());
        rec.eventtime = Some("2026-01-01 00:00:00.000".into());
        let payload = EventPayload::from_record(&rec, Utc::now());
        assert_eq!(payload.event_name, "purchase");
        assert_eq!(payload.event_time, "2026-01-01 00:00:00.000");
    }

    #[test]
    fn payload_serializes_api_field_names() {
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap();
        let json = serde_json::to_value(EventPayload::from_record(&record(), now)).unwrap();
        assert!(json.get("eventName").is_some());
        assert!(json.get("eventTime").is_some());
        assert!(json.get("eventValue").is_some());
        // Absent android_id is omitted, not null.
        assert!(json.get("android_id").is_none());
        let value: serde_json::Value =
            serde_json::from_str(json["eventValue"].as_str().unwrap()).unwrap();
        assert_eq!(value["af_revenue"], "70");
        assert_eq!(value["af_currency"], "USD");
    }

    #[test]
    fn delivery_failure_display() {
        let with_status = DeliveryFailure {
            status: Some(401),
            message: "bad key".into(),
        };
        assert_eq!(with_status.to_string(), "status=401 msg=bad key");
        let without = DeliveryFailure {
            status: None,
            message: "timeout".into(),
        };
        assert_eq!(without.to_string(), "status=n/a msg=timeout");
    }
}
