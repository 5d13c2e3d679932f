//! Batch ingestion — uploaded CSV to an ordered sequence of typed
//! rows. The engine never sees raw CSV.

use jetstream_core::error::{JetStreamError, Result};
use jetstream_core::types::EventRecord;

/// Parse a CSV upload (header row required, fields trimmed) into
/// records. Unknown extra columns are ignored; empty optional cells
/// become `None`.
pub fn parse_records(data: &[u8]) -> Result<Vec<EventRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: EventRecord =
            row.map_err(|e| JetStreamError::Ingest(format!("CSV parse error: {e}")))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_in_order_with_extras_ignored() {
        let csv = "\
advertising_id,appsflyer_id,android_id,country,user_ip,eventname,eventtime,rn
ad-1,af-1,,US, 10.0.0.1 ,,,1
ad-2,af-2,droid-2,DE,10.0.0.2,purchase,2026-01-01 00:00:00.000,2
";
        let records = parse_records(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].advertising_id, "ad-1");
        assert_eq!(records[0].android_id, None);
        assert_eq!(records[0].eventname, None);
        // Whitespace around cells is trimmed.
        assert_eq!(records[0].user_ip, "10.0.0.1");

        assert_eq!(records[1].android_id.as_deref(), Some("droid-2"));
        assert_eq!(records[1].eventname.as_deref(), Some("purchase"));
    }

    #[test]
    fn optional_columns_may_be_absent_entirely() {
        let csv = "\
advertising_id,appsflyer_id,country,user_ip
ad-1,af-1,US,10.0.0.1
";
        let records = parse_records(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].eventname, None);
        assert_eq!(records[0].eventtime, None);
    }

    #[test]
    fn missing_required_column_is_an_ingest_error() {
        let csv = "\
advertising_id,appsflyer_id,country
ad-1,af-1,US
";
        let err = parse_records(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, JetStreamError::Ingest(_)));
    }

    #[test]
    fn headers_only_yields_empty_batch() {
        let csv = "advertising_id,appsflyer_id,android_id,country,user_ip,eventname,eventtime\n";
        assert!(parse_records(csv.as_bytes()).unwrap().is_empty());
    }
}
