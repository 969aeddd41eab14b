//! Projects nested measurement records onto flat rows.

use crate::types::flat_row::FlatRow;
use crate::types::measurement::SensorRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::debug;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// One [`FlatRow`] per record, in input order.
///
/// Missing or unparseable fields become `None` on that row only; flattening
/// itself cannot fail.
pub fn flatten(records: &[SensorRecord]) -> Vec<FlatRow> {
    records.iter().map(flatten_record).collect()
}

pub fn flatten_record(stamped: &SensorRecord) -> FlatRow {
    let record = &stamped.record;

    let date = record.local_start().and_then(|raw| {
        let parsed = parse_local_timestamp(raw);
        if parsed.is_none() {
            debug!(
                "Unparseable local period start '{}' for sensor {}",
                raw, stamped.sensor_id
            );
        }
        parsed
    });

    FlatRow {
        sensor_id: stamped.sensor_id,
        date,
        date_utc: record.utc_start().and_then(parse_utc_timestamp),
        value: record.value,
        unit: record.unit().map(str::to_owned),
        parameter_name: record.parameter_name().map(str::to_owned),
    }
}

/// Parses a local ISO 8601 timestamp into its wall-clock time.
///
/// An offset, if present, is dropped: `2024-01-02T00:00:00+07:00` becomes
/// `2024-01-02 00:00:00`. Bare dates are taken as midnight.
pub fn parse_local_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.naive_local());
    }
    parse_naive(raw)
}

/// Parses a UTC ISO 8601 timestamp. Offset-less input is taken as UTC.
pub fn parse_utc_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.with_timezone(&Utc));
    }
    parse_naive(raw).map(|naive| naive.and_utc())
}

fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::daily_record;
    use crate::types::measurement::MeasurementRecord;
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;

    fn stamped(sensor_id: u64, record: MeasurementRecord) -> SensorRecord {
        SensorRecord { sensor_id, record }
    }

    fn local(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, 0, 0))
            .expect("valid test date")
    }

    #[test]
    fn test_flatten_extracts_columns() {
        let record: MeasurementRecord = serde_json::from_value(json!({
            "value": 42.5,
            "parameter": { "id": 2, "name": "pm25", "units": "µg/m³" },
            "period": {
                "datetimeFrom": {
                    "utc": "2024-03-01T17:00:00Z",
                    "local": "2024-03-02T00:00:00+07:00"
                }
            }
        }))
        .expect("valid record");

        let rows = flatten(&[stamped(101, record)]);

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.sensor_id, 101);
        assert_eq!(row.date, Some(local(2024, 3, 2, 0)));
        assert_eq!(
            row.date_utc,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 17, 0, 0).unwrap())
        );
        assert_eq!(row.value, Some(42.5));
        assert_eq!(row.unit.as_deref(), Some("µg/m³"));
        assert_eq!(row.parameter_name.as_deref(), Some("pm25"));
    }

    #[test]
    fn test_row_count_matches_input() {
        let records: Vec<SensorRecord> = (0..25)
            .map(|i| stamped(i % 3, daily_record("2024-01-01", i as f64)))
            .chain(std::iter::once(stamped(
                9,
                serde_json::from_value(json!({})).expect("empty record"),
            )))
            .collect();

        let rows = flatten(&records);
        assert_eq!(rows.len(), records.len());
        assert!(rows
            .iter()
            .zip(&records)
            .all(|(row, input)| row.sensor_id == input.sensor_id));
    }

    #[test]
    fn test_missing_local_start_gives_absent_date() {
        let records = vec![
            stamped(1, serde_json::from_value(json!({ "value": 3.0 })).expect("record")),
            stamped(
                2,
                serde_json::from_value(json!({
                    "value": 4.0,
                    "period": { "datetimeFrom": { "utc": "2024-01-01T00:00:00Z" } }
                }))
                .expect("record"),
            ),
            stamped(
                3,
                serde_json::from_value(json!({
                    "value": 5.0,
                    "period": { "datetimeFrom": { "local": "yesterday-ish" } }
                }))
                .expect("record"),
            ),
            stamped(4, daily_record("2024-01-05", 6.0)),
        ];

        let rows = flatten(&records);

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].date, None);
        assert_eq!(rows[1].date, None);
        assert!(rows[1].date_utc.is_some());
        assert_eq!(rows[2].date, None);
        assert_eq!(rows[3].date, Some(local(2024, 1, 5, 0)));
        assert_eq!(
            rows.iter().map(|r| r.value).collect::<Vec<_>>(),
            vec![Some(3.0), Some(4.0), Some(5.0), Some(6.0)]
        );
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        assert!(flatten(&[]).is_empty());
    }

    #[test]
    fn test_parse_local_timestamp_variants() {
        assert_eq!(
            parse_local_timestamp("2024-01-02T00:00:00+07:00"),
            Some(local(2024, 1, 2, 0))
        );
        assert_eq!(
            parse_local_timestamp("2024-01-02T06:00:00-05:00"),
            Some(local(2024, 1, 2, 6))
        );
        assert_eq!(
            parse_local_timestamp("2024-01-02T06:00:00"),
            Some(local(2024, 1, 2, 6))
        );
        assert_eq!(
            parse_local_timestamp("2024-01-02 06:00:00.250")
                .map(|dt| dt.and_utc().timestamp_subsec_millis()),
            Some(250)
        );
        assert_eq!(parse_local_timestamp("2024-01-02"), Some(local(2024, 1, 2, 0)));
        assert_eq!(parse_local_timestamp(""), None);
        assert_eq!(parse_local_timestamp("02/01/2024"), None);
    }

    #[test]
    fn test_parse_utc_timestamp_normalizes_offset() {
        assert_eq!(
            parse_utc_timestamp("2024-01-02T00:00:00+07:00"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 17, 0, 0).unwrap())
        );
        assert_eq!(
            parse_utc_timestamp("2024-01-01T17:00:00"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 17, 0, 0).unwrap())
        );
        assert_eq!(parse_utc_timestamp("not a date"), None);
    }
}
