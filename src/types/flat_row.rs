use crate::types::location::SensorId;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// One flattened measurement, ready to become a row of the tabular result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRow {
    pub sensor_id: SensorId,
    /// Period start in the station's local wall-clock time.
    pub date: Option<NaiveDateTime>,
    /// Period start in UTC.
    pub date_utc: Option<DateTime<Utc>>,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub parameter_name: Option<String>,
}
