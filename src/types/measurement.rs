//! Typed projections of the OpenAQ `/sensors/{id}/measurements/daily` response.
//!
//! The upstream record also carries `flagInfo`, `coordinates`, `summary` and
//! `coverage` sub-objects. They are not modelled, so serde drops
//! them while decoding.

use crate::types::location::SensorId;
use serde::{Deserialize, Serialize};

/// One aggregated reading as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRecord {
    pub value: Option<f64>,
    pub parameter: Option<ParameterDescriptor>,
    pub period: Option<Period>,
}

/// The measured quantity, e.g. `pm25` in `µg/m³`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    pub id: Option<u32>,
    pub name: Option<String>,
    pub units: Option<String>,
    pub display_name: Option<String>,
}

/// Time window a [`MeasurementRecord`] aggregates over.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    /// Human label, e.g. "1 day".
    pub label: Option<String>,
    /// Interval length, e.g. "24:00:00".
    pub interval: Option<String>,
    pub datetime_from: Option<Timestamp>,
    pub datetime_to: Option<Timestamp>,
}

/// A period boundary in both UTC and the station's local time zone.
/// Values are kept as the raw ISO 8601 strings; parsing happens while flattening.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Timestamp {
    pub utc: Option<String>,
    pub local: Option<String>,
}

impl MeasurementRecord {
    /// `period.datetimeFrom.local`, if every level is present.
    pub fn local_start(&self) -> Option<&str> {
        self.period
            .as_ref()?
            .datetime_from
            .as_ref()?
            .local
            .as_deref()
    }

    /// `period.datetimeFrom.utc`, if every level is present.
    pub fn utc_start(&self) -> Option<&str> {
        self.period
            .as_ref()?
            .datetime_from
            .as_ref()?
            .utc
            .as_deref()
    }

    pub fn unit(&self) -> Option<&str> {
        self.parameter.as_ref()?.units.as_deref()
    }

    pub fn parameter_name(&self) -> Option<&str> {
        self.parameter.as_ref()?.name.as_deref()
    }
}

/// A [`MeasurementRecord`] stamped with the sensor it was fetched for.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorRecord {
    pub sensor_id: SensorId,
    pub record: MeasurementRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::location::ApiPage;
    use serde_json::json;

    #[test]
    fn test_deserialize_daily_measurement() -> Result<(), serde_json::Error> {
        let page: ApiPage<MeasurementRecord> = serde_json::from_value(json!({
            "meta": { "found": 1 },
            "results": [{
                "value": 31.7,
                "flagInfo": { "hasFlags": false },
                "parameter": { "id": 2, "name": "pm25", "units": "µg/m³", "displayName": null },
                "period": {
                    "label": "1 day",
                    "interval": "24:00:00",
                    "datetimeFrom": { "utc": "2024-03-01T17:00:00Z", "local": "2024-03-02T00:00:00+07:00" },
                    "datetimeTo": { "utc": "2024-03-02T17:00:00Z", "local": "2024-03-03T00:00:00+07:00" }
                },
                "coordinates": null,
                "summary": { "min": 20.1, "max": 40.2, "avg": 31.7, "sd": 4.2 },
                "coverage": { "expectedCount": 24, "observedCount": 22, "percentComplete": 91.7 }
            }]
        }))?;

        let record = &page.results[0];
        assert_eq!(record.value, Some(31.7));
        assert_eq!(record.local_start(), Some("2024-03-02T00:00:00+07:00"));
        assert_eq!(record.utc_start(), Some("2024-03-01T17:00:00Z"));
        assert_eq!(record.unit(), Some("µg/m³"));
        assert_eq!(record.parameter_name(), Some("pm25"));
        Ok(())
    }

    #[test]
    fn test_accessors_tolerate_missing_levels() -> Result<(), serde_json::Error> {
        let no_period: MeasurementRecord = serde_json::from_value(json!({ "value": 1.0 }))?;
        assert_eq!(no_period.local_start(), None);
        assert_eq!(no_period.unit(), None);

        let no_from: MeasurementRecord = serde_json::from_value(json!({
            "value": 1.0,
            "period": { "label": "1 day", "datetimeTo": { "local": "2024-01-02T00:00:00+07:00" } }
        }))?;
        assert_eq!(no_from.local_start(), None);

        let no_local: MeasurementRecord = serde_json::from_value(json!({
            "period": { "datetimeFrom": { "utc": "2024-01-01T17:00:00Z" } }
        }))?;
        assert_eq!(no_local.local_start(), None);
        assert_eq!(no_local.utc_start(), Some("2024-01-01T17:00:00Z"));
        Ok(())
    }
}
