//! The seam between the pipeline and the upstream API.

use crate::api::error::ApiError;
use crate::types::lat_lon::LatLon;
use crate::types::location::{Location, SensorId};
use crate::types::measurement::MeasurementRecord;
use chrono::NaiveDate;
use std::future::Future;

/// Parameters of the radial location search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationQuery {
    pub coordinates: LatLon,
    pub radius_m: u32,
    pub parameter_id: u32,
    pub limit: u32,
}

impl LocationQuery {
    pub(crate) fn to_query_pairs(self) -> Vec<(&'static str, String)> {
        vec![
            ("coordinates", self.coordinates.to_string()),
            ("radius", self.radius_m.to_string()),
            ("parameters_id", self.parameter_id.to_string()),
            ("limit", self.limit.to_string()),
        ]
    }
}

/// Optional window applied to every sensor's daily series.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeasurementQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub limit: Option<u32>,
}

impl MeasurementQuery {
    pub(crate) fn to_query_pairs(self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(from) = self.date_from {
            pairs.push(("datetime_from", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.date_to {
            pairs.push(("datetime_to", to.format("%Y-%m-%d").to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

/// Read access to locations and per-sensor daily measurements.
///
/// [`crate::OpenAqClient`] implements this over HTTP. Anything else that can
/// answer the two queries (a fixture, a replay of saved responses) can drive
/// the pipeline through [`crate::OpenAq::with_source`].
pub trait AirQualitySource {
    fn search_locations(
        &self,
        query: &LocationQuery,
    ) -> impl Future<Output = Result<Vec<Location>, ApiError>> + Send;

    fn daily_measurements(
        &self,
        sensor_id: SensorId,
        query: &MeasurementQuery,
    ) -> impl Future<Output = Result<Vec<MeasurementRecord>, ApiError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_query_pairs() {
        let query = LocationQuery {
            coordinates: LatLon(18.808233, 98.954696),
            radius_m: 5000,
            parameter_id: 2,
            limit: 1,
        };
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("coordinates", "18.808233,98.954696".to_string()),
                ("radius", "5000".to_string()),
                ("parameters_id", "2".to_string()),
                ("limit", "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_measurement_query_pairs() {
        assert!(MeasurementQuery::default().to_query_pairs().is_empty());

        let query = MeasurementQuery {
            date_from: NaiveDate::from_ymd_opt(2024, 1, 1),
            date_to: None,
            limit: Some(365),
        };
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("datetime_from", "2024-01-01".to_string()),
                ("limit", "365".to_string()),
            ]
        );
    }
}
