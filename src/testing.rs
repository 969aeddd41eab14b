//! In-memory [`AirQualitySource`] for unit tests.

use crate::api::error::ApiError;
use crate::api::source::{AirQualitySource, LocationQuery, MeasurementQuery};
use crate::types::location::{Location, SensorId};
use crate::types::measurement::MeasurementRecord;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) struct FakeSource {
    locations: Result<Vec<Location>, StatusCode>,
    measurements: HashMap<SensorId, Result<Vec<MeasurementRecord>, StatusCode>>,
    delays: HashMap<SensorId, Duration>,
    search_calls: AtomicUsize,
    measurement_calls: Mutex<Vec<SensorId>>,
}

impl FakeSource {
    pub(crate) fn new(locations: Vec<Location>) -> Self {
        Self {
            locations: Ok(locations),
            measurements: HashMap::new(),
            delays: HashMap::new(),
            search_calls: AtomicUsize::new(0),
            measurement_calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_search(status: StatusCode) -> Self {
        let mut source = Self::new(Vec::new());
        source.locations = Err(status);
        source
    }

    pub(crate) fn with_measurements(
        mut self,
        sensor_id: SensorId,
        records: Vec<MeasurementRecord>,
    ) -> Self {
        self.measurements.insert(sensor_id, Ok(records));
        self
    }

    pub(crate) fn with_failure(mut self, sensor_id: SensorId, status: StatusCode) -> Self {
        self.measurements.insert(sensor_id, Err(status));
        self
    }

    pub(crate) fn with_delay(mut self, sensor_id: SensorId, delay: Duration) -> Self {
        self.delays.insert(sensor_id, delay);
        self
    }

    pub(crate) fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Sensor ids in the order their fetches started.
    pub(crate) fn measurement_calls(&self) -> Vec<SensorId> {
        self.measurement_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

fn http_error(url: String, status: StatusCode) -> ApiError {
    ApiError::HttpStatus {
        url,
        status,
        body: json!({ "detail": status.canonical_reason() }).to_string(),
    }
}

impl AirQualitySource for FakeSource {
    async fn search_locations(&self, _query: &LocationQuery) -> Result<Vec<Location>, ApiError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.locations
            .clone()
            .map_err(|status| http_error("fake://locations".to_string(), status))
    }

    async fn daily_measurements(
        &self,
        sensor_id: SensorId,
        _query: &MeasurementQuery,
    ) -> Result<Vec<MeasurementRecord>, ApiError> {
        if let Ok(mut calls) = self.measurement_calls.lock() {
            calls.push(sensor_id);
        }
        if let Some(delay) = self.delays.get(&sensor_id) {
            tokio::time::sleep(*delay).await;
        }
        let url = format!("fake://sensors/{sensor_id}/measurements/daily");
        match self.measurements.get(&sensor_id) {
            Some(Ok(records)) => Ok(records.clone()),
            Some(Err(status)) => Err(http_error(url, *status)),
            None => Err(http_error(url, StatusCode::NOT_FOUND)),
        }
    }
}

/// A location payload listing `sensor_ids`.
pub(crate) fn location(id: u64, sensor_ids: &[SensorId]) -> Location {
    let sensors: Vec<Value> = sensor_ids
        .iter()
        .map(|sensor_id| json!({ "id": sensor_id, "name": "pm25 µg/m³" }))
        .collect();
    serde_json::from_value(json!({
        "id": id,
        "name": format!("Location {id}"),
        "locality": "Chiang Mai",
        "country": { "id": 111, "code": "TH", "name": "Thailand" },
        "coordinates": { "latitude": 18.80, "longitude": 98.95 },
        "sensors": sensors
    }))
    .expect("valid location fixture")
}

/// A daily PM2.5 record starting at local midnight of `day` (YYYY-MM-DD) in UTC+7.
pub(crate) fn daily_record(day: &str, value: f64) -> MeasurementRecord {
    serde_json::from_value(json!({
        "value": value,
        "flagInfo": { "hasFlags": false },
        "parameter": { "id": 2, "name": "pm25", "units": "µg/m³", "displayName": null },
        "period": {
            "label": "1 day",
            "interval": "24:00:00",
            "datetimeFrom": { "local": format!("{day}T00:00:00+07:00") },
            "datetimeTo": null
        },
        "coordinates": null,
        "summary": { "avg": value },
        "coverage": { "percentComplete": 100.0 }
    }))
    .expect("valid measurement fixture")
}
