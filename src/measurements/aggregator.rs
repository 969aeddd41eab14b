//! Fetches the daily series of every resolved sensor.
//!
//! A failing sensor never aborts the collection: its error is logged and kept
//! in the [`AggregationReport`], and the remaining sensors are still fetched.

use crate::api::error::ApiError;
use crate::api::source::{AirQualitySource, MeasurementQuery};
use crate::sensors::resolver::SensorResolution;
use crate::types::location::SensorId;
use crate::types::measurement::{MeasurementRecord, SensorRecord};
use futures_util::stream::{self, StreamExt};
use log::{info, warn};

/// What happened when fetching one sensor.
#[derive(Debug)]
pub enum SensorOutcome {
    /// The sensor's records, in upstream order. May be empty.
    Fetched(Vec<MeasurementRecord>),
    /// The request failed; the sensor contributes no records.
    Failed(ApiError),
}

/// The outcome of fetching one sensor.
#[derive(Debug)]
pub struct SensorFetch {
    pub sensor_id: SensorId,
    pub outcome: SensorOutcome,
}

/// One [`SensorFetch`] per resolved sensor, in resolution order.
#[derive(Debug, Default)]
pub struct AggregationReport {
    fetches: Vec<SensorFetch>,
}

impl AggregationReport {
    /// Every attempted sensor, failed or not, in resolution order.
    pub fn fetches(&self) -> &[SensorFetch] {
        &self.fetches
    }

    /// All fetched records stamped with their sensor id. Sensor order follows
    /// the resolution; within a sensor, the upstream order is kept.
    pub fn records(&self) -> Vec<SensorRecord> {
        self.fetches
            .iter()
            .filter_map(|fetch| match &fetch.outcome {
                SensorOutcome::Fetched(records) => Some((fetch.sensor_id, records)),
                SensorOutcome::Failed(_) => None,
            })
            .flat_map(|(sensor_id, records)| {
                records.iter().map(move |record| SensorRecord {
                    sensor_id,
                    record: record.clone(),
                })
            })
            .collect()
    }

    /// Total number of fetched records.
    pub fn record_count(&self) -> usize {
        self.fetches
            .iter()
            .map(|fetch| match &fetch.outcome {
                SensorOutcome::Fetched(records) => records.len(),
                SensorOutcome::Failed(_) => 0,
            })
            .sum()
    }

    /// Ids of the sensors whose fetch succeeded, in resolution order.
    pub fn succeeded(&self) -> impl Iterator<Item = SensorId> + '_ {
        self.fetches
            .iter()
            .filter(|fetch| matches!(fetch.outcome, SensorOutcome::Fetched(_)))
            .map(|fetch| fetch.sensor_id)
    }

    /// Ids and errors of the sensors whose fetch failed, in resolution order.
    pub fn failures(&self) -> impl Iterator<Item = (SensorId, &ApiError)> + '_ {
        self.fetches
            .iter()
            .filter_map(|fetch| match &fetch.outcome {
                SensorOutcome::Failed(error) => Some((fetch.sensor_id, error)),
                SensorOutcome::Fetched(_) => None,
            })
    }

    /// At least one sensor failed while at least one succeeded.
    pub fn is_partial(&self) -> bool {
        self.failures().next().is_some() && self.succeeded().next().is_some()
    }
}

/// Fetches each resolved sensor's daily measurements.
///
/// Up to `concurrency` requests are in flight at once (1 = one after the other).
/// Results are buffered in order, so the report is identical whatever the
/// concurrency.
pub async fn collect_measurements<S: AirQualitySource>(
    source: &S,
    resolution: &SensorResolution,
    query: &MeasurementQuery,
    concurrency: usize,
) -> AggregationReport {
    let fetches: Vec<SensorFetch> = stream::iter(resolution.sensor_ids().iter().copied())
        .map(|sensor_id| async move {
            let outcome = match source.daily_measurements(sensor_id, query).await {
                Ok(records) => SensorOutcome::Fetched(records),
                Err(e) => {
                    warn!(
                        "Error fetching daily measurements for sensor {}, skipping: {}",
                        sensor_id, e
                    );
                    SensorOutcome::Failed(e)
                }
            };
            SensorFetch { sensor_id, outcome }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let report = AggregationReport { fetches };
    info!(
        "Collected {} records from {} of {} sensors",
        report.record_count(),
        report.succeeded().count(),
        report.fetches().len()
    );
    report
}
