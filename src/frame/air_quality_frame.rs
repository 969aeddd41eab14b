//! Tabular form of a run: a Polars `DataFrame` with one row per flattened
//! measurement, enriched with the metadata of the sensor's location.

use crate::error::OpenAqError;
use crate::sensors::resolver::SensorResolution;
use crate::types::flat_row::FlatRow;
use crate::types::location::SensorId;
use chrono::{NaiveDate, NaiveDateTime};
use polars::df;
use polars::prelude::*;
use std::path::Path;

/// Column order of [`build_frame`].
pub const COLUMNS: [&str; 12] = [
    "sensor_id",
    "date",
    "date_utc",
    "value",
    "unit",
    "parameter_name",
    "location_id",
    "location_name",
    "location_country",
    "location_city",
    "location_latitude",
    "location_longitude",
];

/// Builds the measurement table from flattened rows.
///
/// `date` holds the local wall-clock period start and `date_utc` the UTC
/// start, both as naive datetimes.
///
/// # Errors
///
/// Returns [`OpenAqError::OrphanedSensor`] if a row's sensor is not part of
/// `resolution`, and [`OpenAqError::DataFrame`] if Polars rejects the columns.
pub fn build_frame(
    rows: &[FlatRow],
    resolution: &SensorResolution,
) -> Result<DataFrame, OpenAqError> {
    let n = rows.len();
    let mut sensor_id: Vec<u64> = Vec::with_capacity(n);
    let mut date: Vec<Option<NaiveDateTime>> = Vec::with_capacity(n);
    let mut date_utc: Vec<Option<NaiveDateTime>> = Vec::with_capacity(n);
    let mut value: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut unit: Vec<Option<String>> = Vec::with_capacity(n);
    let mut parameter_name: Vec<Option<String>> = Vec::with_capacity(n);
    let mut location_id: Vec<Option<u64>> = Vec::with_capacity(n);
    let mut location_name: Vec<Option<String>> = Vec::with_capacity(n);
    let mut location_country: Vec<Option<String>> = Vec::with_capacity(n);
    let mut location_city: Vec<Option<String>> = Vec::with_capacity(n);
    let mut location_latitude: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut location_longitude: Vec<Option<f64>> = Vec::with_capacity(n);

    for row in rows {
        let meta = resolution
            .location_of(row.sensor_id)
            .ok_or(OpenAqError::OrphanedSensor(row.sensor_id))?;

        sensor_id.push(row.sensor_id);
        date.push(row.date);
        date_utc.push(row.date_utc.map(|utc| utc.naive_utc()));
        value.push(row.value);
        unit.push(row.unit.clone());
        parameter_name.push(row.parameter_name.clone());
        location_id.push(meta.location_id);
        location_name.push(meta.name.clone());
        location_country.push(meta.country.clone());
        location_city.push(meta.city.clone());
        location_latitude.push(meta.latitude);
        location_longitude.push(meta.longitude);
    }

    let frame = df!(
        COLUMNS[0] => sensor_id,
        COLUMNS[1] => date,
        COLUMNS[2] => date_utc,
        COLUMNS[3] => value,
        COLUMNS[4] => unit,
        COLUMNS[5] => parameter_name,
        COLUMNS[6] => location_id,
        COLUMNS[7] => location_name,
        COLUMNS[8] => location_country,
        COLUMNS[9] => location_city,
        COLUMNS[10] => location_latitude,
        COLUMNS[11] => location_longitude,
    )?;
    Ok(frame)
}

/// Writes `frame` as CSV with a header row.
pub fn write_csv(frame: &mut DataFrame, path: &Path) -> Result<(), OpenAqError> {
    let mut file =
        std::fs::File::create(path).map_err(|e| OpenAqError::Export(path.to_path_buf(), e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)?;
    Ok(())
}

/// A wrapper around a Polars `LazyFrame` holding the table built by [`build_frame`].
///
/// Filters are applied lazily and return a new wrapper; nothing is computed
/// until `.frame.collect()`.
#[derive(Clone)]
pub struct AirQualityLazyFrame {
    pub frame: LazyFrame,
}

impl AirQualityLazyFrame {
    /// Wraps a frame with the [`COLUMNS`] layout.
    pub fn new(frame: LazyFrame) -> Self {
        Self { frame }
    }

    /// Filters rows by an arbitrary Polars predicate.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use openaq::{OpenAq, Settings};
    /// use polars::prelude::{col, lit};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = OpenAq::new(Settings::load(None)?)?;
    /// let report = client.run().await?;
    ///
    /// // Days above the WHO 24-hour PM2.5 guideline.
    /// let unhealthy = report.to_lazy_frame()?.filter(col("value").gt(lit(15.0f64)));
    /// println!("{}", unhealthy.frame.collect()?);
    /// # Ok(())
    /// # }
    /// ```
    pub fn filter(&self, predicate: Expr) -> AirQualityLazyFrame {
        AirQualityLazyFrame::new(self.frame.clone().filter(predicate))
    }

    /// Keeps rows whose local `date` falls on a calendar day within `start..=end`.
    /// Rows without a date are dropped.
    pub fn get_range(&self, start: NaiveDate, end: NaiveDate) -> AirQualityLazyFrame {
        let day = col("date").dt().date();
        self.filter(day.clone().gt_eq(lit(start)).and(day.lt_eq(lit(end))))
    }

    /// Keeps the rows of one sensor.
    pub fn for_sensor(&self, sensor_id: SensorId) -> AirQualityLazyFrame {
        self.filter(col("sensor_id").eq(lit(sensor_id)))
    }
}
