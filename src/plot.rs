//! Presentation of a run as a daily time series, one line per sensor.

use crate::types::flat_row::FlatRow;
use crate::types::location::SensorId;
use log::info;
use polars::df;
use polars::prelude::pivot::pivot_stable;
use polars::prelude::*;

/// Titles for the chart. Parameter and unit come from the first row.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotLabels {
    pub parameter: String,
    pub unit: String,
    pub city: String,
}

impl PlotLabels {
    /// Labels for `rows`, falling back to "Unknown Parameter" and an empty
    /// unit when the first row lacks them.
    pub fn from_rows(rows: &[FlatRow], city: impl Into<String>) -> Self {
        let first = rows.first();
        Self {
            parameter: first
                .and_then(|row| row.parameter_name.clone())
                .unwrap_or_else(|| "Unknown Parameter".to_string()),
            unit: first.and_then(|row| row.unit.clone()).unwrap_or_default(),
            city: city.into(),
        }
    }

    /// e.g. "Daily pm25 Levels in Chiang Mai by Sensor (µg/m³)".
    pub fn title(&self) -> String {
        format!(
            "Daily {} Levels in {} by Sensor ({})",
            self.parameter, self.city, self.unit
        )
    }

    /// Y axis title.
    pub fn y_title(&self) -> String {
        format!("Concentration ({})", self.unit)
    }
}

/// What [`plot_daily`] did with the rows it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotOutcome {
    /// Nothing to draw.
    Empty,
    /// A chart with `series` lines was opened.
    Rendered { series: usize },
    /// There was something to draw, but the crate was built without the
    /// `plot` feature, so no chart was opened.
    Skipped { series: usize },
}

/// Column name of a sensor's series in [`pivot_by_sensor`], e.g. `sensor_101`.
pub fn series_name(sensor_id: SensorId) -> String {
    format!("sensor_{sensor_id}")
}

/// Reshapes rows into one `date` column (`YYYY-MM-DD`, ascending) and one
/// `sensor_<id>` value column per sensor, in ascending sensor order.
///
/// Rows without a date are left out. Several readings of one sensor on the
/// same day are averaged; days a sensor did not report are null.
///
/// # Errors
///
/// Propagates any [`PolarsError`] from the group-by or the pivot.
pub fn pivot_by_sensor(rows: &[FlatRow]) -> PolarsResult<DataFrame> {
    let dated: Vec<&FlatRow> = rows.iter().filter(|row| row.date.is_some()).collect();
    if dated.is_empty() {
        return DataFrame::new(vec![Column::new("date".into(), Vec::<String>::new())]);
    }

    let long = df!(
        "sensor_id" => dated.iter().map(|row| row.sensor_id).collect::<Vec<u64>>(),
        "series" => dated.iter().map(|row| series_name(row.sensor_id)).collect::<Vec<String>>(),
        "date" => dated
            .iter()
            .map(|row| row.date.map(|date| date.format("%Y-%m-%d").to_string()))
            .collect::<Vec<Option<String>>>(),
        "value" => dated.iter().map(|row| row.value).collect::<Vec<Option<f64>>>(),
    )?;

    // One mean per sensor and day, ordered so the pivot emits sensors ascending.
    let daily = long
        .lazy()
        .group_by([col("sensor_id"), col("series"), col("date")])
        .agg([col("value").mean()])
        .sort(["sensor_id", "date"], SortMultipleOptions::default())
        .collect()?;

    pivot_stable(
        &daily,
        ["series"],
        Some(["date"]),
        Some(["value"]),
        false,
        None,
        None,
    )?
    .sort(["date"], SortMultipleOptions::default())
}

/// Opens an interactive line chart of `rows` in the browser.
///
/// With no plottable rows this only logs and returns [`PlotOutcome::Empty`].
#[cfg(feature = "plot")]
pub fn plot_daily(rows: &[FlatRow], labels: &PlotLabels) -> PolarsResult<PlotOutcome> {
    use plotlars::{Plot, Text, TimeSeriesPlot};

    let pivot = pivot_by_sensor(rows)?;
    let series: Vec<String> = pivot
        .get_column_names()
        .into_iter()
        .skip(1)
        .map(|name| name.to_string())
        .collect();

    let Some((first, rest)) = series.split_first() else {
        info!("No data to plot.");
        return Ok(PlotOutcome::Empty);
    };
    if pivot.height() == 0 {
        info!("No data to plot.");
        return Ok(PlotOutcome::Empty);
    }

    let title = labels.title();
    let y_title = labels.y_title();
    TimeSeriesPlot::builder()
        .data(&pivot)
        .x("date")
        .y(first.as_str())
        .additional_series(rest.iter().map(String::as_str).collect())
        .with_shape(true)
        .plot_title(Text::from(title.as_str()).size(18))
        .x_title("Date")
        .y_title(Text::from(y_title.as_str()))
        .build()
        .plot();

    Ok(PlotOutcome::Rendered {
        series: series.len(),
    })
}

/// Logs what would be drawn and returns [`PlotOutcome::Skipped`]; rendering
/// needs the `plot` feature.
#[cfg(not(feature = "plot"))]
pub fn plot_daily(rows: &[FlatRow], labels: &PlotLabels) -> PolarsResult<PlotOutcome> {
    let pivot = pivot_by_sensor(rows)?;
    if pivot.height() == 0 {
        info!("No data to plot.");
        return Ok(PlotOutcome::Empty);
    }
    let series = pivot.width() - 1;
    info!(
        "{}: {} series over {} days (rebuild with the `plot` feature to render)",
        labels.title(),
        series,
        pivot.height()
    );
    Ok(PlotOutcome::Skipped { series })
}
