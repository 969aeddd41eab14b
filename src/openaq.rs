//! This module provides the main entry point of the crate.
//! It resolves the sensors around a coordinate, collects their daily series
//! and turns them into flat rows or a Polars table.

use crate::api::client::OpenAqClient;
use crate::api::source::{AirQualitySource, LocationQuery};
use crate::config::{PipelineConfig, Settings};
use crate::error::OpenAqError;
use crate::frame::air_quality_frame::{build_frame, AirQualityLazyFrame};
use crate::measurements::aggregator::{collect_measurements, AggregationReport};
use crate::measurements::flatten::flatten;
use crate::plot::PlotLabels;
use crate::sensors::resolver::{resolve_sensors, SensorResolution};
use crate::types::flat_row::FlatRow;
use crate::types::lat_lon::LatLon;
use bon::bon;
use log::info;
use polars::prelude::{DataFrame, IntoLazy};

/// Why a run produced no rows. Informational, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The location search returned nothing.
    NoLocations,
    /// Locations were found but none listed an identified sensor.
    NoSensors,
    /// Sensors were resolved but none yielded a measurement.
    NoMeasurements,
}

/// Overall outcome of a run, derived from its [`PipelineReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every resolved sensor was fetched.
    Complete,
    /// Some sensors failed; rows hold the data of the others.
    Partial,
    /// No rows were produced; the reason says at which stage.
    Empty(EmptyReason),
}

/// Everything one pipeline run produced.
#[derive(Debug)]
pub struct PipelineReport {
    pub resolution: SensorResolution,
    pub aggregation: AggregationReport,
    pub rows: Vec<FlatRow>,
}

impl PipelineReport {
    /// Classifies the run. Empty reasons are checked stage by stage, so a run
    /// without locations is never reported as `NoMeasurements`.
    pub fn status(&self) -> RunStatus {
        if self.resolution.location_count() == 0 {
            RunStatus::Empty(EmptyReason::NoLocations)
        } else if self.resolution.is_empty() {
            RunStatus::Empty(EmptyReason::NoSensors)
        } else if self.rows.is_empty() {
            RunStatus::Empty(EmptyReason::NoMeasurements)
        } else if self.aggregation.failures().next().is_some() {
            RunStatus::Partial
        } else {
            RunStatus::Complete
        }
    }

    /// No rows were produced.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rows as a table enriched with location metadata.
    pub fn to_frame(&self) -> Result<DataFrame, OpenAqError> {
        build_frame(&self.rows, &self.resolution)
    }

    /// Like [`PipelineReport::to_frame`], wrapped for lazy filtering.
    ///
    /// # Errors
    ///
    /// Same as [`build_frame`].
    pub fn to_lazy_frame(&self) -> Result<AirQualityLazyFrame, OpenAqError> {
        Ok(AirQualityLazyFrame::new(self.to_frame()?.lazy()))
    }

    /// Chart labels for this run, with `city` as the descriptive place name.
    pub fn plot_labels(&self, city: &str) -> PlotLabels {
        PlotLabels::from_rows(&self.rows, city)
    }
}

/// The main client for collecting OpenAQ daily measurements.
///
/// Create it with [`OpenAq::new`] to talk to the OpenAQ API, or with
/// [`OpenAq::with_source`] to drive the same pipeline from any other
/// [`AirQualitySource`].
///
/// # Examples
///
/// ```no_run
/// # use openaq::{OpenAq, OpenAqError, Settings, RunStatus};
/// # #[tokio::main]
/// # async fn main() -> Result<(), OpenAqError> {
/// // Reads OPENAQ_API_KEY and friends from the environment.
/// let client = OpenAq::new(Settings::load(None)?)?;
/// let report = client.run().await?;
///
/// if report.status() != RunStatus::Complete {
///     println!("run finished with status {:?}", report.status());
/// }
/// println!("{}", report.to_frame()?);
/// # Ok(())
/// # }
/// ```
pub struct OpenAq<S = OpenAqClient> {
    source: S,
    config: PipelineConfig,
}

impl OpenAq<OpenAqClient> {
    /// Creates a client for the OpenAQ HTTP API.
    ///
    /// # Errors
    ///
    /// Returns [`OpenAqError::MissingCredential`] if `settings` hold no API key,
    /// and [`OpenAqError::Config`] if the pipeline settings are out of range.
    /// Nothing touches the network here.
    pub fn new(settings: Settings) -> Result<Self, OpenAqError> {
        let source = OpenAqClient::new(&settings.api)?;
        Self::with_source(source, settings.pipeline)
    }
}

#[bon]
impl<S: AirQualitySource> OpenAq<S> {
    /// Creates a pipeline over any [`AirQualitySource`].
    ///
    /// # Errors
    ///
    /// Returns [`OpenAqError::Config`] if `config` fails validation.
    pub fn with_source(source: S, config: PipelineConfig) -> Result<Self, OpenAqError> {
        config.validate()?;
        Ok(Self { source, config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolves the sensors near a location, overriding the configured query.
    ///
    /// Anything not set on the builder falls back to the [`PipelineConfig`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use openaq::{OpenAq, OpenAqError, Settings, LatLon};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), OpenAqError> {
    /// let client = OpenAq::new(Settings::load(None)?)?;
    /// let bangkok = client
    ///     .find_sensors()
    ///     .location(LatLon(13.7563, 100.5018))
    ///     .radius_m(10_000)
    ///     .location_limit(10)
    ///     .call()
    ///     .await?;
    /// println!("{:?}", bangkok.sensor_ids());
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn find_sensors(
        &self,
        location: Option<LatLon>,
        radius_m: Option<u32>,
        parameter_id: Option<u32>,
        location_limit: Option<u32>,
    ) -> Result<SensorResolution, OpenAqError> {
        let query = LocationQuery {
            coordinates: location.unwrap_or(self.config.coordinates),
            radius_m: radius_m.unwrap_or(self.config.radius_m),
            parameter_id: parameter_id.unwrap_or(self.config.parameter_id),
            limit: location_limit.unwrap_or(self.config.location_limit),
        };
        resolve_sensors(&self.source, &query).await
    }

    /// Fetches the daily series of every sensor in `resolution`.
    /// Failing sensors are recorded in the report, never returned as `Err`.
    pub async fn collect_measurements(&self, resolution: &SensorResolution) -> AggregationReport {
        collect_measurements(
            &self.source,
            resolution,
            &self.config.measurement_query(),
            self.config.concurrency,
        )
        .await
    }

    /// Runs the whole pipeline for the configured query.
    ///
    /// # Errors
    ///
    /// Only a failed location search is fatal ([`OpenAqError::Resolve`]).
    /// Finding nothing is reported through [`PipelineReport::status`].
    pub async fn run(&self) -> Result<PipelineReport, OpenAqError> {
        info!(
            "Fetching data from coordinates {} with radius {} m for parameter {}",
            self.config.coordinates, self.config.radius_m, self.config.parameter_id
        );
        let resolution = resolve_sensors(&self.source, &self.config.location_query()).await?;
        if resolution.is_empty() {
            return Ok(PipelineReport {
                resolution,
                aggregation: AggregationReport::default(),
                rows: Vec::new(),
            });
        }

        let aggregation = self.collect_measurements(&resolution).await;
        let rows = flatten(&aggregation.records());
        if rows.is_empty() {
            info!("No measurements collected.");
        }

        Ok(PipelineReport {
            resolution,
            aggregation,
            rows,
        })
    }
}
