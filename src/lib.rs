mod api;
mod config;
mod error;
mod frame;
mod measurements;
mod openaq;
mod plot;
mod sensors;
mod types;

#[cfg(test)]
mod testing;

pub use error::OpenAqError;
pub use openaq::*;

pub use api::client::OpenAqClient;
pub use api::error::ApiError;
pub use api::source::{AirQualitySource, LocationQuery, MeasurementQuery};

pub use config::{ApiSettings, ConfigError, PipelineConfig, Settings, DEFAULT_BASE_URL};

pub use sensors::resolver::{resolve_locations, resolve_sensors, LocationMeta, SensorResolution};

pub use measurements::aggregator::{
    collect_measurements, AggregationReport, SensorFetch, SensorOutcome,
};
pub use measurements::flatten::{
    flatten, flatten_record, parse_local_timestamp, parse_utc_timestamp,
};

pub use frame::air_quality_frame::{build_frame, write_csv, AirQualityLazyFrame, COLUMNS};
pub use plot::{pivot_by_sensor, plot_daily, series_name, PlotLabels, PlotOutcome};

pub use types::flat_row::FlatRow;
pub use types::lat_lon::LatLon;
pub use types::location::{ApiPage, Coordinates, Country, Location, LocationId, Sensor, SensorId};
pub use types::measurement::{
    MeasurementRecord, ParameterDescriptor, Period, SensorRecord, Timestamp,
};
