//! Runtime configuration for a pipeline run.
//!
//! Settings are layered: built-in defaults, an optional configuration file,
//! `OPENAQ_*` entries of a `.env` file, and finally `OPENAQ_*` environment
//! variables. Programmatic callers can skip all of that and use
//! [`PipelineConfig::builder`] directly.

use crate::api::source::{LocationQuery, MeasurementQuery};
use crate::types::lat_lon::LatLon;
use bon::Builder;
use chrono::NaiveDate;
use secrecy::Secret;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.openaq.org/v3";
const ENV_PREFIX: &str = "OPENAQ";
const DEFAULT_CONFIG_FILE: &str = "openaq";
const DOTENV_FILE: &str = ".env";
/// The locations endpoint rejects radii above 25 km.
const MAX_RADIUS_M: u32 = 25_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration")]
    Load(#[from] config::ConfigError),

    #[error("Failed to read {0}")]
    Dotenv(PathBuf, #[source] dotenvy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Credentials and endpoint of the upstream API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// Sent as the `X-API-Key` header. A run without it fails before any request.
    #[serde(default)]
    pub api_key: Option<Secret<String>>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl ApiSettings {
    /// Settings for `api_key` against the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(Secret::new(api_key.into())),
            base_url: default_base_url(),
        }
    }

    /// Points the client at another deployment, e.g. a local mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// What to query: where, how far, which pollutant, and how to fetch it.
///
/// Defaults reproduce a PM2.5 lookup within 5 km of Chiang Mai University.
///
/// # Examples
///
/// ```
/// use openaq::{LatLon, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .coordinates(LatLon(13.7563, 100.5018))
///     .radius_m(10_000)
///     .city("Bangkok")
///     .location_limit(5)
///     .build();
///
/// assert_eq!(config.parameter_id, 2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Builder)]
#[serde(default)]
pub struct PipelineConfig {
    #[builder(default = LatLon(18.808233, 98.954696))]
    pub coordinates: LatLon,
    /// Search radius around `coordinates`, in meters.
    #[builder(default = 5000)]
    pub radius_m: u32,
    /// Upstream parameter id (2 = PM2.5).
    #[builder(default = 2)]
    pub parameter_id: u32,
    /// Maximum number of locations the search may return.
    #[builder(default = 1)]
    pub location_limit: u32,
    /// Descriptive only, used in plot titles. Never matched against API results.
    #[builder(default = String::from("Chiang Mai"), into)]
    pub city: String,
    /// Descriptive only, like `city`.
    #[builder(default = String::from("TH"), into)]
    pub country: String,
    /// First day of the measurement window, inclusive.
    pub date_from: Option<NaiveDate>,
    /// Last day of the measurement window.
    pub date_to: Option<NaiveDate>,
    /// Page size for each sensor's daily series. The upstream default applies when unset.
    pub measurement_limit: Option<u32>,
    /// Sensor fetches allowed in flight at once. 1 keeps the run strictly sequential.
    #[builder(default = 1)]
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PipelineConfig {
    /// Checks value ranges the upstream API would otherwise reject mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.radius_m == 0 || self.radius_m > MAX_RADIUS_M {
            return Err(ConfigError::Invalid(format!(
                "radius_m must be within 1..={MAX_RADIUS_M}, got {}",
                self.radius_m
            )));
        }
        if self.location_limit == 0 {
            return Err(ConfigError::Invalid(
                "location_limit must be at least 1".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(ConfigError::Invalid(format!(
                    "date_from ({from}) is after date_to ({to})"
                )));
            }
        }
        Ok(())
    }

    /// The search parameters of the location lookup.
    pub fn location_query(&self) -> LocationQuery {
        LocationQuery {
            coordinates: self.coordinates,
            radius_m: self.radius_m,
            parameter_id: self.parameter_id,
            limit: self.location_limit,
        }
    }

    /// The window applied to every sensor's daily series.
    pub fn measurement_query(&self) -> MeasurementQuery {
        MeasurementQuery {
            date_from: self.date_from,
            date_to: self.date_to,
            limit: self.measurement_limit,
        }
    }
}

/// Everything a run needs, as loaded from file and environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub pipeline: PipelineConfig,
}

impl Settings {
    /// Loads settings from `path` (or `./openaq.{toml,yaml,json,...}` if present),
    /// `./.env` and `OPENAQ_*` environment variables, e.g. `OPENAQ_API_KEY`,
    /// `OPENAQ_COORDINATES=18.8,98.95`, `OPENAQ_RADIUS_M=5000`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if a source cannot be read or deserialized,
    /// [`ConfigError::Dotenv`] if `.env` exists but is malformed, and
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_dotenv(path, Path::new(DOTENV_FILE))
    }

    /// Like [`Settings::load`], reading the dotenv entries from `dotenv`.
    ///
    /// A missing dotenv file is not an error. Its entries never override real
    /// environment variables, and the process environment is left untouched.
    pub fn load_with_dotenv(path: Option<&Path>, dotenv: &Path) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(Some(read_dotenv(dotenv)?)),
            )
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Self::from_config(config)
    }

    /// Deserializes and validates an already assembled [`config::Config`].
    pub fn from_config(config: config::Config) -> Result<Self, ConfigError> {
        let api: ApiSettings = config.clone().try_deserialize()?;
        let pipeline: PipelineConfig = config.try_deserialize()?;
        pipeline.validate()?;
        Ok(Self { api, pipeline })
    }
}

fn read_dotenv(path: &Path) -> Result<config::Map<String, String>, ConfigError> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => return Ok(config::Map::new()),
        Err(e) => return Err(ConfigError::Dotenv(path.to_path_buf(), e)),
    };
    entries
        .collect::<Result<_, _>>()
        .map_err(|e| ConfigError::Dotenv(path.to_path_buf(), e))
}
