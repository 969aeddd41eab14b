use crate::api::error::ApiError;
use crate::config::ConfigError;
use crate::types::location::SensorId;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenAqError {
    #[error("No OpenAQ API key configured (set OPENAQ_API_KEY)")]
    MissingCredential,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[error("Failed to resolve sensors from the location search")]
    Resolve(#[source] ApiError),

    #[error("Sensor {0} is not part of the resolved sensor set")]
    OrphanedSensor(SensorId),

    #[error("Failed processing DataFrame: {0}")]
    DataFrame(#[from] PolarsError),

    #[error("Failed to write '{0}'")]
    Export(std::path::PathBuf, #[source] std::io::Error),
}
