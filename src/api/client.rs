//! HTTP implementation of [`AirQualitySource`] against the OpenAQ v3 API.

use crate::api::error::ApiError;
use crate::api::source::{AirQualitySource, LocationQuery, MeasurementQuery};
use crate::config::ApiSettings;
use crate::error::OpenAqError;
use crate::types::location::{ApiPage, Location, SensorId};
use crate::types::measurement::MeasurementRecord;
use log::{debug, info, warn};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;

const API_KEY_HEADER: &str = "X-API-Key";

/// Async HTTP client for the OpenAQ v3 API.
///
/// Every request carries the configured key in the `X-API-Key` header.
/// Responses are decoded from their `results` envelope; nothing is retried.
pub struct OpenAqClient {
    http: Client,
    api_key: Secret<String>,
    base_url: String,
}

impl OpenAqClient {
    /// Creates a client from [`ApiSettings`].
    ///
    /// # Errors
    ///
    /// Returns [`OpenAqError::MissingCredential`] if no API key (or only whitespace)
    /// is configured. No request is made in that case.
    pub fn new(settings: &ApiSettings) -> Result<Self, OpenAqError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or(OpenAqError::MissingCredential)?;

        let http = Client::builder()
            .gzip(true)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(OpenAqError::HttpClient)?;

        Ok(Self {
            http,
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash, e.g. `https://api.openaq.org/v3`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GETs `path` and returns the `results` array of the response envelope.
    async fn get_results<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let endpoint = format!("{}{}", self.base_url, path);
        let request = self
            .http
            .get(&endpoint)
            .header(API_KEY_HEADER, self.api_key.expose_secret().as_str())
            .query(query)
            .build()
            .map_err(|e| ApiError::NetworkRequest(endpoint.clone(), e))?;
        let url = request.url().to_string();
        debug!("GET {}", url);

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| ApiError::NetworkRequest(url.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!("Could not read the error body from {}: {}", url, e);
                    String::new()
                }
            };
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
            {
                warn!("{} answered {}. Check that the API key is valid.", url, status);
            } else {
                warn!("HTTP error for {}: {}", url, status);
            }
            return Err(ApiError::HttpStatus { url, status, body });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::NetworkRequest(url.clone(), e))?;
        let page: ApiPage<T> =
            serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode {
                url: url.clone(),
                source,
            })?;
        Ok(page.results)
    }
}

impl AirQualitySource for OpenAqClient {
    async fn search_locations(&self, query: &LocationQuery) -> Result<Vec<Location>, ApiError> {
        info!(
            "Searching locations within {} m of {} for parameter {}",
            query.radius_m, query.coordinates, query.parameter_id
        );
        let locations: Vec<Location> = self
            .get_results("/locations", &query.to_query_pairs())
            .await?;
        info!("Found {} locations", locations.len());
        Ok(locations)
    }

    async fn daily_measurements(
        &self,
        sensor_id: SensorId,
        query: &MeasurementQuery,
    ) -> Result<Vec<MeasurementRecord>, ApiError> {
        info!("Fetching daily measurements for sensor {}", sensor_id);
        let path = format!("/sensors/{}/measurements/daily", sensor_id);
        let records: Vec<MeasurementRecord> =
            self.get_results(&path, &query.to_query_pairs()).await?;
        debug!("Sensor {} returned {} records", sensor_id, records.len());
        Ok(records)
    }
}
