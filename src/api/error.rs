use thiserror::Error;

/// Transport-level failures talking to the OpenAQ API. None of these are retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}: {body}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        /// Response body, usually a JSON `detail` message from the API.
        body: String,
    },

    #[error("Failed to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// The HTTP status, if the server answered at all.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            ApiError::NetworkRequest(_, e) => e.status(),
            ApiError::HttpStatus { status, .. } => Some(*status),
            ApiError::Decode { .. } => None,
        }
    }
}
