use thiserror::Error;

/// Errors returned by the Distance Matrix client.
#[derive(Debug, Error)]
pub enum RoutingClientError {
    /// Network, TLS, timeout or non-2xx failure from the underlying HTTP client.
    /// The request URL is stripped because its query carries the API key.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The configured base URL could not be parsed.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// No API key was supplied for the lookup.
    #[error("routing API key is missing")]
    MissingApiKey,

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Top-level `"status"` was not `"OK"`.
    #[error("Distance Matrix API status {status}: {message}")]
    ApiStatus { status: String, message: String },

    /// The origin/destination element had a non-`"OK"` status.
    #[error("Distance Matrix element status {0}")]
    ElementStatus(String),

    /// The response had no rows, no elements, or no distance.
    #[error("Distance Matrix response contained no distance")]
    EmptyResponse,
}

impl From<reqwest::Error> for RoutingClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}
