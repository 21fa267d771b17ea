//! HTTP client for a Distance Matrix style driving-distance API.
//!
//! Sends a single origin/destination pair with `units=imperial` and
//! `mode=driving`, checks both the top-level and the element `"status"`
//! fields, and converts the reported distance from meters to miles.

use std::time::Duration;

use async_trait::async_trait;
use geoprice_core::{GeoCoordinate, RoutingError, RoutingLookup};
use reqwest::{Client, Url};

use crate::error::RoutingClientError;
use crate::types::DistanceMatrixResponse;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

pub const METERS_TO_MILES: f64 = 0.000_621_371;

/// Default request timeout for a routing lookup.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Client for the Distance Matrix API.
///
/// Use [`DistanceMatrixClient::new`] for production or
/// [`DistanceMatrixClient::with_base_url`] to point at a mock server in tests.
pub struct DistanceMatrixClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl DistanceMatrixClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, RoutingClientError> {
        Self::with_base_url(timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`RoutingClientError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(timeout_secs: u64, base_url: &str) -> Result<Self, RoutingClientError> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent("geoprice/0.1 (delivery-pricing)")
            .build()?;

        let base_url = Url::parse(base_url).map_err(|e| RoutingClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Driving distance in miles between two coordinates.
    ///
    /// # Errors
    ///
    /// - [`RoutingClientError::MissingApiKey`] if `api_key` is absent or blank.
    /// - [`RoutingClientError::Http`] on network failure, timeout or non-2xx status.
    /// - [`RoutingClientError::Deserialize`] if the body is not the expected JSON.
    /// - [`RoutingClientError::ApiStatus`] / [`RoutingClientError::ElementStatus`]
    ///   when the service reports a non-`OK` status.
    /// - [`RoutingClientError::EmptyResponse`] when no distance is present.
    pub async fn driving_distance(
        &self,
        origin: GeoCoordinate,
        destination: GeoCoordinate,
        api_key: Option<&str>,
    ) -> Result<f64, RoutingClientError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(RoutingClientError::MissingApiKey)?;

        let url = self.build_url(origin, destination, api_key);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        let parsed: DistanceMatrixResponse =
            serde_json::from_str(&body).map_err(|e| RoutingClientError::Deserialize {
                context: format!("distancematrix({origin} -> {destination})"),
                source: e,
            })?;

        let meters = Self::extract_meters(parsed)?;
        let miles = meters * METERS_TO_MILES;
        tracing::debug!(meters, miles, "driving distance from Distance Matrix API");
        Ok(miles)
    }

    /// Builds the request URL with percent-encoded query parameters.
    fn build_url(&self, origin: GeoCoordinate, destination: GeoCoordinate, api_key: &str) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(
                "origins",
                &format!("{},{}", origin.latitude, origin.longitude),
            );
            pairs.append_pair(
                "destinations",
                &format!("{},{}", destination.latitude, destination.longitude),
            );
            pairs.append_pair("units", "imperial");
            pairs.append_pair("mode", "driving");
            pairs.append_pair("key", api_key);
        }
        url
    }

    fn extract_meters(response: DistanceMatrixResponse) -> Result<f64, RoutingClientError> {
        if response.status != "OK" {
            return Err(RoutingClientError::ApiStatus {
                message: response
                    .error_message
                    .unwrap_or_else(|| "no error message".to_string()),
                status: response.status,
            });
        }

        let element = response
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.elements.into_iter().next())
            .ok_or(RoutingClientError::EmptyResponse)?;

        if element.status != "OK" {
            return Err(RoutingClientError::ElementStatus(element.status));
        }

        element
            .distance
            .map(|d| d.value)
            .ok_or(RoutingClientError::EmptyResponse)
    }
}

#[async_trait]
impl RoutingLookup for DistanceMatrixClient {
    async fn driving_distance_miles(
        &self,
        origin: GeoCoordinate,
        destination: GeoCoordinate,
        api_key: Option<&str>,
    ) -> Result<f64, RoutingError> {
        self.driving_distance(origin, destination, api_key)
            .await
            .map_err(|err| to_routing_error(err, self.timeout))
    }
}

fn to_routing_error(err: RoutingClientError, timeout: Duration) -> RoutingError {
    match err {
        RoutingClientError::MissingApiKey => RoutingError::MissingApiKey,
        RoutingClientError::Http(e) if e.is_timeout() => RoutingError::Timeout(timeout),
        RoutingClientError::Http(e) => RoutingError::Transport(e.without_url().to_string()),
        err @ RoutingClientError::InvalidBaseUrl { .. } => RoutingError::Transport(err.to_string()),
        RoutingClientError::ApiStatus { status, .. }
        | RoutingClientError::ElementStatus(status) => RoutingError::Status(status),
        err @ (RoutingClientError::Deserialize { .. } | RoutingClientError::EmptyResponse) => {
            RoutingError::Malformed(err.to_string())
        }
    }
}

impl std::fmt::Debug for DistanceMatrixClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceMatrixClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
