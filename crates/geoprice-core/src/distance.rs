//! Great-circle and road distance between two coordinates.
//!
//! Road distance comes either from a flat multiplier over the Haversine
//! distance or from a [`RoutingLookup`]. A routing failure of any kind is
//! logged and degrades to the multiplier; it never reaches the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::GeoCoordinate;
use crate::settings::DeliverySettings;

pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Upper bound on a single routing lookup.
pub const ROUTING_TIMEOUT: Duration = Duration::from_secs(10);

/// How a road distance was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMethod {
    HaversineMultiplier,
    ExternalRouting,
}

impl std::fmt::Display for DistanceMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceMethod::HaversineMultiplier => write!(f, "haversine_multiplier"),
            DistanceMethod::ExternalRouting => write!(f, "external_routing"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceResult {
    pub straight_line_miles: f64,
    pub road_miles: f64,
    pub method: DistanceMethod,
}

/// Failure reasons from a routing lookup. None of these escape the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("routing is disabled")]
    Disabled,

    #[error("routing API key is not configured")]
    MissingApiKey,

    #[error("routing request failed: {0}")]
    Transport(String),

    #[error("routing response was malformed: {0}")]
    Malformed(String),

    #[error("routing service returned status {0}")]
    Status(String),

    #[error("routing lookup timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DistanceError {
    #[error("distance computation produced a non-finite value ({0})")]
    NonFinite(f64),
}

/// "Given two coordinates, return a driving distance in miles or fail."
#[async_trait]
pub trait RoutingLookup: Send + Sync {
    async fn driving_distance_miles(
        &self,
        origin: GeoCoordinate,
        destination: GeoCoordinate,
        api_key: Option<&str>,
    ) -> Result<f64, RoutingError>;
}

/// Lookup used when no routing service is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRouting;

#[async_trait]
impl RoutingLookup for NoRouting {
    async fn driving_distance_miles(
        &self,
        _origin: GeoCoordinate,
        _destination: GeoCoordinate,
        _api_key: Option<&str>,
    ) -> Result<f64, RoutingError> {
        Err(RoutingError::Disabled)
    }
}

/// Great-circle distance in miles.
#[must_use]
pub fn haversine_miles(a: GeoCoordinate, b: GeoCoordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);

    // Rounding can push h slightly past 1 (antipodes) or below 0 (a == b).
    EARTH_RADIUS_MILES * 2.0 * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Computes road distance using the configured method.
#[derive(Clone)]
pub struct DistanceEngine {
    routing: Arc<dyn RoutingLookup>,
    timeout: Duration,
}

impl DistanceEngine {
    #[must_use]
    pub fn new(routing: Arc<dyn RoutingLookup>) -> Self {
        Self {
            routing,
            timeout: ROUTING_TIMEOUT,
        }
    }

    /// Engine that always uses the multiplier.
    #[must_use]
    pub fn multiplier_only() -> Self {
        Self::new(Arc::new(NoRouting))
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Road distance from `a` to `b` under `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError::NonFinite`] when the multiplier arithmetic
    /// yields NaN or infinity. Routing failures are not errors.
    pub async fn road_distance(
        &self,
        a: GeoCoordinate,
        b: GeoCoordinate,
        settings: &DeliverySettings,
    ) -> Result<DistanceResult, DistanceError> {
        let straight_line_miles = haversine_miles(a, b);

        if settings.use_external_routing {
            match self.lookup(a, b, settings.routing_api_key.as_deref()).await {
                Ok(road_miles) => {
                    tracing::debug!(road_miles, "road distance from routing service");
                    return Ok(DistanceResult {
                        straight_line_miles,
                        road_miles,
                        method: DistanceMethod::ExternalRouting,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        multiplier = settings.road_multiplier,
                        "routing lookup failed, falling back to haversine multiplier"
                    );
                }
            }
        }

        let road_miles = straight_line_miles * settings.road_multiplier;
        if !road_miles.is_finite() {
            return Err(DistanceError::NonFinite(road_miles));
        }
        Ok(DistanceResult {
            straight_line_miles,
            road_miles,
            method: DistanceMethod::HaversineMultiplier,
        })
    }

    async fn lookup(
        &self,
        a: GeoCoordinate,
        b: GeoCoordinate,
        api_key: Option<&str>,
    ) -> Result<f64, RoutingError> {
        let miles = tokio::time::timeout(
            self.timeout,
            self.routing.driving_distance_miles(a, b, api_key),
        )
        .await
        .map_err(|_| RoutingError::Timeout(self.timeout))??;

        if miles.is_finite() && miles >= 0.0 {
            Ok(miles)
        } else {
            Err(RoutingError::Malformed(format!(
                "driving distance {miles} is not a usable mileage"
            )))
        }
    }
}

impl std::fmt::Debug for DistanceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceEngine")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
