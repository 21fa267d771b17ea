//! Delivery pricing: coordinates, distance, ceiling, price.
//!
//! [`DeliveryPricingPolicy::price`] never fails with an error. Every problem
//! is a [`Rejection`] carrying a reason and an operator-facing detail string
//! that names the customer and the numbers involved.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::customer::Customer;
use crate::distance::{DistanceEngine, DistanceMethod};
use crate::gateway::GeocodingGateway;
use crate::geo::validate_coordinate;
use crate::settings::DeliverySettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    NoCustomer,
    GeocodingFailed,
    InvalidCoordinates,
    OutOfRange,
    CalculationError,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::NoCustomer => write!(f, "no customer"),
            RejectionReason::GeocodingFailed => write!(f, "geocoding failed"),
            RejectionReason::InvalidCoordinates => write!(f, "invalid coordinates"),
            RejectionReason::OutOfRange => write!(f, "out of delivery range"),
            RejectionReason::CalculationError => write!(f, "calculation error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{reason}: {detail}")]
pub struct Rejection {
    pub reason: RejectionReason,
    pub detail: String,
}

impl Rejection {
    fn new(reason: RejectionReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Priced {
    pub distance_miles: f64,
    pub rate_per_mile: f64,
    pub total_cost: f64,
    pub method: DistanceMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PricingOutcome {
    Priced(Priced),
    Rejected(Rejection),
}

impl PricingOutcome {
    /// Converts the outcome into a `Result` for `?`-style callers.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] when the outcome was rejected.
    pub fn into_result(self) -> Result<Priced, Rejection> {
        match self {
            PricingOutcome::Priced(priced) => Ok(priced),
            PricingOutcome::Rejected(rejection) => Err(rejection),
        }
    }

    #[must_use]
    pub fn priced(&self) -> Option<&Priced> {
        match self {
            PricingOutcome::Priced(priced) => Some(priced),
            PricingOutcome::Rejected(_) => None,
        }
    }
}

/// Prices a delivery to one customer.
#[derive(Clone)]
pub struct DeliveryPricingPolicy {
    engine: DistanceEngine,
    geocoder: Arc<dyn GeocodingGateway>,
}

impl DeliveryPricingPolicy {
    #[must_use]
    pub fn new(engine: DistanceEngine, geocoder: Arc<dyn GeocodingGateway>) -> Self {
        Self { engine, geocoder }
    }

    /// Price a delivery from `settings.origin` to `customer`.
    ///
    /// When the customer has no stored coordinates the geocoder is asked to
    /// resolve the address and, on success, `customer.coordinate` is updated.
    /// That is the only mutation this performs.
    pub async fn price(
        &self,
        customer: Option<&mut Customer>,
        settings: &DeliverySettings,
    ) -> PricingOutcome {
        let Some(customer) = customer else {
            return PricingOutcome::Rejected(Rejection::new(
                RejectionReason::NoCustomer,
                "no customer selected; the delivery cost depends on the customer's location",
            ));
        };

        if !customer.has_coordinates() {
            if let Err(rejection) = self.geocode(customer).await {
                return PricingOutcome::Rejected(rejection);
            }
        }

        if let Some(err) = validate_coordinate(customer.coordinate) {
            let (lat, lon) = customer
                .coordinate
                .map_or((0.0, 0.0), |c| (c.latitude, c.longitude));
            tracing::warn!(
                customer_id = customer.id,
                latitude = lat,
                longitude = lon,
                error = %err,
                "customer coordinates failed validation"
            );
            return PricingOutcome::Rejected(Rejection::new(
                RejectionReason::InvalidCoordinates,
                format!(
                    "{err} for customer {}: latitude={lat}, longitude={lon}",
                    customer.name
                ),
            ));
        }
        let Some(destination) = customer.coordinate else {
            return PricingOutcome::Rejected(Rejection::new(
                RejectionReason::InvalidCoordinates,
                format!("customer {} has no coordinates", customer.name),
            ));
        };

        let distance = match self
            .engine
            .road_distance(settings.origin, destination, settings)
            .await
        {
            Ok(distance) => distance,
            Err(err) => {
                tracing::error!(
                    customer_id = customer.id,
                    error = %err,
                    "distance calculation failed"
                );
                return PricingOutcome::Rejected(Rejection::new(
                    RejectionReason::CalculationError,
                    format!(
                        "could not compute distance for customer {} from {} to {destination}: {err}",
                        customer.name, settings.origin
                    ),
                ));
            }
        };

        if distance.road_miles > settings.max_distance_miles {
            tracing::info!(
                customer_id = customer.id,
                distance_miles = distance.road_miles,
                max_distance_miles = settings.max_distance_miles,
                "customer is beyond the delivery range"
            );
            return PricingOutcome::Rejected(Rejection::new(
                RejectionReason::OutOfRange,
                format!(
                    "customer {} is {:.2} miles away; maximum delivery distance is {:.2} miles",
                    customer.name, distance.road_miles, settings.max_distance_miles
                ),
            ));
        }

        let total_cost = distance.road_miles * settings.rate_per_mile;
        if !total_cost.is_finite() {
            return PricingOutcome::Rejected(Rejection::new(
                RejectionReason::CalculationError,
                format!(
                    "delivery cost for customer {} is not finite ({:.2} miles at {} per mile)",
                    customer.name, distance.road_miles, settings.rate_per_mile
                ),
            ));
        }

        tracing::debug!(
            customer_id = customer.id,
            distance_miles = distance.road_miles,
            straight_line_miles = distance.straight_line_miles,
            method = %distance.method,
            total_cost,
            "delivery priced"
        );

        PricingOutcome::Priced(Priced {
            distance_miles: distance.road_miles,
            rate_per_mile: settings.rate_per_mile,
            total_cost,
            method: distance.method,
        })
    }

    async fn geocode(&self, customer: &mut Customer) -> Result<(), Rejection> {
        tracing::info!(
            customer_id = customer.id,
            "customer has no coordinates, attempting geocoding"
        );

        let failed = |customer: &Customer, cause: &str| {
            let present = customer.address.present_fields();
            let present = if present.is_empty() {
                "none".to_string()
            } else {
                present.join(", ")
            };
            tracing::warn!(
                customer_id = customer.id,
                address = %customer.address.display(),
                cause,
                "geocoding failed"
            );
            Rejection::new(
                RejectionReason::GeocodingFailed,
                format!(
                    "could not geocode the address of customer {} ({cause}); address fields present: {present}; \
                     check street, city, state, zip and country",
                    customer.name
                ),
            )
        };

        match self.geocoder.resolve(&customer.address).await {
            Ok(Some(coord)) if coord.latitude != 0.0 && coord.longitude != 0.0 => {
                tracing::info!(
                    customer_id = customer.id,
                    latitude = coord.latitude,
                    longitude = coord.longitude,
                    "geocoded customer"
                );
                customer.coordinate = Some(coord);
                Ok(())
            }
            Ok(_) => Err(failed(&*customer, "no result")),
            Err(err) => Err(failed(&*customer, &err.to_string())),
        }
    }
}

impl std::fmt::Debug for DeliveryPricingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryPricingPolicy")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "pricing_test.rs"]
mod tests;
