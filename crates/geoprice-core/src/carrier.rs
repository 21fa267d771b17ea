//! Checkout-facing shipping method.
//!
//! The carrier is either offered with an exact price or silently left out.
//! Nothing here produces an error for the end customer: every rejection,
//! config problem or store failure becomes "unavailable" plus a log line.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{load_settings, ConfigStore};
use crate::customer::Customer;
use crate::order::{Order, Picking};
use crate::pricing::{DeliveryPricingPolicy, Priced, PricingOutcome};
use crate::settings::DeliverySettings;
use crate::store::OrderStore;

pub const GPS_CARRIER_CODE: &str = "gps";
pub const GPS_CARRIER_LABEL: &str = "GPS Distance Based";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateQuote {
    pub available: bool,
    pub price: f64,
    pub message: Option<String>,
}

impl RateQuote {
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            available: false,
            price: 0.0,
            message: None,
        }
    }

    #[must_use]
    pub fn priced(price: f64) -> Self {
        Self {
            available: true,
            price,
            message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentConfirmation {
    pub exact_price: f64,
    pub tracking_number: String,
}

/// A shipping method the host checkout can offer.
#[async_trait]
pub trait ShippingMethod: Send + Sync {
    fn code(&self) -> &'static str;

    fn label(&self) -> &'static str;

    async fn rate_shipment(&self, order: &Order) -> RateQuote;

    async fn send_shipping(&self, pickings: &[Picking]) -> Vec<ShipmentConfirmation>;

    fn tracking_link(&self, picking: &Picking) -> Option<String>;

    fn cancel_shipment(&self, picking: &mut Picking);
}

/// Quantity and distance ceilings in front of the pricing policy.
#[derive(Debug, Clone)]
pub struct CarrierAvailabilityRule {
    policy: DeliveryPricingPolicy,
}

impl CarrierAvailabilityRule {
    #[must_use]
    pub fn new(policy: DeliveryPricingPolicy) -> Self {
        Self { policy }
    }

    /// `Some(priced)` when the carrier can serve `order`, `None` otherwise.
    ///
    /// Orders whose physical quantity reaches `carrier_max_quantity` are
    /// refused before any distance work. The distance ceiling is
    /// `carrier_max_distance_miles` rather than the general maximum.
    pub async fn is_available_and_price(
        &self,
        order: &Order,
        customer: Option<&mut Customer>,
        settings: &DeliverySettings,
    ) -> Option<Priced> {
        let total_quantity = order.physical_quantity();
        tracing::debug!(order = %order.name, total_quantity, "checking carrier availability");

        if total_quantity >= f64::from(settings.carrier_max_quantity) {
            tracing::info!(
                order = %order.name,
                total_quantity,
                max_quantity = settings.carrier_max_quantity,
                "carrier unavailable: order quantity at or above ceiling"
            );
            return None;
        }

        match self.policy.price(customer, &settings.for_carrier()).await {
            PricingOutcome::Priced(priced) => {
                tracing::info!(
                    order = %order.name,
                    distance_miles = priced.distance_miles,
                    price = priced.total_cost,
                    "carrier available"
                );
                Some(priced)
            }
            PricingOutcome::Rejected(rejection) => {
                tracing::info!(
                    order = %order.name,
                    reason = %rejection.reason,
                    detail = %rejection.detail,
                    "carrier unavailable"
                );
                None
            }
        }
    }
}

/// The GPS distance-based carrier.
#[derive(Clone)]
pub struct GpsCarrier {
    rule: CarrierAvailabilityRule,
    config: Arc<dyn ConfigStore>,
    store: Arc<dyn OrderStore>,
}

impl GpsCarrier {
    #[must_use]
    pub fn new(
        policy: DeliveryPricingPolicy,
        config: Arc<dyn ConfigStore>,
        store: Arc<dyn OrderStore>,
    ) -> Self {
        Self {
            rule: CarrierAvailabilityRule::new(policy),
            config,
            store,
        }
    }

    async fn load_delivery_customer(&self, order: &Order) -> Option<Customer> {
        let customer_id = order.delivery_customer_id()?;
        match self.store.load_customer(customer_id).await {
            Ok(customer) => Some(customer),
            Err(err) => {
                tracing::warn!(
                    order = %order.name,
                    customer_id,
                    error = %err,
                    "could not load delivery customer"
                );
                None
            }
        }
    }
}

#[async_trait]
impl ShippingMethod for GpsCarrier {
    fn code(&self) -> &'static str {
        GPS_CARRIER_CODE
    }

    fn label(&self) -> &'static str {
        GPS_CARRIER_LABEL
    }

    async fn rate_shipment(&self, order: &Order) -> RateQuote {
        let settings = match load_settings(self.config.as_ref()) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::error!(
                    order = %order.name,
                    error = %err,
                    "carrier unavailable: bad delivery settings"
                );
                return RateQuote::unavailable();
            }
        };

        let mut customer = self.load_delivery_customer(order).await;
        let stored_coordinate = customer.as_ref().and_then(|c| c.coordinate);

        let priced = self
            .rule
            .is_available_and_price(order, customer.as_mut(), &settings)
            .await;

        if let Some(customer) = &customer {
            let geocoded = customer
                .coordinate
                .filter(|c| Some(*c) != stored_coordinate);
            if let Some(coordinate) = geocoded {
                if let Err(err) = self
                    .store
                    .save_customer_coordinate(customer.id, coordinate)
                    .await
                {
                    tracing::warn!(
                        customer_id = customer.id,
                        error = %err,
                        "could not store geocoded coordinates"
                    );
                }
            }
        }

        priced.map_or_else(RateQuote::unavailable, |p| RateQuote::priced(p.total_cost))
    }

    async fn send_shipping(&self, pickings: &[Picking]) -> Vec<ShipmentConfirmation> {
        let mut confirmations = Vec::with_capacity(pickings.len());
        for picking in pickings {
            let tracking_number = format!("LOCAL-{}", picking.name);
            tracing::info!(
                picking = %picking.name,
                tracking = %tracking_number,
                "processing local delivery shipment"
            );

            let exact_price = match picking.order_id {
                Some(order_id) => match self.store.load_order(order_id).await {
                    Ok(order) => self.rate_shipment(&order).await.price,
                    Err(err) => {
                        tracing::warn!(
                            picking = %picking.name,
                            error = %err,
                            "could not load sale order for shipment"
                        );
                        0.0
                    }
                },
                None => 0.0,
            };

            confirmations.push(ShipmentConfirmation {
                exact_price,
                tracking_number,
            });
        }
        confirmations
    }

    fn tracking_link(&self, _picking: &Picking) -> Option<String> {
        None
    }

    fn cancel_shipment(&self, picking: &mut Picking) {
        tracing::info!(picking = %picking.name, "cancelled local delivery shipment");
        picking.tracking_ref = None;
    }
}

impl std::fmt::Debug for GpsCarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpsCarrier")
            .field("rule", &self.rule)
            .finish_non_exhaustive()
    }
}
