//! When a delivery line's price may be computed, and the lock that keeps it.
//!
//! A delivery line starts `Unpriced`. The first successful pricing writes the
//! unit price and moves it to `Locked`; from then on only
//! [`PricingLifecycle::recalculate`] touches the price. Three triggers feed
//! the same price-and-lock step and differ only in how
//! they report a rejection:
//!
//! | Trigger                         | On rejection                          |
//! |---------------------------------|---------------------------------------|
//! | [`PricingLifecycle::on_product_added`] | returned as an error to the user |
//! | [`PricingLifecycle::on_lines_created`] | logged, line stays unpriced      |
//! | [`PricingLifecycle::recalculate`]      | returned as an error to the user |

use std::sync::Arc;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::{load_settings, ConfigStore};
use crate::customer::Customer;
use crate::error::PricingError;
use crate::geo::GeoCoordinate;
use crate::order::{Order, OrderLinePricingState};
use crate::pricing::{DeliveryPricingPolicy, Priced};
use crate::settings::DeliverySettings;
use crate::store::{OrderStore, StoreError};

/// Currency precision of a stored unit price.
const PRICE_DECIMALS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineState {
    Unpriced,
    Locked,
}

impl OrderLinePricingState {
    #[must_use]
    pub fn state(&self) -> LineState {
        if self.price_locked {
            LineState::Locked
        } else {
            LineState::Unpriced
        }
    }

    /// Automatic triggers only price delivery lines that are not locked yet.
    #[must_use]
    pub fn accepts_automatic_pricing(&self) -> bool {
        self.is_delivery_line && !self.price_locked
    }
}

/// Result of a successful price-and-lock step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceConfirmation {
    pub customer: String,
    pub distance_miles: f64,
    pub rate_per_mile: f64,
    pub total_cost: f64,
    /// `total_cost` rounded to currency precision, as written to the line.
    pub unit_price: Decimal,
}

impl PriceConfirmation {
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Delivery cost has been automatically calculated:\n\n\
             Customer: {}\n\
             Distance: {:.2} miles\n\
             Rate: ${:.2} per mile\n\
             Total Delivery Cost: ${:.2}\n\n\
             This price is now locked and will not change automatically \
             if the customer address is updated.",
            self.customer, self.distance_miles, self.rate_per_mile, self.total_cost
        )
    }
}

/// Non-blocking feedback for the interactive "product added" trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LineFeedback {
    /// Not a delivery line, or already locked.
    Unchanged,
    /// No customer on the order; nothing was computed.
    Warning { title: String, message: String },
    Locked(PriceConfirmation),
}

/// Per-line result of the programmatic creation trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CreationOutcome {
    Locked { line_id: i64, unit_price: Decimal },
    Skipped { line_id: i64 },
    Unpriced { line_id: i64, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecalculationSummary {
    pub order: String,
    pub lines_updated: usize,
    pub confirmation: PriceConfirmation,
}

impl RecalculationSummary {
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Delivery cost recalculated successfully:\n\
             Distance: {:.2} miles\n\
             Rate: ${:.2} per mile\n\
             Total: ${:.2}",
            self.confirmation.distance_miles,
            self.confirmation.rate_per_mile,
            self.confirmation.total_cost
        )
    }
}

/// Snapshot of an order's delivery pricing for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryCostInfo {
    pub line_id: i64,
    /// Freshly computed; 0.0 when the order cannot currently be priced.
    pub distance_miles: f64,
    pub rate_per_mile: f64,
    pub unit_price: Decimal,
    pub calculated: bool,
}

/// Drives delivery-line pricing for the host's order events.
#[derive(Clone)]
pub struct PricingLifecycle {
    policy: DeliveryPricingPolicy,
    config: Arc<dyn ConfigStore>,
    store: Arc<dyn OrderStore>,
}

impl PricingLifecycle {
    #[must_use]
    pub fn new(
        policy: DeliveryPricingPolicy,
        config: Arc<dyn ConfigStore>,
        store: Arc<dyn OrderStore>,
    ) -> Self {
        Self {
            policy,
            config,
            store,
        }
    }

    /// Interactive trigger: the user put a product on `line_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Rejected`] when the customer cannot be priced,
    /// and config/store errors as they occur. A missing customer is a
    /// [`LineFeedback::Warning`], not an error.
    pub async fn on_product_added(
        &self,
        order_id: i64,
        line_id: i64,
    ) -> Result<LineFeedback, PricingError> {
        let order = self.store.load_order(order_id).await?;
        let line = order.line(line_id).ok_or(StoreError::LineNotFound(line_id))?;

        if !line.pricing.accepts_automatic_pricing() {
            return Ok(LineFeedback::Unchanged);
        }

        let Some(customer_id) = order.customer_id else {
            return Ok(LineFeedback::Warning {
                title: "Customer Required".to_string(),
                message: "Please select a customer before adding delivery service. \
                          The delivery cost is calculated based on the customer's location."
                    .to_string(),
            });
        };

        let settings = load_settings(self.config.as_ref())?;
        match self
            .price_and_lock(&order, &[line_id], customer_id, &settings)
            .await
        {
            Ok(confirmation) => Ok(LineFeedback::Locked(confirmation)),
            Err(err) => {
                tracing::warn!(
                    order = %order.name,
                    line_id,
                    error = %err,
                    "delivery cost calculation failed"
                );
                Err(err)
            }
        }
    }

    /// Programmatic trigger: lines were created in bulk (web shop, API,
    /// import). Never fails; problems are logged and the line stays
    /// unpriced.
    pub async fn on_lines_created(&self, order_id: i64, line_ids: &[i64]) -> Vec<CreationOutcome> {
        let unpriced_all = |reason: &str| {
            line_ids
                .iter()
                .map(|&line_id| CreationOutcome::Unpriced {
                    line_id,
                    reason: reason.to_string(),
                })
                .collect::<Vec<_>>()
        };

        let order = match self.store.load_order(order_id).await {
            Ok(order) => order,
            Err(err) => {
                tracing::error!(
                    order_id,
                    error = %err,
                    "could not load order for delivery pricing"
                );
                return unpriced_all(&err.to_string());
            }
        };
        let settings = match load_settings(self.config.as_ref()) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::error!(
                    order = %order.name,
                    error = %err,
                    "could not load delivery settings"
                );
                return unpriced_all(&err.to_string());
            }
        };

        let mut outcomes = Vec::with_capacity(line_ids.len());
        for &line_id in line_ids {
            let Some(line) = order.line(line_id) else {
                tracing::warn!(order = %order.name, line_id, "created line not found on order");
                outcomes.push(CreationOutcome::Unpriced {
                    line_id,
                    reason: StoreError::LineNotFound(line_id).to_string(),
                });
                continue;
            };
            if !line.pricing.accepts_automatic_pricing() {
                outcomes.push(CreationOutcome::Skipped { line_id });
                continue;
            }
            let Some(customer_id) = order.customer_id else {
                tracing::warn!(
                    order = %order.name,
                    line_id,
                    "delivery line created without customer, skipping automatic cost calculation"
                );
                outcomes.push(CreationOutcome::Unpriced {
                    line_id,
                    reason: "no customer".to_string(),
                });
                continue;
            };

            match self
                .price_and_lock(&order, &[line_id], customer_id, &settings)
                .await
            {
                Ok(confirmation) => outcomes.push(CreationOutcome::Locked {
                    line_id,
                    unit_price: confirmation.unit_price,
                }),
                Err(err) => {
                    tracing::error!(
                        order = %order.name,
                        line_id,
                        error = %err,
                        "could not calculate delivery cost on create"
                    );
                    outcomes.push(CreationOutcome::Unpriced {
                        line_id,
                        reason: err.to_string(),
                    });
                }
            }
        }
        outcomes
    }

    /// Explicit operator action: re-price every delivery line of the order,
    /// locked or not.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::NoCustomer`] or
    /// [`PricingError::NoDeliveryLine`] when there is nothing to price, and
    /// [`PricingError::Rejected`] on any rejection.
    pub async fn recalculate(&self, order_id: i64) -> Result<RecalculationSummary, PricingError> {
        let order = self.store.load_order(order_id).await?;

        let Some(customer_id) = order.customer_id else {
            return Err(PricingError::NoCustomer {
                order: order.name.clone(),
            });
        };

        let line_ids: Vec<i64> = order.delivery_lines().map(|line| line.id).collect();
        if line_ids.is_empty() {
            return Err(PricingError::NoDeliveryLine {
                order: order.name.clone(),
            });
        }

        let settings = load_settings(self.config.as_ref())?;
        let confirmation = self
            .price_and_lock(&order, &line_ids, customer_id, &settings)
            .await
            .inspect_err(|err| {
                tracing::error!(
                    order = %order.name,
                    error = %err,
                    "manual delivery recalculation failed"
                );
            })?;

        tracing::info!(
            order = %order.name,
            lines = line_ids.len(),
            distance_miles = confirmation.distance_miles,
            total_cost = confirmation.total_cost,
            "delivery cost recalculated"
        );

        Ok(RecalculationSummary {
            order: order.name,
            lines_updated: line_ids.len(),
            confirmation,
        })
    }

    /// Current delivery pricing of the order's first delivery line, with a
    /// freshly computed distance. The line is not touched; coordinates found
    /// by geocoding are stored so later calls skip the lookup.
    ///
    /// # Errors
    ///
    /// Returns config and store errors.
    pub async fn delivery_cost_info(
        &self,
        order_id: i64,
    ) -> Result<Option<DeliveryCostInfo>, PricingError> {
        let order = self.store.load_order(order_id).await?;
        let Some(line) = order.delivery_lines().next() else {
            return Ok(None);
        };

        let settings = load_settings(self.config.as_ref())?;
        let mut customer = match order.customer_id {
            Some(id) => Some(self.store.load_customer(id).await?),
            None => None,
        };
        let stored_coordinate = customer.as_ref().and_then(|c| c.coordinate);
        let distance_miles = self
            .policy
            .price(customer.as_mut(), &settings)
            .await
            .priced()
            .map_or(0.0, |priced| priced.distance_miles);

        if let Some(customer) = &customer {
            self.persist_geocoded(customer, stored_coordinate).await?;
        }

        Ok(Some(DeliveryCostInfo {
            line_id: line.id,
            distance_miles,
            rate_per_mile: settings.rate_per_mile,
            unit_price: line.unit_price,
            calculated: line.pricing.price_locked,
        }))
    }

    /// Price the order's customer and, on success, write the price to each
    /// of `line_ids` and lock them.
    async fn price_and_lock(
        &self,
        order: &Order,
        line_ids: &[i64],
        customer_id: i64,
        settings: &DeliverySettings,
    ) -> Result<PriceConfirmation, PricingError> {
        let mut customer = self.store.load_customer(customer_id).await?;
        let stored_coordinate = customer.coordinate;

        let outcome = self.policy.price(Some(&mut customer), settings).await;
        self.persist_geocoded(&customer, stored_coordinate).await?;

        let priced = outcome.into_result()?;
        let unit_price = to_unit_price(&priced)?;

        self.store.lock_line_prices(line_ids, unit_price).await?;

        tracing::info!(
            order = %order.name,
            customer = %customer.name,
            distance_miles = priced.distance_miles,
            rate_per_mile = priced.rate_per_mile,
            total_cost = priced.total_cost,
            method = %priced.method,
            "delivery cost calculated and locked"
        );

        Ok(PriceConfirmation {
            customer: customer.name,
            distance_miles: priced.distance_miles,
            rate_per_mile: priced.rate_per_mile,
            total_cost: priced.total_cost,
            unit_price,
        })
    }

    /// Stores the customer's coordinate if pricing geocoded a new one.
    async fn persist_geocoded(
        &self,
        customer: &Customer,
        stored: Option<GeoCoordinate>,
    ) -> Result<(), StoreError> {
        match customer.coordinate {
            Some(coordinate) if customer.coordinate != stored => {
                self.store
                    .save_customer_coordinate(customer.id, coordinate)
                    .await
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for PricingLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricingLifecycle")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn to_unit_price(priced: &Priced) -> Result<Decimal, PricingError> {
    Decimal::from_f64(priced.total_cost)
        .map(|d| d.round_dp(PRICE_DECIMALS))
        .ok_or(PricingError::Amount(priced.total_cost))
}
