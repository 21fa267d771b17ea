//! Plain data views of the host's orders, lines, products and pickings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Service,
    Consumable,
    Storable,
}

impl ProductKind {
    /// Physical goods count towards the carrier's quantity ceiling.
    #[must_use]
    pub fn is_physical(self) -> bool {
        matches!(self, ProductKind::Consumable | ProductKind::Storable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub kind: ProductKind,
    pub active: bool,
}

impl Product {
    /// True for an active service product whose trimmed name matches
    /// `marker` case-insensitively.
    #[must_use]
    pub fn is_delivery_product(&self, marker: &str) -> bool {
        self.active
            && self.kind == ProductKind::Service
            && self.name.trim().to_lowercase() == marker.trim().to_lowercase()
    }
}

/// Per-line pricing flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLinePricingState {
    pub is_delivery_line: bool,
    pub price_locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub product: Option<Product>,
    pub quantity: f64,
    pub unit_price: Decimal,
    pub pricing: OrderLinePricingState,
}

impl OrderLine {
    #[must_use]
    pub fn new(id: i64, product: Option<Product>, quantity: f64, marker: &str) -> Self {
        let mut line = Self {
            id,
            product: None,
            quantity,
            unit_price: Decimal::ZERO,
            pricing: OrderLinePricingState::default(),
        };
        line.set_product(product, marker);
        line
    }

    /// Replace the product and recompute the delivery-line flag.
    pub fn set_product(&mut self, product: Option<Product>, marker: &str) {
        self.product = product;
        self.refresh_delivery_flag(marker);
    }

    /// Recompute `is_delivery_line` after the product's name, kind or
    /// active flag changed.
    pub fn refresh_delivery_flag(&mut self, marker: &str) {
        self.pricing.is_delivery_line = self
            .product
            .as_ref()
            .is_some_and(|p| p.is_delivery_product(marker));
    }

    #[must_use]
    pub fn is_physical(&self) -> bool {
        self.product.as_ref().is_some_and(|p| p.kind.is_physical())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub name: String,
    /// Ordering customer.
    pub customer_id: Option<i64>,
    /// Delivery address; the carrier falls back to `customer_id` when unset.
    pub shipping_customer_id: Option<i64>,
    pub lines: Vec<OrderLine>,
}

impl Order {
    #[must_use]
    pub fn physical_quantity(&self) -> f64 {
        self.lines
            .iter()
            .filter(|line| line.is_physical())
            .map(|line| line.quantity)
            .sum()
    }

    pub fn delivery_lines(&self) -> impl Iterator<Item = &OrderLine> {
        self.lines.iter().filter(|line| line.pricing.is_delivery_line)
    }

    #[must_use]
    pub fn line(&self, line_id: i64) -> Option<&OrderLine> {
        self.lines.iter().find(|line| line.id == line_id)
    }

    #[must_use]
    pub fn delivery_customer_id(&self) -> Option<i64> {
        self.shipping_customer_id.or(self.customer_id)
    }
}

/// An outgoing delivery for a sale order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picking {
    pub id: i64,
    pub name: String,
    pub order_id: Option<i64>,
    pub tracking_ref: Option<String>,
}
