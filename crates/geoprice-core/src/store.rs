//! Persistence port for orders and customers, plus an in-memory
//! implementation for tests and the CLI.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::customer::Customer;
use crate::geo::GeoCoordinate;
use crate::order::Order;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("order {0} not found")]
    OrderNotFound(i64),

    #[error("order line {0} not found")]
    LineNotFound(i64),

    #[error("customer {0} not found")]
    CustomerNotFound(i64),

    #[error("store backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn load_order(&self, order_id: i64) -> Result<Order, StoreError>;

    async fn load_customer(&self, customer_id: i64) -> Result<Customer, StoreError>;

    async fn save_customer_coordinate(
        &self,
        customer_id: i64,
        coordinate: GeoCoordinate,
    ) -> Result<(), StoreError>;

    /// Writes `unit_price` to every line in `line_ids` and locks them, all or
    /// nothing: on error no line is changed.
    async fn lock_line_prices(
        &self,
        line_ids: &[i64],
        unit_price: Decimal,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct Tables {
    orders: HashMap<i64, Order>,
    customers: HashMap<i64, Customer>,
}

impl Tables {
    fn line_mut(&mut self, line_id: i64) -> Result<&mut crate::order::OrderLine, StoreError> {
        self.orders
            .values_mut()
            .flat_map(|order| order.lines.iter_mut())
            .find(|line| line.id == line_id)
            .ok_or(StoreError::LineNotFound(line_id))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    tables: Mutex<Tables>,
}

impl InMemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_order(&self, order: Order) {
        self.tables.lock().await.orders.insert(order.id, order);
    }

    pub async fn insert_customer(&self, customer: Customer) {
        self.tables.lock().await.customers.insert(customer.id, customer);
    }

    /// Applies `f` to a stored customer, e.g. to simulate an address edit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CustomerNotFound`] if the customer is absent.
    pub async fn update_customer<F>(&self, customer_id: i64, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Customer) + Send,
    {
        let mut tables = self.tables.lock().await;
        let customer = tables
            .customers
            .get_mut(&customer_id)
            .ok_or(StoreError::CustomerNotFound(customer_id))?;
        f(customer);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn load_order(&self, order_id: i64) -> Result<Order, StoreError> {
        self.tables
            .lock()
            .await
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::OrderNotFound(order_id))
    }

    async fn load_customer(&self, customer_id: i64) -> Result<Customer, StoreError> {
        self.tables
            .lock()
            .await
            .customers
            .get(&customer_id)
            .cloned()
            .ok_or(StoreError::CustomerNotFound(customer_id))
    }

    async fn save_customer_coordinate(
        &self,
        customer_id: i64,
        coordinate: GeoCoordinate,
    ) -> Result<(), StoreError> {
        self.update_customer(customer_id, |c| c.coordinate = Some(coordinate))
            .await
    }

    async fn lock_line_prices(
        &self,
        line_ids: &[i64],
        unit_price: Decimal,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        for &line_id in line_ids {
            tables.line_mut(line_id)?;
        }
        for &line_id in line_ids {
            let line = tables.line_mut(line_id)?;
            line.unit_price = unit_price;
            line.pricing.price_locked = true;
        }
        Ok(())
    }
}
