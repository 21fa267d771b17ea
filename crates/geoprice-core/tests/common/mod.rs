#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use geoprice_core::config::{
    KEY_CARRIER_MAX_DISTANCE, KEY_CARRIER_MAX_QUANTITY, KEY_MAX_DISTANCE, KEY_ORIGIN_LATITUDE,
    KEY_ORIGIN_LONGITUDE, KEY_RATE_PER_MILE,
};
use geoprice_core::{
    Address, Customer, DeliveryPricingPolicy, DistanceEngine, GeoCoordinate, GeocodingError,
    GeocodingGateway, InMemoryOrderStore, MapConfigStore, Order, OrderLine, Product, ProductKind,
};

pub const ORIGIN: GeoCoordinate = GeoCoordinate::new(38.4836, -82.7804);
pub const NEARBY: GeoCoordinate = GeoCoordinate::new(38.5117, -82.7264);
pub const CUSTOMER_ID: i64 = 1;
pub const ORDER_ID: i64 = 100;
pub const WIDGET_LINE: i64 = 1;
pub const DELIVERY_LINE: i64 = 2;

/// Geocoder that places every address at a fixed coordinate and counts calls.
pub struct FixedGeocoder {
    pub coordinate: Option<GeoCoordinate>,
    pub calls: AtomicU32,
}

impl FixedGeocoder {
    pub fn new(coordinate: Option<GeoCoordinate>) -> Self {
        Self {
            coordinate,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodingGateway for FixedGeocoder {
    async fn resolve(&self, _address: &Address) -> Result<Option<GeoCoordinate>, GeocodingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.coordinate)
    }
}

pub fn config() -> MapConfigStore {
    MapConfigStore::new()
        .with(KEY_ORIGIN_LATITUDE, "38.4836")
        .with(KEY_ORIGIN_LONGITUDE, "-82.7804")
        .with(KEY_RATE_PER_MILE, "2.5")
        .with(KEY_MAX_DISTANCE, "75")
        .with(KEY_CARRIER_MAX_DISTANCE, "40")
        .with(KEY_CARRIER_MAX_QUANTITY, "8")
}

pub fn policy(geocoder: Arc<dyn GeocodingGateway>) -> DeliveryPricingPolicy {
    DeliveryPricingPolicy::new(DistanceEngine::multiplier_only(), geocoder)
}

pub fn product(id: i64, name: &str, kind: ProductKind) -> Product {
    Product {
        id,
        name: name.to_string(),
        kind,
        active: true,
    }
}

pub fn delivery_product() -> Product {
    product(50, "Delivery", ProductKind::Service)
}

pub fn customer(coordinate: Option<GeoCoordinate>) -> Customer {
    let mut customer = Customer::new(CUSTOMER_ID, "Ada Lovelace").with_address(Address {
        street: Some("1 Winchester Ave".to_string()),
        city: Some("Ashland".to_string()),
        state: Some("KY".to_string()),
        zip: Some("41101".to_string()),
        country: Some("United States".to_string()),
        ..Address::default()
    });
    customer.coordinate = coordinate;
    customer
}

pub fn order(customer_id: Option<i64>, widget_quantity: f64) -> Order {
    Order {
        id: ORDER_ID,
        name: "SO100".to_string(),
        customer_id,
        shipping_customer_id: None,
        lines: vec![
            OrderLine::new(
                WIDGET_LINE,
                Some(product(10, "Widget", ProductKind::Storable)),
                widget_quantity,
                "Delivery",
            ),
            OrderLine::new(DELIVERY_LINE, Some(delivery_product()), 1.0, "Delivery"),
        ],
    }
}

pub async fn seeded_store(order: Order, customer: Customer) -> Arc<InMemoryOrderStore> {
    let store = Arc::new(InMemoryOrderStore::new());
    store.insert_order(order).await;
    store.insert_customer(customer).await;
    store
}
