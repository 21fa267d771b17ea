//! Checkout carrier availability and shipment handlers.

mod common;

use std::sync::Arc;

use common::*;
use geoprice_core::config::KEY_RATE_PER_MILE;
use geoprice_core::{
    haversine_miles, CarrierAvailabilityRule, DeliverySettings, GeoCoordinate, GpsCarrier,
    MapConfigStore, NoGeocoding, OrderStore, Picking, ShippingMethod,
};

fn carrier_with(
    store: Arc<geoprice_core::InMemoryOrderStore>,
    config: MapConfigStore,
) -> GpsCarrier {
    GpsCarrier::new(policy(Arc::new(NoGeocoding)), Arc::new(config), store)
}

fn settings() -> DeliverySettings {
    DeliverySettings {
        origin: ORIGIN,
        rate_per_mile: 2.5,
        max_distance_miles: 75.0,
        carrier_max_distance_miles: 40.0,
        carrier_max_quantity: 8,
        ..DeliverySettings::default()
    }
}

#[tokio::test]
async fn offers_exact_price_below_ceilings() {
    let store = seeded_store(order(Some(CUSTOMER_ID), 3.0), customer(Some(NEARBY))).await;
    let carrier = carrier_with(store.clone(), config());
    let order = store.load_order(ORDER_ID).await.unwrap();

    let quote = carrier.rate_shipment(&order).await;

    assert!(quote.available);
    assert!((quote.price - haversine_miles(ORIGIN, NEARBY) * 2.5).abs() < 1e-12);
    assert!(quote.message.is_none());
}

#[tokio::test]
async fn quantity_at_ceiling_is_unavailable() {
    let rule = CarrierAvailabilityRule::new(policy(Arc::new(NoGeocoding)));
    let mut located = customer(Some(NEARBY));

    let at_ceiling = rule
        .is_available_and_price(&order(Some(CUSTOMER_ID), 8.0), Some(&mut located), &settings())
        .await;
    assert!(at_ceiling.is_none());

    let below_ceiling = rule
        .is_available_and_price(&order(Some(CUSTOMER_ID), 7.0), Some(&mut located), &settings())
        .await;
    assert!(below_ceiling.is_some());
}

#[tokio::test]
async fn quantity_check_happens_before_geocoding() {
    let geocoder = Arc::new(FixedGeocoder::new(Some(NEARBY)));
    let rule = CarrierAvailabilityRule::new(policy(geocoder.clone()));
    let mut unlocated = customer(None);

    let result = rule
        .is_available_and_price(&order(Some(CUSTOMER_ID), 9.0), Some(&mut unlocated), &settings())
        .await;

    assert!(result.is_none());
    assert_eq!(geocoder.calls(), 0);
}

#[tokio::test]
async fn uses_carrier_distance_ceiling() {
    // ~56 miles: inside the general 75-mile limit but beyond the carrier's 40.
    let mut customer = customer(Some(GeoCoordinate::new(39.30, -82.7804)));
    let rule = CarrierAvailabilityRule::new(policy(Arc::new(NoGeocoding)));

    let result = rule
        .is_available_and_price(&order(Some(CUSTOMER_ID), 1.0), Some(&mut customer), &settings())
        .await;

    assert!(result.is_none());
}

#[tokio::test]
async fn geocoding_failure_is_silently_unavailable() {
    let store = seeded_store(order(Some(CUSTOMER_ID), 1.0), customer(None)).await;
    let carrier = carrier_with(store.clone(), config());
    let order = store.load_order(ORDER_ID).await.unwrap();

    let quote = carrier.rate_shipment(&order).await;

    assert!(!quote.available);
    assert!(quote.price.abs() < f64::EPSILON);
    assert!(quote.message.is_none());
}

#[tokio::test]
async fn missing_customer_is_unavailable() {
    let store = seeded_store(order(None, 1.0), customer(Some(NEARBY))).await;
    let carrier = carrier_with(store.clone(), config());
    let order = store.load_order(ORDER_ID).await.unwrap();

    assert!(!carrier.rate_shipment(&order).await.available);
}

#[tokio::test]
async fn bad_settings_make_carrier_unavailable() {
    let store = seeded_store(order(Some(CUSTOMER_ID), 1.0), customer(Some(NEARBY))).await;
    let carrier = carrier_with(store.clone(), config().with(KEY_RATE_PER_MILE, "free"));
    let order = store.load_order(ORDER_ID).await.unwrap();

    assert!(!carrier.rate_shipment(&order).await.available);
}

#[tokio::test]
async fn prices_against_shipping_customer() {
    let mut shipped_elsewhere = order(Some(CUSTOMER_ID), 1.0);
    shipped_elsewhere.shipping_customer_id = Some(2);
    let store = seeded_store(shipped_elsewhere, customer(Some(NEARBY))).await;
    let mut recipient = customer(Some(GeoCoordinate::new(40.7128, -74.0060)));
    recipient.id = 2;
    store.insert_customer(recipient).await;
    let carrier = carrier_with(store.clone(), config());
    let order = store.load_order(ORDER_ID).await.unwrap();

    assert!(!carrier.rate_shipment(&order).await.available);
}

#[tokio::test]
async fn rating_persists_geocoded_coordinates() {
    let store = seeded_store(order(Some(CUSTOMER_ID), 1.0), customer(None)).await;
    let carrier = GpsCarrier::new(
        policy(Arc::new(FixedGeocoder::new(Some(NEARBY)))),
        Arc::new(config()),
        store.clone(),
    );
    let order = store.load_order(ORDER_ID).await.unwrap();

    assert!(carrier.rate_shipment(&order).await.available);
    let stored = store.load_customer(CUSTOMER_ID).await.unwrap();
    assert_eq!(stored.coordinate, Some(NEARBY));
}

#[tokio::test]
async fn send_shipping_assigns_local_tracking_and_price() {
    let store = seeded_store(order(Some(CUSTOMER_ID), 1.0), customer(Some(NEARBY))).await;
    let carrier = carrier_with(store.clone(), config());
    let pickings = vec![
        Picking {
            id: 1,
            name: "WH/OUT/00001".to_string(),
            order_id: Some(ORDER_ID),
            tracking_ref: None,
        },
        Picking {
            id: 2,
            name: "WH/OUT/00002".to_string(),
            order_id: None,
            tracking_ref: None,
        },
    ];

    let confirmations = carrier.send_shipping(&pickings).await;

    assert_eq!(confirmations.len(), 2);
    assert_eq!(confirmations[0].tracking_number, "LOCAL-WH/OUT/00001");
    assert!((confirmations[0].exact_price - haversine_miles(ORIGIN, NEARBY) * 2.5).abs() < 1e-12);
    assert_eq!(confirmations[1].tracking_number, "LOCAL-WH/OUT/00002");
    assert!(confirmations[1].exact_price.abs() < f64::EPSILON);
}

#[tokio::test]
async fn cancel_clears_tracking_and_no_tracking_link() {
    let store = seeded_store(order(Some(CUSTOMER_ID), 1.0), customer(Some(NEARBY))).await;
    let carrier = carrier_with(store, config());
    let mut picking = Picking {
        id: 1,
        name: "WH/OUT/00001".to_string(),
        order_id: Some(ORDER_ID),
        tracking_ref: Some("LOCAL-WH/OUT/00001".to_string()),
    };

    assert!(carrier.tracking_link(&picking).is_none());
    carrier.cancel_shipment(&mut picking);
    assert!(picking.tracking_ref.is_none());
    assert_eq!(carrier.code(), "gps");
}
