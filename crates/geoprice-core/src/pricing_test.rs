use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use super::*;
use crate::customer::Address;
use crate::distance::{RoutingError, RoutingLookup};
use crate::gateway::{GeocodingError, NoGeocoding};
use crate::geo::GeoCoordinate;

struct FixedRouting(f64);

#[async_trait]
impl RoutingLookup for FixedRouting {
    async fn driving_distance_miles(
        &self,
        _origin: GeoCoordinate,
        _destination: GeoCoordinate,
        _api_key: Option<&str>,
    ) -> Result<f64, RoutingError> {
        Ok(self.0)
    }
}

enum GeocoderReply {
    Found(GeoCoordinate),
    Nothing,
    Fails,
}

struct StubGeocoder {
    reply: GeocoderReply,
    calls: AtomicU32,
}

impl StubGeocoder {
    fn new(reply: GeocoderReply) -> Self {
        Self {
            reply,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl GeocodingGateway for StubGeocoder {
    async fn resolve(&self, _address: &Address) -> Result<Option<GeoCoordinate>, GeocodingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            GeocoderReply::Found(coord) => Ok(Some(coord)),
            GeocoderReply::Nothing => Ok(None),
            GeocoderReply::Fails => Err(GeocodingError("service unavailable".to_string())),
        }
    }
}

fn routed_policy(miles: f64) -> DeliveryPricingPolicy {
    DeliveryPricingPolicy::new(
        DistanceEngine::new(Arc::new(FixedRouting(miles))),
        Arc::new(NoGeocoding),
    )
}

fn routed_settings(rate_per_mile: f64, max_distance_miles: f64) -> DeliverySettings {
    DeliverySettings {
        rate_per_mile,
        max_distance_miles,
        use_external_routing: true,
        routing_api_key: Some("key".to_string()),
        ..DeliverySettings::default()
    }
}

fn located_customer() -> Customer {
    Customer::new(7, "Ada Lovelace").with_coordinate(GeoCoordinate::new(38.5117, -82.7264))
}

fn rejection_of(outcome: PricingOutcome) -> Rejection {
    match outcome {
        PricingOutcome::Rejected(rejection) => rejection,
        PricingOutcome::Priced(priced) => panic!("expected rejection, got {priced:?}"),
    }
}

#[tokio::test]
async fn prices_distance_times_rate() {
    let policy = routed_policy(10.0);
    let mut customer = located_customer();
    let outcome = policy
        .price(Some(&mut customer), &routed_settings(2.5, 75.0))
        .await;
    let priced = outcome.into_result().unwrap();
    assert!((priced.distance_miles - 10.0).abs() < f64::EPSILON);
    assert!((priced.rate_per_mile - 2.5).abs() < f64::EPSILON);
    assert!((priced.total_cost - 25.0).abs() < f64::EPSILON);
    assert_eq!(priced.method, DistanceMethod::ExternalRouting);
}

#[tokio::test]
async fn rejects_beyond_max_distance() {
    let policy = routed_policy(76.0);
    let mut customer = located_customer();
    let rejection = rejection_of(
        policy
            .price(Some(&mut customer), &routed_settings(2.5, 75.0))
            .await,
    );
    assert_eq!(rejection.reason, RejectionReason::OutOfRange);
    assert!(rejection.detail.contains("76.00"), "{}", rejection.detail);
    assert!(rejection.detail.contains("75.00"), "{}", rejection.detail);
    assert!(rejection.detail.contains("Ada Lovelace"), "{}", rejection.detail);
}

#[tokio::test]
async fn distance_equal_to_ceiling_is_priced() {
    let policy = routed_policy(75.0);
    let mut customer = located_customer();
    let outcome = policy
        .price(Some(&mut customer), &routed_settings(1.0, 75.0))
        .await;
    assert!(outcome.priced().is_some());
}

#[tokio::test]
async fn rejects_missing_customer() {
    let policy = routed_policy(10.0);
    let rejection = rejection_of(policy.price(None, &routed_settings(2.5, 75.0)).await);
    assert_eq!(rejection.reason, RejectionReason::NoCustomer);
}

#[tokio::test]
async fn geocodes_customer_without_coordinates() {
    let geocoder = Arc::new(StubGeocoder::new(GeocoderReply::Found(GeoCoordinate::new(
        38.5117, -82.7264,
    ))));
    let policy = DeliveryPricingPolicy::new(DistanceEngine::multiplier_only(), geocoder.clone());
    let mut customer = Customer::new(3, "Grace Hopper");

    let outcome = policy
        .price(Some(&mut customer), &DeliverySettings::default())
        .await;

    assert!(outcome.priced().is_some(), "{outcome:?}");
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    assert_eq!(customer.coordinate, Some(GeoCoordinate::new(38.5117, -82.7264)));
}

#[tokio::test]
async fn does_not_geocode_located_customer() {
    let geocoder = Arc::new(StubGeocoder::new(GeocoderReply::Fails));
    let policy = DeliveryPricingPolicy::new(DistanceEngine::multiplier_only(), geocoder.clone());
    let mut customer = located_customer();
    let outcome = policy
        .price(Some(&mut customer), &DeliverySettings::default())
        .await;
    assert!(outcome.priced().is_some());
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn geocoding_with_no_result_is_rejected() {
    let policy = DeliveryPricingPolicy::new(
        DistanceEngine::multiplier_only(),
        Arc::new(StubGeocoder::new(GeocoderReply::Nothing)),
    );
    let mut customer = Customer::new(3, "Grace Hopper").with_address(Address {
        city: Some("Ashland".to_string()),
        zip: Some("41101".to_string()),
        ..Address::default()
    });
    let rejection = rejection_of(
        policy
            .price(Some(&mut customer), &DeliverySettings::default())
            .await,
    );
    assert_eq!(rejection.reason, RejectionReason::GeocodingFailed);
    assert!(rejection.detail.contains("city, zip"), "{}", rejection.detail);
    assert!(rejection.detail.contains("Grace Hopper"));
    assert!(customer.coordinate.is_none());
}

#[tokio::test]
async fn geocoding_error_is_rejected_like_no_result() {
    let policy = DeliveryPricingPolicy::new(
        DistanceEngine::multiplier_only(),
        Arc::new(StubGeocoder::new(GeocoderReply::Fails)),
    );
    let mut customer = Customer::new(3, "Grace Hopper");
    let rejection = rejection_of(
        policy
            .price(Some(&mut customer), &DeliverySettings::default())
            .await,
    );
    assert_eq!(rejection.reason, RejectionReason::GeocodingFailed);
    assert!(rejection.detail.contains("service unavailable"));
    assert!(rejection.detail.contains("address fields present: none"));
}

#[tokio::test]
async fn geocoder_returning_zero_fix_is_rejected() {
    let policy = DeliveryPricingPolicy::new(
        DistanceEngine::multiplier_only(),
        Arc::new(StubGeocoder::new(GeocoderReply::Found(GeoCoordinate::new(0.0, 0.0)))),
    );
    let mut customer = Customer::new(3, "Grace Hopper");
    let rejection = rejection_of(
        policy
            .price(Some(&mut customer), &DeliverySettings::default())
            .await,
    );
    assert_eq!(rejection.reason, RejectionReason::GeocodingFailed);
}

#[tokio::test]
async fn invalid_stored_coordinates_are_rejected_with_numbers() {
    let policy = routed_policy(10.0);
    let mut customer =
        Customer::new(9, "Alan Turing").with_coordinate(GeoCoordinate::new(45.0, 200.0));
    let rejection = rejection_of(
        policy
            .price(Some(&mut customer), &routed_settings(2.5, 75.0))
            .await,
    );
    assert_eq!(rejection.reason, RejectionReason::InvalidCoordinates);
    assert!(rejection.detail.contains("longitude"), "{}", rejection.detail);
    assert!(rejection.detail.contains("45"), "{}", rejection.detail);
    assert!(rejection.detail.contains("200"), "{}", rejection.detail);
}

#[tokio::test]
async fn impossible_magnitude_from_geocoder_is_invalid() {
    let policy = DeliveryPricingPolicy::new(
        DistanceEngine::multiplier_only(),
        Arc::new(StubGeocoder::new(GeocoderReply::Found(GeoCoordinate::new(1001.0, 5.0)))),
    );
    let mut customer = Customer::new(3, "Grace Hopper");
    let rejection = rejection_of(
        policy
            .price(Some(&mut customer), &DeliverySettings::default())
            .await,
    );
    assert_eq!(rejection.reason, RejectionReason::InvalidCoordinates);
}

#[tokio::test]
async fn non_finite_distance_is_calculation_error() {
    let policy =
        DeliveryPricingPolicy::new(DistanceEngine::multiplier_only(), Arc::new(NoGeocoding));
    let settings = DeliverySettings {
        road_multiplier: f64::NAN,
        ..DeliverySettings::default()
    };
    let mut customer = located_customer();
    let rejection = rejection_of(policy.price(Some(&mut customer), &settings).await);
    assert_eq!(rejection.reason, RejectionReason::CalculationError);
}

#[tokio::test]
async fn pricing_twice_is_idempotent() {
    let policy =
        DeliveryPricingPolicy::new(DistanceEngine::multiplier_only(), Arc::new(NoGeocoding));
    let settings = DeliverySettings::default();
    let mut customer = located_customer();
    let first = policy.price(Some(&mut customer), &settings).await;
    let second = policy.price(Some(&mut customer), &settings).await;
    assert!(first.priced().is_some());
    assert_eq!(first, second);
}
