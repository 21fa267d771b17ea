//! Distance-based delivery pricing.
//!
//! Coordinates are validated ([`geo`]), turned into a road distance
//! ([`distance`]), priced against [`DeliverySettings`] ([`pricing`]) and then
//! either offered at checkout ([`carrier`]) or written to an order line that
//! locks after the first successful calculation ([`lifecycle`]).

pub mod carrier;
pub mod config;
pub mod customer;
pub mod distance;
pub mod error;
pub mod gateway;
pub mod geo;
pub mod lifecycle;
pub mod order;
pub mod pricing;
pub mod settings;
pub mod store;

pub use carrier::{
    CarrierAvailabilityRule, GpsCarrier, RateQuote, ShipmentConfirmation, ShippingMethod,
};
pub use config::{
    load_settings, ConfigError, ConfigStore, EnvConfigStore, LayeredConfigStore, MapConfigStore,
    YamlConfigStore,
};
pub use customer::{Address, Customer};
pub use distance::{
    haversine_miles, DistanceEngine, DistanceError, DistanceMethod, DistanceResult, NoRouting,
    RoutingError, RoutingLookup,
};
pub use error::PricingError;
pub use gateway::{GeocodingError, GeocodingGateway, NoGeocoding};
pub use geo::{validate, GeoCoordinate, ValidationError};
pub use lifecycle::{
    CreationOutcome, DeliveryCostInfo, LineFeedback, LineState, PriceConfirmation,
    PricingLifecycle, RecalculationSummary,
};
pub use order::{Order, OrderLine, OrderLinePricingState, Picking, Product, ProductKind};
pub use pricing::{DeliveryPricingPolicy, Priced, PricingOutcome, Rejection, RejectionReason};
pub use settings::DeliverySettings;
pub use store::{InMemoryOrderStore, OrderStore, StoreError};
