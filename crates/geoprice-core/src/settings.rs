use crate::geo::GeoCoordinate;

pub const DEFAULT_ORIGIN_LATITUDE: f64 = 38.335_36;
pub const DEFAULT_ORIGIN_LONGITUDE: f64 = -82.781_552_7;
pub const DEFAULT_RATE_PER_MILE: f64 = 3.0;
pub const DEFAULT_MAX_DISTANCE_MILES: f64 = 100.0;
pub const DEFAULT_CARRIER_MAX_DISTANCE_MILES: f64 = 60.0;
pub const DEFAULT_CARRIER_MAX_QUANTITY: u32 = 8;
pub const DEFAULT_ROAD_MULTIPLIER: f64 = 1.0;
pub const DEFAULT_DELIVERY_PRODUCT_NAME: &str = "Delivery";

/// Pricing parameters for a single calculation.
///
/// Loaded once per pricing call through [`crate::config::load_settings`] so
/// a calculation never sees a mix of old and new values.
#[derive(Clone, PartialEq)]
pub struct DeliverySettings {
    pub origin: GeoCoordinate,
    pub rate_per_mile: f64,
    pub max_distance_miles: f64,
    pub road_multiplier: f64,
    pub use_external_routing: bool,
    pub routing_api_key: Option<String>,
    pub carrier_max_distance_miles: f64,
    pub carrier_max_quantity: u32,
    /// Display name that marks a service product as the delivery product.
    pub delivery_product_name: String,
}

impl DeliverySettings {
    /// Copy of these settings with the carrier's distance ceiling in place of
    /// the general one.
    #[must_use]
    pub fn for_carrier(&self) -> Self {
        Self {
            max_distance_miles: self.carrier_max_distance_miles,
            ..self.clone()
        }
    }
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            origin: GeoCoordinate::new(DEFAULT_ORIGIN_LATITUDE, DEFAULT_ORIGIN_LONGITUDE),
            rate_per_mile: DEFAULT_RATE_PER_MILE,
            max_distance_miles: DEFAULT_MAX_DISTANCE_MILES,
            road_multiplier: DEFAULT_ROAD_MULTIPLIER,
            use_external_routing: false,
            routing_api_key: None,
            carrier_max_distance_miles: DEFAULT_CARRIER_MAX_DISTANCE_MILES,
            carrier_max_quantity: DEFAULT_CARRIER_MAX_QUANTITY,
            delivery_product_name: DEFAULT_DELIVERY_PRODUCT_NAME.to_string(),
        }
    }
}

impl std::fmt::Debug for DeliverySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliverySettings")
            .field("origin", &self.origin)
            .field("rate_per_mile", &self.rate_per_mile)
            .field("max_distance_miles", &self.max_distance_miles)
            .field("road_multiplier", &self.road_multiplier)
            .field("use_external_routing", &self.use_external_routing)
            .field(
                "routing_api_key",
                &self.routing_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "carrier_max_distance_miles",
                &self.carrier_max_distance_miles,
            )
            .field("carrier_max_quantity", &self.carrier_max_quantity)
            .field("delivery_product_name", &self.delivery_product_name)
            .finish()
    }
}
