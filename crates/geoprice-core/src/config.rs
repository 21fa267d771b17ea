//! Key/value configuration lookup and the typed [`DeliverySettings`] loader.
//!
//! Every setting lives under a dotted key (`delivery_cost_calculator.*`) and
//! has a default, so an empty store still yields usable settings. A value
//! that is present but cannot be parsed is reported as
//! [`ConfigError::InvalidValue`].

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::geo::GeoCoordinate;
use crate::settings::{
    DeliverySettings, DEFAULT_CARRIER_MAX_DISTANCE_MILES, DEFAULT_CARRIER_MAX_QUANTITY,
    DEFAULT_DELIVERY_PRODUCT_NAME, DEFAULT_MAX_DISTANCE_MILES, DEFAULT_ORIGIN_LATITUDE,
    DEFAULT_ORIGIN_LONGITUDE, DEFAULT_RATE_PER_MILE, DEFAULT_ROAD_MULTIPLIER,
};

pub const KEY_ORIGIN_LATITUDE: &str = "delivery_cost_calculator.origin_latitude";
pub const KEY_ORIGIN_LONGITUDE: &str = "delivery_cost_calculator.origin_longitude";
pub const KEY_RATE_PER_MILE: &str = "delivery_cost_calculator.rate_per_mile";
pub const KEY_MAX_DISTANCE: &str = "delivery_cost_calculator.max_distance";
pub const KEY_CARRIER_MAX_DISTANCE: &str = "delivery_cost_calculator.gps_carrier_max_distance";
pub const KEY_CARRIER_MAX_QUANTITY: &str = "delivery_cost_calculator.max_order_quantity";
pub const KEY_ROAD_MULTIPLIER: &str = "delivery_cost_calculator.road_multiplier";
pub const KEY_ROUTING_API_KEY: &str = "delivery_cost_calculator.routing_api_key";
pub const KEY_USE_ROUTING_API: &str = "delivery_cost_calculator.use_routing_api";
pub const KEY_DELIVERY_PRODUCT_NAME: &str = "delivery_cost_calculator.delivery_product_name";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("failed to read config file {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Read-only key/value lookup backing [`DeliverySettings`].
pub trait ConfigStore: Send + Sync {
    /// Returns the raw value for `key`, or `None` when it is not set.
    fn get(&self, key: &str) -> Option<String>;
}

/// In-memory store, used by tests and hosts that already hold their settings.
#[derive(Debug, Clone, Default)]
pub struct MapConfigStore {
    values: HashMap<String, String>,
}

impl MapConfigStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }
}

impl ConfigStore for MapConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Reads settings from the process environment.
///
/// `delivery_cost_calculator.rate_per_mile` is looked up as
/// `DELIVERY_COST_CALCULATOR_RATE_PER_MILE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfigStore;

impl EnvConfigStore {
    /// Loads a `.env` file if one exists, then returns the store.
    #[must_use]
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self
    }

    #[must_use]
    pub fn env_var_name(key: &str) -> String {
        key.replace('.', "_").to_uppercase()
    }
}

impl ConfigStore for EnvConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(Self::env_var_name(key)).ok()
    }
}

/// Flat YAML mapping of setting keys to scalar values.
#[derive(Debug, Clone, Default)]
pub struct YamlConfigStore {
    values: HashMap<String, String>,
}

impl YamlConfigStore {
    /// Load a settings file from disk.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or is not a flat
    /// mapping of scalars.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse settings from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the text is not a flat mapping of scalars.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(content)?;
        let mut values = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            let rendered = match value {
                serde_yaml::Value::Null => continue,
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::String(s) => s,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key,
                        value: "<non-scalar>".to_string(),
                        reason: "expected a scalar value".to_string(),
                    })
                }
            };
            values.insert(key, rendered);
        }
        Ok(Self { values })
    }
}

impl ConfigStore for YamlConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Consults each store in order; the first one holding a key wins.
#[derive(Default)]
pub struct LayeredConfigStore {
    layers: Vec<Box<dyn ConfigStore>>,
}

impl LayeredConfigStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn layer(mut self, store: impl ConfigStore + 'static) -> Self {
        self.layers.push(Box::new(store));
        self
    }
}

impl ConfigStore for LayeredConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|store| store.get(key))
    }
}

/// Load a consistent settings snapshot from `store`.
///
/// Each key is read exactly once.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] when a present value cannot be
/// parsed, or when a numeric setting is negative or not finite.
pub fn load_settings(store: &dyn ConfigStore) -> Result<DeliverySettings, ConfigError> {
    build_settings(|key| store.get(key))
}

fn build_settings<F>(lookup: F) -> Result<DeliverySettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let invalid = |key: &str, value: &str, reason: String| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    };

    // Blank values count as unset.
    let present = |key: &str| lookup(key).filter(|raw| !raw.trim().is_empty());

    let parse_f64 = |key: &str, default: f64| -> Result<f64, ConfigError> {
        match present(key) {
            None => Ok(default),
            Some(raw) => {
                let value = raw
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| invalid(key, &raw, e.to_string()))?;
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(invalid(key, &raw, "must be finite".to_string()))
                }
            }
        }
    };

    let parse_non_negative = |key: &str, default: f64| -> Result<f64, ConfigError> {
        let value = parse_f64(key, default)?;
        if value < 0.0 {
            return Err(invalid(key, &value.to_string(), "must not be negative".to_string()));
        }
        Ok(value)
    };

    let parse_u32 = |key: &str, default: u32| -> Result<u32, ConfigError> {
        match present(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|e| invalid(key, &raw, e.to_string())),
        }
    };

    let parse_bool = |key: &str, default: bool| -> Result<bool, ConfigError> {
        match present(key) {
            None => Ok(default),
            Some(raw) => parse_flag(&raw)
                .ok_or_else(|| invalid(key, &raw, "expected true or false".to_string())),
        }
    };

    let origin = GeoCoordinate::new(
        parse_f64(KEY_ORIGIN_LATITUDE, DEFAULT_ORIGIN_LATITUDE)?,
        parse_f64(KEY_ORIGIN_LONGITUDE, DEFAULT_ORIGIN_LONGITUDE)?,
    );
    let rate_per_mile = parse_non_negative(KEY_RATE_PER_MILE, DEFAULT_RATE_PER_MILE)?;
    let max_distance_miles = parse_non_negative(KEY_MAX_DISTANCE, DEFAULT_MAX_DISTANCE_MILES)?;
    let carrier_max_distance_miles =
        parse_non_negative(KEY_CARRIER_MAX_DISTANCE, DEFAULT_CARRIER_MAX_DISTANCE_MILES)?;
    let carrier_max_quantity = parse_u32(KEY_CARRIER_MAX_QUANTITY, DEFAULT_CARRIER_MAX_QUANTITY)?;
    let road_multiplier = parse_non_negative(KEY_ROAD_MULTIPLIER, DEFAULT_ROAD_MULTIPLIER)?;
    let use_external_routing = parse_bool(KEY_USE_ROUTING_API, false)?;
    let routing_api_key = lookup(KEY_ROUTING_API_KEY)
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());
    let delivery_product_name = lookup(KEY_DELIVERY_PRODUCT_NAME)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_DELIVERY_PRODUCT_NAME.to_string());

    Ok(DeliverySettings {
        origin,
        rate_per_mile,
        max_distance_miles,
        road_multiplier,
        use_external_routing,
        routing_api_key,
        carrier_max_distance_miles,
        carrier_max_quantity,
        delivery_product_name,
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
