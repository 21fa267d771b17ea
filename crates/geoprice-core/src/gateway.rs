//! Port for the external address-to-coordinate geocoder.

use async_trait::async_trait;
use thiserror::Error;

use crate::customer::Address;
use crate::geo::GeoCoordinate;

/// Transport-level failure reported by a geocoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("geocoding failed: {0}")]
pub struct GeocodingError(pub String);

/// Resolves an address to coordinates.
///
/// `Ok(None)` and `Err(_)` are both treated as "could not geocode" by the
/// pricing policy; the distinction only matters for diagnostics.
#[async_trait]
pub trait GeocodingGateway: Send + Sync {
    async fn resolve(&self, address: &Address) -> Result<Option<GeoCoordinate>, GeocodingError>;
}

/// Gateway for hosts without a geocoder: every lookup comes back empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeocoding;

#[async_trait]
impl GeocodingGateway for NoGeocoding {
    async fn resolve(&self, _address: &Address) -> Result<Option<GeoCoordinate>, GeocodingError> {
        Ok(None)
    }
}
