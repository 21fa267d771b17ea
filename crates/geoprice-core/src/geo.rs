//! Geographic coordinates and the validator that decides whether a
//! coordinate pair is a real position fix.
//!
//! Geocoders in the wild report "no fix" as `(0, 0)` or as sentinel values
//! far outside the valid range, so both are rejected before any distance
//! math runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Any component beyond this magnitude is a geocoder failure marker rather
/// than a coordinate that is merely out of range.
const IMPOSSIBLE_MAGNITUDE: f64 = 1000.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `Ok(self)` when the pair passes [`validate`].
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] that applies.
    pub fn validated(self) -> Result<Self, ValidationError> {
        match validate(Some(self.latitude), Some(self.longitude)) {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

impl std::fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Reasons a coordinate pair is not usable for pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("coordinates are zero or missing")]
    ZeroOrEmpty,

    #[error("coordinates have an impossible magnitude (geocoding failure marker)")]
    ImpossibleMagnitude,

    #[error("latitude is outside [-90, 90]")]
    LatOutOfRange,

    #[error("longitude is outside [-180, 180]")]
    LonOutOfRange,
}

/// Validate a raw latitude/longitude pair.
///
/// Checks run in a fixed order and the first failure wins:
/// zero/missing, impossible magnitude, latitude range, longitude range.
/// A NaN component never satisfies a range check and is reported as out of
/// range.
#[must_use]
pub fn validate(latitude: Option<f64>, longitude: Option<f64>) -> Option<ValidationError> {
    let (Some(lat), Some(lon)) = (latitude, longitude) else {
        return Some(ValidationError::ZeroOrEmpty);
    };

    if lat == 0.0 && lon == 0.0 {
        return Some(ValidationError::ZeroOrEmpty);
    }
    if lat.abs() > IMPOSSIBLE_MAGNITUDE || lon.abs() > IMPOSSIBLE_MAGNITUDE {
        return Some(ValidationError::ImpossibleMagnitude);
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Some(ValidationError::LatOutOfRange);
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Some(ValidationError::LonOutOfRange);
    }
    None
}

/// Validate an optional coordinate, treating `None` as missing.
#[must_use]
pub fn validate_coordinate(coord: Option<GeoCoordinate>) -> Option<ValidationError> {
    validate(coord.map(|c| c.latitude), coord.map(|c| c.longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_origin_of_the_grid() {
        assert_eq!(validate(Some(0.0), Some(0.0)), Some(ValidationError::ZeroOrEmpty));
    }

    #[test]
    fn rejects_missing_component() {
        assert_eq!(validate(None, Some(-82.7)), Some(ValidationError::ZeroOrEmpty));
        assert_eq!(validate(Some(38.5), None), Some(ValidationError::ZeroOrEmpty));
        assert_eq!(validate_coordinate(None), Some(ValidationError::ZeroOrEmpty));
    }

    #[test]
    fn rejects_impossible_magnitude() {
        assert_eq!(
            validate(Some(1001.0), Some(0.0)),
            Some(ValidationError::ImpossibleMagnitude)
        );
        assert_eq!(
            validate(Some(10.0), Some(-5000.0)),
            Some(ValidationError::ImpossibleMagnitude)
        );
    }

    #[test]
    fn rejects_latitude_out_of_range() {
        assert_eq!(
            validate(Some(91.0), Some(10.0)),
            Some(ValidationError::LatOutOfRange)
        );
    }

    #[test]
    fn rejects_longitude_out_of_range() {
        assert_eq!(
            validate(Some(45.0), Some(200.0)),
            Some(ValidationError::LonOutOfRange)
        );
    }

    #[test]
    fn magnitude_check_runs_before_range_checks() {
        // 1001 is also an invalid latitude; the magnitude marker must win.
        assert_eq!(
            validate(Some(1001.0), Some(500.0)),
            Some(ValidationError::ImpossibleMagnitude)
        );
    }

    #[test]
    fn accepts_real_fix() {
        assert_eq!(validate(Some(38.5), Some(-82.7)), None);
        assert!(GeoCoordinate::new(38.5, -82.7).validated().is_ok());
    }

    #[test]
    fn accepts_single_zero_component() {
        // The equator and the prime meridian are real places.
        assert_eq!(validate(Some(0.0), Some(-82.7)), None);
        assert_eq!(validate(Some(51.48), Some(0.0)), None);
    }

    #[test]
    fn accepts_range_boundaries() {
        assert_eq!(validate(Some(90.0), Some(180.0)), None);
        assert_eq!(validate(Some(-90.0), Some(-180.0)), None);
    }

    #[test]
    fn nan_is_out_of_range() {
        assert_eq!(
            validate(Some(f64::NAN), Some(10.0)),
            Some(ValidationError::LatOutOfRange)
        );
    }
}
