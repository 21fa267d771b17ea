use serde::{Deserialize, Serialize};

use crate::geo::GeoCoordinate;

/// Postal address parts as held by the host's customer record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub street2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
}

impl Address {
    fn parts(&self) -> [(&'static str, Option<&str>); 6] {
        [
            ("street", self.street.as_deref()),
            ("street2", self.street2.as_deref()),
            ("city", self.city.as_deref()),
            ("state", self.state.as_deref()),
            ("zip", self.zip.as_deref()),
            ("country", self.country.as_deref()),
        ]
    }

    /// Non-empty parts joined with `", "`.
    #[must_use]
    pub fn display(&self) -> String {
        self.parts()
            .into_iter()
            .filter_map(|(_, v)| v.map(str::trim).filter(|s| !s.is_empty()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Names of the parts that carry a value.
    #[must_use]
    pub fn present_fields(&self) -> Vec<&'static str> {
        self.parts()
            .into_iter()
            .filter(|(_, v)| v.is_some_and(|s| !s.trim().is_empty()))
            .map(|(name, _)| name)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub address: Address,
    /// Stored geocode, if the customer has been located.
    pub coordinate: Option<GeoCoordinate>,
}

impl Customer {
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            address: Address::default(),
            coordinate: None,
        }
    }

    #[must_use]
    pub fn with_coordinate(mut self, coordinate: GeoCoordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    /// A stored coordinate only counts when both components are non-zero.
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.coordinate
            .is_some_and(|c| c.latitude != 0.0 && c.longitude != 0.0)
    }
}
