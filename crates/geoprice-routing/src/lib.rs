//! Driving-distance lookups against a Distance Matrix style HTTP API.

pub mod client;
pub mod error;
pub mod types;

pub use client::{DistanceMatrixClient, DEFAULT_TIMEOUT_SECS, METERS_TO_MILES};
pub use error::RoutingClientError;
pub use types::{DistanceMatrixResponse, MatrixElement, MatrixRow, MatrixValue};
