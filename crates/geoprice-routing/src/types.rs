//! Response types for the Distance Matrix API.

use serde::Deserialize;

/// Top-level response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct DistanceMatrixResponse {
    /// `"OK"` on success; e.g. `"REQUEST_DENIED"`, `"OVER_QUERY_LIMIT"` otherwise.
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

/// One row per origin.
#[derive(Debug, Clone, Deserialize)]
pub struct MatrixRow {
    #[serde(default)]
    pub elements: Vec<MatrixElement>,
}

/// One element per origin/destination pair.
#[derive(Debug, Clone, Deserialize)]
pub struct MatrixElement {
    /// `"OK"`, `"NOT_FOUND"` or `"ZERO_RESULTS"`.
    pub status: String,
    pub distance: Option<MatrixValue>,
    pub duration: Option<MatrixValue>,
}

/// A `{ "text": ..., "value": ... }` pair. Distance values are meters,
/// duration values are seconds, regardless of the `units` parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct MatrixValue {
    pub text: String,
    pub value: f64,
}
