use thiserror::Error;

use crate::config::ConfigError;
use crate::pricing::Rejection;
use crate::store::StoreError;

/// Errors surfaced by the interactive pricing paths (line added,
/// recalculate).
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("cannot calculate delivery cost: {0}")]
    Rejected(#[from] Rejection),

    #[error("cannot calculate delivery cost for order {order}: no customer selected")]
    NoCustomer { order: String },

    #[error("no delivery line found in order {order}; add the delivery product first")]
    NoDeliveryLine { order: String },

    #[error("delivery cost {0} cannot be stored as a currency amount")]
    Amount(f64),
}
