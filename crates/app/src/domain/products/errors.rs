//! Product catalog errors.

use std::io;

use thiserror::Error;

use crate::BoxError;

#[derive(Debug, Error)]
pub enum ProductServiceError {
    #[error("product not found")]
    NotFound,

    #[error("product catalog unavailable")]
    Unavailable(#[source] BoxError),

    #[error("failed to read product catalog")]
    Io(#[from] io::Error),

    #[error("failed to parse product catalog")]
    Parse(#[from] serde_json::Error),
}
