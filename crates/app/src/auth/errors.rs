//! Auth service errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("token not found")]
    NotFound,

    #[error("invalid token pair {0:?}, expected token=subject")]
    InvalidTokenPair(String),
}
