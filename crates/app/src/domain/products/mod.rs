//! Product catalog

mod errors;
mod service;

pub use errors::ProductServiceError;
pub use service::*;
