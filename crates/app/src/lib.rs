//! Cart services, sessions and identity for the Trolley storefront.

pub mod auth;
pub mod context;
pub mod domain;
pub mod sessions;
pub mod settings;
pub mod uuids;

#[cfg(test)]
mod test;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
