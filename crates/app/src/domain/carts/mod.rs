//! Carts

pub mod behaviour;
pub mod cache;
pub mod decorator;
pub mod delivery_info;
pub mod errors;
pub mod events;
mod login;
pub mod providers;
pub mod receiver;
pub mod service;
pub mod validation;

pub use errors::{CartBehaviourError, CartReceiverError, CartServiceError, message_codes};
pub use receiver::CartReceiverService;
pub use service::{CartMutation, CartService};
