//! Cart and item validation.

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use thiserror::Error;
use trolley::{commands::AddRequest, decorated::DecoratedCart, products::Product};

use crate::sessions::Session;

/// Outcome of validating a whole cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartValidationResult {
    pub valid: bool,
    pub reasons: Vec<String>,
}

impl CartValidationResult {
    #[must_use]
    pub fn valid() -> Self {
        Self {
            valid: true,
            reasons: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            valid: reasons.is_empty(),
            reasons,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// An add request refused by an [`ItemValidator`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ItemValidationError {
    pub message: String,
    pub message_code: String,
}

/// Flags carts that cannot be ordered as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCartValidator;

#[async_trait]
impl CartValidator for DefaultCartValidator {
    async fn validate(&self, _session: &Session, cart: &DecoratedCart) -> CartValidationResult {
        let mut reasons = Vec::new();

        if cart.cart.is_empty() {
            reasons.push("cart is empty".to_string());
        }

        for (delivery, item) in cart.items() {
            if item.product.is_placeholder {
                reasons.push(format!(
                    "product {} in delivery {} is no longer available",
                    item.item.marketplace_code,
                    delivery.delivery.code()
                ));
            }
        }

        CartValidationResult::from_reasons(reasons)
    }
}

#[automock]
#[async_trait]
pub trait CartValidator: Send + Sync {
    async fn validate(&self, session: &Session, cart: &DecoratedCart) -> CartValidationResult;
}

#[automock]
#[async_trait]
pub trait ItemValidator: Send + Sync {
    async fn validate(
        &self,
        session: &Session,
        delivery_code: &str,
        request: &AddRequest,
        product: &Product,
    ) -> Result<(), ItemValidationError>;
}
