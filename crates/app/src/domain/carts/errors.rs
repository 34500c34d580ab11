//! Cart errors.

use thiserror::Error;
use trolley::cart::CartError;

use crate::{
    BoxError,
    domain::{
        carts::{delivery_info::DeliveryInfoBuilderError, validation::CartValidationResult},
        products::ProductServiceError,
    },
    sessions::SessionStoreError,
};

/// Machine-readable reasons attached to rejected commands.
pub mod message_codes {
    pub const PRODUCT_NOT_FOUND: &str = "cart.product.not_found";
    pub const VARIANT_NOT_FOUND: &str = "cart.product.variant_not_found";
    pub const VARIANT_REQUIRED: &str = "cart.product.variant_required";
    pub const QTY_RESTRICTED: &str = "cart.qty.restricted";
    pub const QTY_INVALID: &str = "cart.qty.invalid";
    pub const ITEM_NOT_FOUND: &str = "cart.item.not_found";
    pub const DELIVERY_NOT_FOUND: &str = "cart.delivery.not_found";
    pub const VOUCHER_INVALID: &str = "voucher.invalid";
    pub const VOUCHER_ALREADY_APPLIED: &str = "voucher.already_applied";
    pub const VOUCHER_NOT_APPLIED: &str = "voucher.not_applied";
    pub const GIFT_CARD_INVALID: &str = "giftcard.invalid";
    pub const GIFT_CARD_ALREADY_APPLIED: &str = "giftcard.already_applied";
    pub const GIFT_CARD_NOT_APPLIED: &str = "giftcard.not_applied";
    pub const CODE_INVALID: &str = "code.invalid";
    pub const CART_EMPTY: &str = "cart.empty";
    pub const CART_INVALID: &str = "cart.invalid";
    pub const CART_ALREADY_PLACED: &str = "cart.already_placed";
}

/// Failures of a cart backend command.
#[derive(Debug, Error)]
pub enum CartBehaviourError {
    #[error("cart not found")]
    NotFound,

    #[error("{message}")]
    CommandRejected {
        message: String,
        message_code: String,
    },

    #[error("cart backend unavailable")]
    BackendUnavailable(#[source] BoxError),

    #[error("cart has already been placed")]
    CartAlreadyPlaced,
}

impl CartBehaviourError {
    pub fn rejected(message_code: &str, message: impl Into<String>) -> Self {
        Self::CommandRejected {
            message: message.into(),
            message_code: message_code.to_string(),
        }
    }

    pub fn message_code(&self) -> Option<&str> {
        match self {
            Self::CommandRejected { message_code, .. } => Some(message_code.as_str()),
            Self::CartAlreadyPlaced => Some(message_codes::CART_ALREADY_PLACED),
            Self::NotFound | Self::BackendUnavailable(_) => None,
        }
    }
}

impl From<CartError> for CartBehaviourError {
    fn from(error: CartError) -> Self {
        let message_code = match &error {
            CartError::AlreadyPlaced => return Self::CartAlreadyPlaced,
            CartError::DeliveryNotFound(_) => message_codes::DELIVERY_NOT_FOUND,
            CartError::ItemNotFound(_) => message_codes::ITEM_NOT_FOUND,
            CartError::InvalidQty => message_codes::QTY_INVALID,
            CartError::VoucherAlreadyApplied(_) => message_codes::VOUCHER_ALREADY_APPLIED,
            CartError::VoucherNotApplied(_) => message_codes::VOUCHER_NOT_APPLIED,
            CartError::GiftCardAlreadyApplied(_) => message_codes::GIFT_CARD_ALREADY_APPLIED,
            CartError::GiftCardNotApplied(_) => message_codes::GIFT_CARD_NOT_APPLIED,
        };

        Self::rejected(message_code, error.to_string())
    }
}

/// Failures of a guest or customer cart provider.
#[derive(Debug, Error)]
pub enum CartProviderError {
    #[error("cart not found")]
    NotFound,

    #[error("cart backend unavailable")]
    Backend(#[source] BoxError),
}

/// Failures surfaced by the cart receiver.
///
/// Provider errors are folded into [`CartReceiverError::TemporaryCartService`]
/// so callers never depend on backend specific text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartReceiverError {
    #[error("the cart could not be received currently - try again later")]
    TemporaryCartService,

    #[error("no cart given")]
    NoCartGiven,
}

/// Cache lookups that did not produce a cart. Always recoverable.
#[derive(Debug, Error)]
pub enum CartCacheError {
    #[error("no cached cart")]
    Miss,

    #[error("cached cart was invalidated")]
    Invalidated,

    #[error("cached cart expired")]
    Expired,

    #[error("cart cache unavailable")]
    Unavailable(#[source] BoxError),
}

/// Failures of the cart write path.
#[derive(Debug, Error)]
pub enum CartServiceError {
    #[error(transparent)]
    Receiver(#[from] CartReceiverError),

    #[error(transparent)]
    Behaviour(#[from] CartBehaviourError),

    #[error("product {0} not found")]
    ProductNotFound(String),

    #[error("product lookup failed")]
    Product(#[source] ProductServiceError),

    #[error("{message}")]
    Rejected {
        message: String,
        message_code: String,
    },

    #[error("cart is invalid: {}", .0.reasons.join(", "))]
    InvalidCart(CartValidationResult),

    #[error("failed to build delivery info")]
    DeliveryInfo(#[from] DeliveryInfoBuilderError),

    #[error("session could not be persisted")]
    Session(#[from] SessionStoreError),
}

impl CartServiceError {
    pub fn rejected(message_code: &str, message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            message_code: message_code.to_string(),
        }
    }

    /// Machine-readable reason, for rejections the shopper can act on.
    pub fn message_code(&self) -> Option<&str> {
        match self {
            Self::Rejected { message_code, .. } => Some(message_code.as_str()),
            Self::Behaviour(error) => error.message_code(),
            Self::ProductNotFound(_) => Some(message_codes::PRODUCT_NOT_FOUND),
            Self::InvalidCart(_) => Some(message_codes::CART_INVALID),
            Self::Receiver(_) | Self::Product(_) | Self::DeliveryInfo(_) | Self::Session(_) => None,
        }
    }
}
