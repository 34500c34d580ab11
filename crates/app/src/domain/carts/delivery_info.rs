//! Default delivery info for new deliveries.

use mockall::automock;
use thiserror::Error;
use trolley::cart::{DeliveryInfo, DeliveryLocation};

#[derive(Debug, Error)]
pub enum DeliveryInfoBuilderError {
    #[error("invalid delivery code {0:?}")]
    InvalidCode(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDeliveryInfoBuilder {
    use_billing_address: bool,
}

impl DefaultDeliveryInfoBuilder {
    #[must_use]
    pub fn new(use_billing_address: bool) -> Self {
        Self {
            use_billing_address,
        }
    }
}

impl DeliveryInfoBuilder for DefaultDeliveryInfoBuilder {
    fn build_by_delivery_code(&self, code: &str) -> Result<DeliveryInfo, DeliveryInfoBuilderError> {
        if code.trim().is_empty() {
            return Err(DeliveryInfoBuilderError::InvalidCode(code.to_string()));
        }

        Ok(DeliveryInfo {
            location: DeliveryLocation {
                address: None,
                use_billing_address: self.use_billing_address,
            },
            ..DeliveryInfo::new(code)
        })
    }
}

#[automock]
pub trait DeliveryInfoBuilder: Send + Sync {
    /// Template info for a delivery that is not in the cart yet.
    fn build_by_delivery_code(&self, code: &str) -> Result<DeliveryInfo, DeliveryInfoBuilderError>;
}
