//! Placed orders

use serde::{Deserialize, Serialize};

/// Order created for one delivery of a placed cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrderInfo {
    /// Order number assigned by the backend
    pub order_number: String,

    /// Delivery the order covers
    pub delivery_code: String,
}

/// Confirmation of a placed cart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrderInfos(pub Vec<PlacedOrderInfo>);

impl PlacedOrderInfos {
    /// The order covering a delivery.
    pub fn for_delivery(&self, delivery_code: &str) -> Option<&PlacedOrderInfo> {
        self.0
            .iter()
            .find(|info| info.delivery_code == delivery_code)
    }

    /// All order numbers, in delivery order.
    pub fn order_numbers(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|info| info.order_number.as_str())
    }

    /// Whether no order was created
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
