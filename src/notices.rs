//! Deferred notices returned with a mutated cart

use serde::{Deserialize, Serialize};

/// Something the shopper should be told about after a cart change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum CartNotice {
    /// A line quantity was reduced to fit a restriction
    QtyAdjusted {
        /// Line id
        item_id: String,
        /// Delivery holding the line
        delivery_code: String,
        /// Marketplace code of the product
        marketplace_code: String,
        /// Quantity asked for
        requested: u32,
        /// Quantity kept
        adjusted: u32,
    },

    /// A line was removed because it could not be kept
    ItemRemoved {
        /// Line id
        item_id: String,
        /// Delivery that held the line
        delivery_code: String,
        /// Marketplace code of the product
        marketplace_code: String,
    },

    /// A voucher was dropped because it no longer applies
    CouponCodeRemoved {
        /// Voucher code
        code: String,
    },

    /// An empty delivery was dropped
    DeliveryRemoved {
        /// Delivery code
        delivery_code: String,
    },
}
