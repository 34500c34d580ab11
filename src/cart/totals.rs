//! Totals

use serde::{Deserialize, Serialize};

/// Totals of a single delivery, in minor units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryTotals {
    /// Sum of net row totals
    pub sub_total_net: u64,

    /// Sum of gross row totals
    pub sub_total_gross: u64,

    /// Sum of row taxes
    pub tax: u64,
}

/// Cart level totals, in minor units.
///
/// Sub-totals and tax are sums over the deliveries. Discounts and gift cards
/// are taken off the gross sub-total, so `grand_total` never underflows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of delivery net sub-totals
    pub sub_total_net: u64,

    /// Sum of delivery gross sub-totals
    pub sub_total_gross: u64,

    /// Sum of delivery taxes
    pub tax: u64,

    /// Sum of applied voucher amounts
    pub total_discount: u64,

    /// Sum of applied gift card amounts
    pub total_gift_card: u64,

    /// Amount left to pay
    pub grand_total: u64,
}
