//! Vouchers and gift cards applied to a cart

use serde::{Deserialize, Serialize};

/// What a voucher takes off the cart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum VoucherDiscount {
    /// Percentage of the gross sub-total, capped at 100
    Percentage(u8),

    /// Fixed amount in minor units
    Fixed(u64),
}

impl VoucherDiscount {
    /// Discount for the given gross sub-total, before clamping.
    pub fn amount_for(self, sub_total_gross: u64) -> u64 {
        match self {
            Self::Percentage(percent) => {
                sub_total_gross.saturating_mul(u64::from(percent.min(100))) / 100
            }
            Self::Fixed(amount) => amount,
        }
    }
}

/// A voucher code applied to a cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedVoucher {
    /// Voucher code
    pub code: String,

    /// Discount definition
    pub discount: VoucherDiscount,

    /// Amount currently taken off, recomputed with the totals
    pub amount: u64,
}

impl AppliedVoucher {
    /// Creates an applied voucher with no amount computed yet.
    pub fn new(code: impl Into<String>, discount: VoucherDiscount) -> Self {
        Self {
            code: code.into(),
            discount,
            amount: 0,
        }
    }
}

/// A gift card applied to a cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedGiftCard {
    /// Gift card code
    pub code: String,

    /// Available balance in minor units
    pub balance: u64,

    /// Amount currently redeemed, recomputed with the totals
    pub applied_amount: u64,
}

impl AppliedGiftCard {
    /// Creates an applied gift card with nothing redeemed yet.
    pub fn new(code: impl Into<String>, balance: u64) -> Self {
        Self {
            code: code.into(),
            balance,
            applied_amount: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_is_capped_at_full_amount() {
        assert_eq!(VoucherDiscount::Percentage(10).amount_for(2_000), 200);
        assert_eq!(VoucherDiscount::Percentage(250).amount_for(2_000), 2_000);
    }

    #[test]
    fn fixed_ignores_sub_total() {
        assert_eq!(VoucherDiscount::Fixed(500).amount_for(100), 500);
    }
}
