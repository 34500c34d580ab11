//! Line pricing

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

/// Unit price snapshot of a line, in minor units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePrice {
    /// Price excluding tax
    pub net: u64,

    /// Price including tax
    pub gross: u64,

    /// Tax amount
    pub tax: u64,
}

impl LinePrice {
    /// Prices a net amount at the given tax rate (percent).
    ///
    /// Tax is rounded half away from zero to whole minor units. Negative or
    /// overflowing rates price the line tax free.
    pub fn from_net(net: u64, tax_rate: Decimal) -> Self {
        let tax = Decimal::from(net)
            .checked_mul(tax_rate)
            .and_then(|amount| amount.checked_div(Decimal::ONE_HUNDRED))
            .map(|amount| amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|amount| amount.to_u64())
            .unwrap_or(0);

        Self {
            net,
            gross: net.saturating_add(tax),
            tax,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn applies_tax_rate() {
        let price = LinePrice::from_net(1_000, Decimal::from(19));

        assert_eq!(
            price,
            LinePrice {
                net: 1_000,
                gross: 1_190,
                tax: 190,
            }
        );
    }

    #[test]
    fn rounds_half_away_from_zero() {
        let price = LinePrice::from_net(5, Decimal::from(10));

        assert_eq!(price.tax, 1);
    }

    #[test]
    fn negative_rate_is_tax_free() {
        let price = LinePrice::from_net(1_000, Decimal::from(-5));

        assert_eq!(price.tax, 0);
        assert_eq!(price.gross, 1_000);
    }
}
