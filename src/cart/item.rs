//! Items

use serde::{Deserialize, Serialize};

use crate::pricing::LinePrice;

/// A single line inside a delivery.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Line identifier, unique within the cart
    pub id: String,

    /// Marketplace code of the product
    pub marketplace_code: String,

    /// Marketplace code of the chosen variant, for configurable products
    pub variant_marketplace_code: Option<String>,

    /// Product title captured when the line was created
    pub product_title: String,

    /// Quantity, always greater than zero for a stored line
    pub qty: u32,

    /// Unit price in minor units
    pub single_price_net: u64,

    /// Unit price including tax in minor units
    pub single_price_gross: u64,

    /// Tax for one unit in minor units
    pub single_tax: u64,
}

impl Item {
    /// Creates a line from a pricing snapshot.
    pub fn new(
        id: impl Into<String>,
        marketplace_code: impl Into<String>,
        variant_marketplace_code: Option<String>,
        product_title: impl Into<String>,
        qty: u32,
        price: LinePrice,
    ) -> Self {
        Self {
            id: id.into(),
            marketplace_code: marketplace_code.into(),
            variant_marketplace_code,
            product_title: product_title.into(),
            qty,
            single_price_net: price.net,
            single_price_gross: price.gross,
            single_tax: price.tax,
        }
    }

    /// Whether this line holds the given product and variant.
    pub fn is_same_product(&self, marketplace_code: &str, variant: Option<&str>) -> bool {
        self.marketplace_code == marketplace_code
            && self.variant_marketplace_code.as_deref() == variant
    }

    /// Row total excluding tax
    pub fn row_total_net(&self) -> u64 {
        self.single_price_net.saturating_mul(u64::from(self.qty))
    }

    /// Row total including tax
    pub fn row_total_gross(&self) -> u64 {
        self.single_price_gross.saturating_mul(u64::from(self.qty))
    }

    /// Row tax
    pub fn row_tax(&self) -> u64 {
        self.single_tax.saturating_mul(u64::from(self.qty))
    }
}
