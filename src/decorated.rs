//! Decorated carts
//!
//! Read-only projections pairing every raw cart entity with its resolved
//! catalog product. A cart change always means building a new projection.

use serde::{Deserialize, Serialize};

use crate::{
    cart::{Cart, Delivery, Item},
    products::Product,
};

/// A line with its product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedItem {
    /// The raw line
    pub item: Item,

    /// The resolved product, possibly a placeholder
    pub product: Product,
}

/// A delivery with decorated lines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedDelivery {
    /// The raw delivery
    pub delivery: Delivery,

    /// Decorated lines, in delivery order
    pub items: Vec<DecoratedItem>,
}

/// A line whose product could not be resolved during decoration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecorationWarning {
    /// Line id
    pub item_id: String,

    /// Marketplace code that failed to resolve
    pub marketplace_code: String,

    /// Why the lookup failed
    pub reason: String,
}

/// A cart with every line decorated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedCart {
    /// The raw cart
    pub cart: Cart,

    /// Decorated deliveries, in cart order
    pub deliveries: Vec<DecoratedDelivery>,

    /// Soft failures collected while decorating
    pub warnings: Vec<DecorationWarning>,
}

impl DecoratedCart {
    /// All decorated lines across deliveries.
    pub fn items(&self) -> impl Iterator<Item = (&DecoratedDelivery, &DecoratedItem)> {
        self.deliveries.iter().flat_map(|delivery| {
            delivery
                .items
                .iter()
                .map(move |item| (delivery, item))
        })
    }

    /// Finds a decorated delivery by code.
    pub fn delivery(&self, code: &str) -> Option<&DecoratedDelivery> {
        self.deliveries
            .iter()
            .find(|delivery| delivery.delivery.code() == code)
    }

    /// Whether any line fell back to a placeholder product
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
