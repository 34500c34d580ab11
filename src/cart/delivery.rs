//! Deliveries

use serde::{Deserialize, Serialize};

use crate::cart::{Item, totals::DeliveryTotals};

/// Postal address used for billing and shipping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Address {
    /// Given name
    pub firstname: String,

    /// Family name
    pub lastname: String,

    /// Street and house number
    pub street: String,

    /// Postal code
    pub postcode: String,

    /// City
    pub city: String,

    /// ISO country code
    pub country_code: String,

    /// Contact email
    pub email: String,

    /// Contact phone number
    pub telephone: String,
}

/// Where a delivery goes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeliveryLocation {
    /// Shipping address, if one was given
    pub address: Option<Address>,

    /// Ship to the cart's billing address instead
    pub use_billing_address: bool,
}

/// Fulfilment details of a delivery.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeliveryInfo {
    /// Delivery code, unique within a cart
    pub code: String,

    /// Shipping method
    pub method: String,

    /// Carrier
    pub carrier: String,

    /// Destination
    pub location: DeliveryLocation,
}

impl DeliveryInfo {
    /// Creates an empty delivery info for the given code.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }
}

/// A fulfilment group inside a cart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// Fulfilment details
    pub info: DeliveryInfo,

    /// Lines in insertion order
    pub items: Vec<Item>,

    /// Totals derived from the lines
    pub totals: DeliveryTotals,
}

impl Delivery {
    /// Creates an empty delivery.
    pub fn new(info: DeliveryInfo) -> Self {
        Self {
            info,
            items: Vec::new(),
            totals: DeliveryTotals::default(),
        }
    }

    /// The delivery code
    pub fn code(&self) -> &str {
        &self.info.code
    }

    /// Finds a line by id.
    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub(crate) fn item_mut(&mut self, item_id: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id == item_id)
    }

    /// Sum of all line quantities
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.qty)).sum()
    }

    /// Whether the delivery holds no lines
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn recalculate(&mut self) {
        self.totals = self
            .items
            .iter()
            .fold(DeliveryTotals::default(), |totals, item| DeliveryTotals {
                sub_total_net: totals.sub_total_net.saturating_add(item.row_total_net()),
                sub_total_gross: totals
                    .sub_total_gross
                    .saturating_add(item.row_total_gross()),
                tax: totals.tax.saturating_add(item.row_tax()),
            });
    }
}
