//! Cart commands

use serde::{Deserialize, Serialize};

use crate::cart::{Address, DeliveryInfo, Item};

/// Request to put a product into a delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRequest {
    /// Marketplace code of the product
    pub marketplace_code: String,

    /// Marketplace code of the variant, for configurable products
    pub variant_marketplace_code: Option<String>,

    /// Quantity to add, at least one
    pub qty: u32,
}

impl AddRequest {
    /// Builds a request, coercing non-positive quantities to one.
    pub fn new(
        marketplace_code: impl Into<String>,
        variant_marketplace_code: Option<String>,
        qty: i64,
    ) -> Self {
        let qty = u32::try_from(qty.max(1)).unwrap_or(u32::MAX);

        Self {
            marketplace_code: marketplace_code.into(),
            variant_marketplace_code: variant_marketplace_code.filter(|code| !code.is_empty()),
            qty,
        }
    }

    /// Request re-adding an existing line, e.g. when merging carts.
    pub fn from_item(item: &Item) -> Self {
        Self {
            marketplace_code: item.marketplace_code.clone(),
            variant_marketplace_code: item.variant_marketplace_code.clone(),
            qty: item.qty,
        }
    }
}

/// Cap on a product's quantity across the whole cart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QtyLimit {
    /// Highest quantity the cart may hold
    pub max_qty: u32,

    /// Reduce oversized requests to what is left instead of rejecting them
    pub clamp: bool,
}

impl QtyLimit {
    pub fn new(max_qty: u32, clamp: bool) -> Self {
        Self { max_qty, clamp }
    }

    /// Quantity that may be granted when `held` is already in the cart.
    ///
    /// `None` means the request must be rejected: clamping is off, or
    /// nothing is left to grant.
    pub fn grant(self, held: u64, requested: u32) -> Option<u32> {
        let allowed = u64::from(self.max_qty).saturating_sub(held);

        if u64::from(requested) <= allowed {
            return Some(requested);
        }

        if !self.clamp || allowed == 0 {
            return None;
        }

        u32::try_from(allowed).ok()
    }
}

/// Mutating commands a cart backend executes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CartCommand {
    /// Add a product to a delivery
    AddItem {
        /// Target delivery
        delivery_code: String,
        /// What to add
        request: AddRequest,
        /// Info for the delivery when it does not exist yet
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delivery_info: Option<DeliveryInfo>,
        /// Restriction checked against the stored cart
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<QtyLimit>,
    },

    /// Change the quantity of a line
    UpdateItemQty {
        /// Delivery holding the line
        delivery_code: String,
        /// Line id
        item_id: String,
        /// New quantity, at least one
        qty: u32,
        /// Restriction checked against the stored cart
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<QtyLimit>,
    },

    /// Remove a line
    DeleteItem {
        /// Delivery holding the line
        delivery_code: String,
        /// Line id
        item_id: String,
    },

    /// Remove every line
    DeleteAllItems,

    /// Remove a delivery with its lines
    DeleteDelivery {
        /// Delivery to remove
        delivery_code: String,
    },

    /// Apply a voucher code
    ApplyVoucher {
        /// Voucher code
        code: String,
    },

    /// Remove a voucher code
    RemoveVoucher {
        /// Voucher code
        code: String,
    },

    /// Apply a gift card code
    ApplyGiftCard {
        /// Gift card code
        code: String,
    },

    /// Remove a gift card code
    RemoveGiftCard {
        /// Gift card code
        code: String,
    },

    /// Set the info of a delivery, creating it when missing
    UpdateDeliveryInfo {
        /// Delivery to update
        delivery_code: String,
        /// New info
        info: DeliveryInfo,
    },

    /// Set the billing address
    UpdateBillingAddress {
        /// New address
        address: Address,
    },
}

impl CartCommand {
    /// Adds a product without a restriction, into a delivery with default info.
    pub fn add_item(delivery_code: impl Into<String>, request: AddRequest) -> Self {
        Self::AddItem {
            delivery_code: delivery_code.into(),
            request,
            delivery_info: None,
            limit: None,
        }
    }

    /// Short command name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddItem { .. } => "add_item",
            Self::UpdateItemQty { .. } => "update_item_qty",
            Self::DeleteItem { .. } => "delete_item",
            Self::DeleteAllItems => "delete_all_items",
            Self::DeleteDelivery { .. } => "delete_delivery",
            Self::ApplyVoucher { .. } => "apply_voucher",
            Self::RemoveVoucher { .. } => "remove_voucher",
            Self::ApplyGiftCard { .. } => "apply_gift_card",
            Self::RemoveGiftCard { .. } => "remove_gift_card",
            Self::UpdateDeliveryInfo { .. } => "update_delivery_info",
            Self::UpdateBillingAddress { .. } => "update_billing_address",
        }
    }
}
