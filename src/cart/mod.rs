//! Cart aggregate

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod delivery;
mod item;
mod promotions;
mod totals;

pub use delivery::{Address, Delivery, DeliveryInfo, DeliveryLocation};
pub use item::Item;
pub use promotions::{AppliedGiftCard, AppliedVoucher, VoucherDiscount};
pub use totals::{CartTotals, DeliveryTotals};

/// Errors raised by cart mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The cart has been placed and is read-only
    #[error("cart has already been placed")]
    AlreadyPlaced,

    /// No delivery with this code exists
    #[error("delivery {0} not found")]
    DeliveryNotFound(String),

    /// No line with this id exists in the delivery
    #[error("item {0} not found")]
    ItemNotFound(String),

    /// Lines must hold at least one unit
    #[error("quantity must be greater than zero")]
    InvalidQty,

    /// The voucher is already on the cart
    #[error("voucher {0} already applied")]
    VoucherAlreadyApplied(String),

    /// The voucher is not on the cart
    #[error("voucher {0} not applied")]
    VoucherNotApplied(String),

    /// The gift card is already on the cart
    #[error("gift card {0} already applied")]
    GiftCardAlreadyApplied(String),

    /// The gift card is not on the cart
    #[error("gift card {0} not applied")]
    GiftCardNotApplied(String),
}

/// Lifecycle of a cart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    /// Created, never mutated
    #[default]
    New,

    /// Mutated at least once
    Active,

    /// Order placed; terminal
    Placed,
}

/// The cart aggregate.
///
/// All mutating helpers refuse to touch a placed cart and keep [`CartTotals`]
/// in step with the deliveries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart identifier; empty for the placeholder cart
    pub id: String,

    /// ISO currency code all amounts are in
    pub currency_code: String,

    /// Lifecycle status
    pub status: CartStatus,

    /// Fulfilment groups, codes unique
    pub deliveries: Vec<Delivery>,

    /// Billing address
    pub billing_address: Option<Address>,

    /// Vouchers in application order
    pub applied_vouchers: Vec<AppliedVoucher>,

    /// Gift cards in application order
    pub applied_gift_cards: Vec<AppliedGiftCard>,

    /// Derived totals
    pub totals: CartTotals,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new(id: impl Into<String>, currency_code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            currency_code: currency_code.into(),
            ..Self::default()
        }
    }

    /// Whether the order for this cart has been placed
    pub fn is_placed(&self) -> bool {
        self.status == CartStatus::Placed
    }

    /// Fails when the cart can no longer change.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AlreadyPlaced`] for placed carts.
    pub fn ensure_mutable(&self) -> Result<(), CartError> {
        if self.is_placed() {
            return Err(CartError::AlreadyPlaced);
        }

        Ok(())
    }

    /// Moves the cart into its terminal state.
    pub fn mark_placed(&mut self) {
        self.status = CartStatus::Placed;
    }

    fn touch(&mut self) {
        if self.status == CartStatus::New {
            self.status = CartStatus::Active;
        }
    }

    /// Finds a delivery by code.
    pub fn delivery(&self, code: &str) -> Option<&Delivery> {
        self.deliveries
            .iter()
            .find(|delivery| delivery.code() == code)
    }

    fn delivery_mut(&mut self, code: &str) -> Option<&mut Delivery> {
        self.deliveries
            .iter_mut()
            .find(|delivery| delivery.code() == code)
    }

    /// Whether a delivery with this code exists
    pub fn has_delivery(&self, code: &str) -> bool {
        self.delivery(code).is_some()
    }

    /// All lines across deliveries, in order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.deliveries
            .iter()
            .flat_map(|delivery| delivery.items.iter())
    }

    /// Finds a line in a delivery.
    pub fn find_item(&self, delivery_code: &str, item_id: &str) -> Option<&Item> {
        self.delivery(delivery_code)?.item(item_id)
    }

    /// Sum of all quantities
    pub fn item_count(&self) -> u64 {
        self.deliveries.iter().map(Delivery::item_count).sum()
    }

    /// Whether the cart holds no lines
    pub fn is_empty(&self) -> bool {
        self.deliveries.iter().all(Delivery::is_empty)
    }

    /// Quantity of a product and variant across all deliveries.
    pub fn qty_of(&self, marketplace_code: &str, variant: Option<&str>) -> u64 {
        self.items()
            .filter(|item| item.is_same_product(marketplace_code, variant))
            .map(|item| u64::from(item.qty))
            .sum()
    }

    /// Sets the delivery info, creating the delivery when missing.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AlreadyPlaced`] for placed carts.
    pub fn set_delivery_info(&mut self, info: DeliveryInfo) -> Result<(), CartError> {
        self.ensure_mutable()?;

        match self.delivery_mut(&info.code) {
            Some(delivery) => delivery.info = info,
            None => self.deliveries.push(Delivery::new(info)),
        }

        self.touch();
        self.recalculate();

        Ok(())
    }

    /// Adds a line, merging it into an existing line for the same product.
    ///
    /// Missing deliveries are created with an empty [`DeliveryInfo`].
    /// Returns the resulting line.
    ///
    /// # Errors
    ///
    /// Returns an error when the cart is placed or the quantity is zero.
    pub fn add_item(&mut self, delivery_code: &str, item: Item) -> Result<Item, CartError> {
        self.ensure_mutable()?;

        if item.qty == 0 {
            return Err(CartError::InvalidQty);
        }

        if !self.has_delivery(delivery_code) {
            self.deliveries
                .push(Delivery::new(DeliveryInfo::new(delivery_code)));
        }

        let delivery = self
            .delivery_mut(delivery_code)
            .ok_or_else(|| CartError::DeliveryNotFound(delivery_code.to_string()))?;

        let existing = delivery.items.iter_mut().find(|line| {
            line.is_same_product(&item.marketplace_code, item.variant_marketplace_code.as_deref())
        });

        let line = match existing {
            Some(line) => {
                line.qty = line.qty.saturating_add(item.qty);
                line.clone()
            }
            None => {
                delivery.items.push(item.clone());
                item
            }
        };

        self.touch();
        self.recalculate();

        Ok(line)
    }

    /// Sets a line's quantity and returns the previous quantity.
    ///
    /// # Errors
    ///
    /// Returns an error when the cart is placed, the quantity is zero, or the
    /// line does not exist.
    pub fn update_item_qty(
        &mut self,
        delivery_code: &str,
        item_id: &str,
        qty: u32,
    ) -> Result<u32, CartError> {
        self.ensure_mutable()?;

        if qty == 0 {
            return Err(CartError::InvalidQty);
        }

        let item = self
            .delivery_mut(delivery_code)
            .ok_or_else(|| CartError::DeliveryNotFound(delivery_code.to_string()))?
            .item_mut(item_id)
            .ok_or_else(|| CartError::ItemNotFound(item_id.to_string()))?;

        let before = item.qty;
        item.qty = qty;

        self.touch();
        self.recalculate();

        Ok(before)
    }

    /// Removes a line and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error when the cart is placed or the line does not exist.
    pub fn delete_item(&mut self, delivery_code: &str, item_id: &str) -> Result<Item, CartError> {
        self.ensure_mutable()?;

        let delivery = self
            .delivery_mut(delivery_code)
            .ok_or_else(|| CartError::DeliveryNotFound(delivery_code.to_string()))?;

        let position = delivery
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| CartError::ItemNotFound(item_id.to_string()))?;

        let removed = delivery.items.remove(position);

        self.touch();
        self.recalculate();

        Ok(removed)
    }

    /// Removes every line, keeping the deliveries.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AlreadyPlaced`] for placed carts.
    pub fn delete_all_items(&mut self) -> Result<(), CartError> {
        self.ensure_mutable()?;

        for delivery in &mut self.deliveries {
            delivery.items.clear();
        }

        self.touch();
        self.recalculate();

        Ok(())
    }

    /// Removes a delivery with all of its lines.
    ///
    /// # Errors
    ///
    /// Returns an error when the cart is placed or the delivery does not exist.
    pub fn delete_delivery(&mut self, code: &str) -> Result<Delivery, CartError> {
        self.ensure_mutable()?;

        let position = self
            .deliveries
            .iter()
            .position(|delivery| delivery.code() == code)
            .ok_or_else(|| CartError::DeliveryNotFound(code.to_string()))?;

        let removed = self.deliveries.remove(position);

        self.touch();
        self.recalculate();

        Ok(removed)
    }

    /// Drops deliveries without lines and returns their codes.
    pub fn remove_empty_deliveries(&mut self) -> Vec<String> {
        let removed = self
            .deliveries
            .iter()
            .filter(|delivery| delivery.is_empty())
            .map(|delivery| delivery.code().to_string())
            .collect();

        self.deliveries.retain(|delivery| !delivery.is_empty());
        self.recalculate();

        removed
    }

    /// Replaces the billing address.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AlreadyPlaced`] for placed carts.
    pub fn set_billing_address(&mut self, address: Address) -> Result<(), CartError> {
        self.ensure_mutable()?;

        self.billing_address = Some(address);
        self.touch();

        Ok(())
    }

    /// Applies a voucher.
    ///
    /// # Errors
    ///
    /// Returns an error when the cart is placed or the code is already applied.
    pub fn apply_voucher(&mut self, voucher: AppliedVoucher) -> Result<(), CartError> {
        self.ensure_mutable()?;

        if self
            .applied_vouchers
            .iter()
            .any(|applied| applied.code == voucher.code)
        {
            return Err(CartError::VoucherAlreadyApplied(voucher.code));
        }

        self.applied_vouchers.push(voucher);
        self.touch();
        self.recalculate();

        Ok(())
    }

    /// Removes a voucher and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error when the cart is placed or the code is not applied.
    pub fn remove_voucher(&mut self, code: &str) -> Result<AppliedVoucher, CartError> {
        self.ensure_mutable()?;

        let position = self
            .applied_vouchers
            .iter()
            .position(|applied| applied.code == code)
            .ok_or_else(|| CartError::VoucherNotApplied(code.to_string()))?;

        let removed = self.applied_vouchers.remove(position);

        self.touch();
        self.recalculate();

        Ok(removed)
    }

    /// Drops every voucher and returns them.
    pub fn clear_vouchers(&mut self) -> Vec<AppliedVoucher> {
        let removed = std::mem::take(&mut self.applied_vouchers);

        self.recalculate();

        removed
    }

    /// Applies a gift card.
    ///
    /// # Errors
    ///
    /// Returns an error when the cart is placed or the code is already applied.
    pub fn apply_gift_card(&mut self, gift_card: AppliedGiftCard) -> Result<(), CartError> {
        self.ensure_mutable()?;

        if self
            .applied_gift_cards
            .iter()
            .any(|applied| applied.code == gift_card.code)
        {
            return Err(CartError::GiftCardAlreadyApplied(gift_card.code));
        }

        self.applied_gift_cards.push(gift_card);
        self.touch();
        self.recalculate();

        Ok(())
    }

    /// Removes a gift card and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error when the cart is placed or the code is not applied.
    pub fn remove_gift_card(&mut self, code: &str) -> Result<AppliedGiftCard, CartError> {
        self.ensure_mutable()?;

        let position = self
            .applied_gift_cards
            .iter()
            .position(|applied| applied.code == code)
            .ok_or_else(|| CartError::GiftCardNotApplied(code.to_string()))?;

        let removed = self.applied_gift_cards.remove(position);

        self.touch();
        self.recalculate();

        Ok(removed)
    }

    /// Recomputes delivery and cart totals from the lines.
    ///
    /// Vouchers are applied in order, each clamped to what is left of the
    /// gross sub-total; gift cards then redeem what remains.
    pub fn recalculate(&mut self) {
        let mut totals = CartTotals::default();

        for delivery in &mut self.deliveries {
            delivery.recalculate();

            totals.sub_total_net = totals
                .sub_total_net
                .saturating_add(delivery.totals.sub_total_net);
            totals.sub_total_gross = totals
                .sub_total_gross
                .saturating_add(delivery.totals.sub_total_gross);
            totals.tax = totals.tax.saturating_add(delivery.totals.tax);
        }

        let mut remaining = totals.sub_total_gross;

        for voucher in &mut self.applied_vouchers {
            voucher.amount = voucher
                .discount
                .amount_for(totals.sub_total_gross)
                .min(remaining);
            remaining = remaining.saturating_sub(voucher.amount);
            totals.total_discount = totals.total_discount.saturating_add(voucher.amount);
        }

        for gift_card in &mut self.applied_gift_cards {
            gift_card.applied_amount = gift_card.balance.min(remaining);
            remaining = remaining.saturating_sub(gift_card.applied_amount);
            totals.total_gift_card = totals
                .total_gift_card
                .saturating_add(gift_card.applied_amount);
        }

        totals.grand_total = remaining;
        self.totals = totals;
    }
}
