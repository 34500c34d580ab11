//! In-process cart backend.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use tracing::debug;
use trolley::{
    cart::{AppliedGiftCard, AppliedVoucher, Cart, CartError, DeliveryInfo, Item, VoucherDiscount},
    commands::{AddRequest, CartCommand, QtyLimit},
    notices::CartNotice,
    orders::{PlacedOrderInfo, PlacedOrderInfos},
    pricing::LinePrice,
    products::ProductKind,
};
use uuid::Uuid;

use crate::{
    domain::{
        carts::{
            behaviour::{
                BehaviourKind, CartOrderBehaviour, CartUpdate, InMemoryCartStorage, PlacedOrder,
            },
            errors::{CartBehaviourError, message_codes},
        },
        products::{ProductService, ProductServiceError},
    },
    settings::CartSettings,
};

/// Voucher and gift card codes the in-memory backend accepts.
#[derive(Debug, Clone)]
pub struct InMemoryPromotions {
    vouchers: FxHashMap<String, VoucherDiscount>,
    gift_cards: FxHashMap<String, u64>,
}

impl Default for InMemoryPromotions {
    fn default() -> Self {
        Self::empty()
            .with_voucher("valid_voucher", VoucherDiscount::Percentage(10))
            .with_gift_card("valid_giftcard", 5_000)
    }
}

impl InMemoryPromotions {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            vouchers: FxHashMap::default(),
            gift_cards: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_voucher(mut self, code: impl Into<String>, discount: VoucherDiscount) -> Self {
        self.vouchers.insert(code.into(), discount);
        self
    }

    #[must_use]
    pub fn with_gift_card(mut self, code: impl Into<String>, balance: u64) -> Self {
        self.gift_cards.insert(code.into(), balance);
        self
    }
}

/// Executes commands against [`InMemoryCartStorage`].
pub struct InMemoryCartOrderBehaviour {
    storage: Arc<InMemoryCartStorage>,
    products: Arc<dyn ProductService>,
    promotions: InMemoryPromotions,
    tax_rate: Decimal,
    delete_empty_delivery: bool,
}

impl fmt::Debug for InMemoryCartOrderBehaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryCartOrderBehaviour")
            .field("promotions", &self.promotions)
            .field("tax_rate", &self.tax_rate)
            .field("delete_empty_delivery", &self.delete_empty_delivery)
            .finish_non_exhaustive()
    }
}

impl InMemoryCartOrderBehaviour {
    pub fn new(
        storage: Arc<InMemoryCartStorage>,
        products: Arc<dyn ProductService>,
        settings: &CartSettings,
    ) -> Self {
        Self {
            storage,
            products,
            promotions: InMemoryPromotions::default(),
            tax_rate: settings.default_tax_rate,
            delete_empty_delivery: settings.delete_empty_delivery,
        }
    }

    #[must_use]
    pub fn with_promotions(mut self, promotions: InMemoryPromotions) -> Self {
        self.promotions = promotions;
        self
    }

    /// Prices a new line from the catalog. Runs before any cart lock is taken.
    async fn price_line(&self, request: &AddRequest) -> Result<Item, CartBehaviourError> {
        let product = match self.products.get(&request.marketplace_code).await {
            Ok(product) => product,
            Err(ProductServiceError::NotFound) => {
                return Err(CartBehaviourError::rejected(
                    message_codes::PRODUCT_NOT_FOUND,
                    format!("product {} not found", request.marketplace_code),
                ));
            }
            Err(error) => return Err(CartBehaviourError::BackendUnavailable(Box::new(error))),
        };

        let product = match request.variant_marketplace_code.as_deref() {
            Some(variant) => product.with_active_variant(variant).ok_or_else(|| {
                CartBehaviourError::rejected(
                    message_codes::VARIANT_NOT_FOUND,
                    format!(
                        "variant {variant} of product {} not found",
                        request.marketplace_code
                    ),
                )
            })?,
            None if matches!(product.kind, ProductKind::Configurable { .. }) => {
                return Err(CartBehaviourError::rejected(
                    message_codes::VARIANT_REQUIRED,
                    format!("product {} needs a variant", request.marketplace_code),
                ));
            }
            None => product,
        };

        Ok(Item::new(
            Uuid::now_v7().to_string(),
            request.marketplace_code.clone(),
            request.variant_marketplace_code.clone(),
            product.effective_title(),
            request.qty,
            LinePrice::from_net(product.effective_price(), self.tax_rate),
        ))
    }

    /// Runs a cart mutation under the cart's lock and applies the
    /// follow-up policies: empty deliveries and orphaned vouchers.
    async fn commit(
        &self,
        cart_id: &str,
        apply: impl FnOnce(&mut Cart) -> Result<(), CartError> + Send,
    ) -> Result<CartUpdate, CartBehaviourError> {
        self.commit_with_notices(cart_id, move |cart| {
            apply(cart)?;

            Ok(Vec::new())
        })
        .await
    }

    /// Like [`Self::commit`], for mutations that report notices of their own.
    async fn commit_with_notices(
        &self,
        cart_id: &str,
        apply: impl FnOnce(&mut Cart) -> Result<Vec<CartNotice>, CartBehaviourError> + Send,
    ) -> Result<CartUpdate, CartBehaviourError> {
        let delete_empty_delivery = self.delete_empty_delivery;

        self.storage
            .update(cart_id, |stored| -> Result<CartUpdate, CartBehaviourError> {
                let cart = &mut stored.cart;
                let was_empty = cart.is_empty();

                let mut notices = apply(cart)?;

                if delete_empty_delivery {
                    notices.extend(
                        cart.remove_empty_deliveries()
                            .into_iter()
                            .map(|delivery_code| CartNotice::DeliveryRemoved { delivery_code }),
                    );
                }

                if !was_empty && cart.is_empty() {
                    notices.extend(
                        cart.clear_vouchers()
                            .into_iter()
                            .map(|voucher| CartNotice::CouponCodeRemoved { code: voucher.code }),
                    );
                }

                Ok(CartUpdate {
                    cart: cart.clone(),
                    notices,
                })
            })
            .await
            .unwrap_or(Err(CartBehaviourError::NotFound))
    }
}

fn qty_restricted(marketplace_code: &str, limit: QtyLimit) -> CartBehaviourError {
    CartBehaviourError::rejected(
        message_codes::QTY_RESTRICTED,
        format!(
            "product {marketplace_code} is restricted to a quantity of {}",
            limit.max_qty
        ),
    )
}

/// Adds a priced line, creating its delivery first when needed. The limit is
/// checked against the cart as stored, inside the lock.
fn add_line(
    cart: &mut Cart,
    delivery_code: &str,
    mut line: Item,
    delivery_info: Option<DeliveryInfo>,
    limit: Option<QtyLimit>,
) -> Result<Vec<CartNotice>, CartBehaviourError> {
    let requested = line.qty;

    if let Some(limit) = limit {
        let held = cart.qty_of(&line.marketplace_code, line.variant_marketplace_code.as_deref());

        line.qty = limit
            .grant(held, requested)
            .ok_or_else(|| qty_restricted(&line.marketplace_code, limit))?;
    }

    match delivery_info {
        Some(info) if !cart.has_delivery(delivery_code) => cart.set_delivery_info(DeliveryInfo {
            code: delivery_code.to_string(),
            ..info
        })?,
        _ => {}
    }

    let granted = line.qty;
    let marketplace_code = line.marketplace_code.clone();
    let stored = cart.add_item(delivery_code, line)?;

    if granted == requested {
        return Ok(Vec::new());
    }

    Ok(vec![CartNotice::QtyAdjusted {
        item_id: stored.id,
        delivery_code: delivery_code.to_string(),
        marketplace_code,
        requested,
        adjusted: granted,
    }])
}

/// Sets a line's quantity. The limit counts the product's other lines too.
fn set_line_qty(
    cart: &mut Cart,
    delivery_code: &str,
    item_id: &str,
    qty: u32,
    limit: Option<QtyLimit>,
) -> Result<Vec<CartNotice>, CartBehaviourError> {
    let Some(limit) = limit else {
        cart.update_item_qty(delivery_code, item_id, qty)?;

        return Ok(Vec::new());
    };

    let line = cart
        .find_item(delivery_code, item_id)
        .cloned()
        .ok_or_else(|| CartError::ItemNotFound(item_id.to_string()))?;

    let held = cart
        .qty_of(&line.marketplace_code, line.variant_marketplace_code.as_deref())
        .saturating_sub(u64::from(line.qty));

    let granted = limit
        .grant(held, qty)
        .ok_or_else(|| qty_restricted(&line.marketplace_code, limit))?;

    cart.update_item_qty(delivery_code, item_id, granted)?;

    if granted == qty {
        return Ok(Vec::new());
    }

    Ok(vec![CartNotice::QtyAdjusted {
        item_id: line.id,
        delivery_code: delivery_code.to_string(),
        marketplace_code: line.marketplace_code,
        requested: qty,
        adjusted: granted,
    }])
}

#[async_trait]
impl CartOrderBehaviour for InMemoryCartOrderBehaviour {
    fn kind(&self) -> BehaviourKind {
        BehaviourKind::InMemory
    }

    async fn execute(
        &self,
        cart: &Cart,
        command: CartCommand,
    ) -> Result<CartUpdate, CartBehaviourError> {
        debug!(cart_id = %cart.id, command = command.name(), "executing cart command");

        match command {
            CartCommand::AddItem {
                delivery_code,
                request,
                delivery_info,
                limit,
            } => {
                let line = self.price_line(&request).await?;

                self.commit_with_notices(&cart.id, move |cart| {
                    add_line(cart, &delivery_code, line, delivery_info, limit)
                })
                .await
            }
            CartCommand::UpdateItemQty {
                delivery_code,
                item_id,
                qty,
                limit,
            } => {
                self.commit_with_notices(&cart.id, move |cart| {
                    set_line_qty(cart, &delivery_code, &item_id, qty, limit)
                })
                .await
            }
            CartCommand::DeleteItem {
                delivery_code,
                item_id,
            } => {
                self.commit(&cart.id, move |cart| {
                    cart.delete_item(&delivery_code, &item_id).map(|_item| ())
                })
                .await
            }
            CartCommand::DeleteAllItems => self.commit(&cart.id, Cart::delete_all_items).await,
            CartCommand::DeleteDelivery { delivery_code } => {
                self.commit(&cart.id, move |cart| {
                    cart.delete_delivery(&delivery_code).map(|_delivery| ())
                })
                .await
            }
            CartCommand::ApplyVoucher { code } => {
                let discount = *self.promotions.vouchers.get(&code).ok_or_else(|| {
                    CartBehaviourError::rejected(
                        message_codes::VOUCHER_INVALID,
                        format!("voucher {code} is not valid"),
                    )
                })?;

                self.commit(&cart.id, move |cart| {
                    cart.apply_voucher(AppliedVoucher::new(code, discount))
                })
                .await
            }
            CartCommand::RemoveVoucher { code } => {
                self.commit(&cart.id, move |cart| {
                    cart.remove_voucher(&code).map(|_voucher| ())
                })
                .await
            }
            CartCommand::ApplyGiftCard { code } => {
                let balance = *self.promotions.gift_cards.get(&code).ok_or_else(|| {
                    CartBehaviourError::rejected(
                        message_codes::GIFT_CARD_INVALID,
                        format!("gift card {code} is not valid"),
                    )
                })?;

                self.commit(&cart.id, move |cart| {
                    cart.apply_gift_card(AppliedGiftCard::new(code, balance))
                })
                .await
            }
            CartCommand::RemoveGiftCard { code } => {
                self.commit(&cart.id, move |cart| {
                    cart.remove_gift_card(&code).map(|_gift_card| ())
                })
                .await
            }
            CartCommand::UpdateDeliveryInfo {
                delivery_code,
                info,
            } => {
                let info = DeliveryInfo {
                    code: delivery_code,
                    ..info
                };

                self.commit(&cart.id, move |cart| cart.set_delivery_info(info))
                    .await
            }
            CartCommand::UpdateBillingAddress { address } => {
                self.commit(&cart.id, move |cart| cart.set_billing_address(address))
                    .await
            }
        }
    }

    async fn place_order(&self, cart: &Cart) -> Result<PlacedOrder, CartBehaviourError> {
        self.storage
            .update(&cart.id, |stored| {
                if let Some(infos) = &stored.placed_order {
                    return Ok(PlacedOrder {
                        cart: stored.cart.clone(),
                        infos: infos.clone(),
                        replayed: true,
                    });
                }

                if stored.cart.is_empty() {
                    return Err(CartBehaviourError::rejected(
                        message_codes::CART_EMPTY,
                        "an empty cart cannot be placed",
                    ));
                }

                let infos = PlacedOrderInfos(
                    stored
                        .cart
                        .deliveries
                        .iter()
                        .filter(|delivery| !delivery.is_empty())
                        .map(|delivery| PlacedOrderInfo {
                            order_number: Uuid::now_v7().to_string(),
                            delivery_code: delivery.code().to_string(),
                        })
                        .collect(),
                );

                stored.cart.mark_placed();
                stored.placed_order = Some(infos.clone());

                Ok(PlacedOrder {
                    cart: stored.cart.clone(),
                    infos,
                    replayed: false,
                })
            })
            .await
            .unwrap_or(Err(CartBehaviourError::NotFound))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;
    use trolley::cart::CartStatus;

    use crate::{domain::products::InMemoryProductService, test::fixtures};

    use super::*;

    fn behaviour_with(settings: &CartSettings) -> (Arc<InMemoryCartStorage>, InMemoryCartOrderBehaviour) {
        let storage = Arc::new(InMemoryCartStorage::new());
        let products = Arc::new(InMemoryProductService::new(fixtures::catalog()));

        let behaviour = InMemoryCartOrderBehaviour::new(storage.clone(), products, settings);

        (storage, behaviour)
    }

    fn new_cart(storage: &InMemoryCartStorage) -> Cart {
        let cart = Cart::new(Uuid::now_v7().to_string(), "EUR");

        storage.insert(cart.clone());

        cart
    }

    fn add(code: &str, qty: i64) -> CartCommand {
        CartCommand::add_item("delivery", AddRequest::new(code, None, qty))
    }

    #[tokio::test]
    async fn add_item_prices_line_from_catalog() -> TestResult {
        let settings = CartSettings {
            default_tax_rate: Decimal::from(19),
            ..CartSettings::default()
        };
        let (storage, behaviour) = behaviour_with(&settings);
        let cart = new_cart(&storage);

        let update = behaviour.execute(&cart, add(fixtures::SHIRT, 2)).await?;

        let item = update.cart.items().next().ok_or("missing line")?;

        assert_eq!(item.single_price_net, 1_000);
        assert_eq!(item.single_price_gross, 1_190);
        assert_eq!(update.cart.totals.sub_total_gross, 2_380);
        assert_eq!(update.cart.status, CartStatus::Active);
        assert_eq!(storage.get(&cart.id).await, Some(update.cart));

        Ok(())
    }

    #[tokio::test]
    async fn add_item_uses_variant_price() -> TestResult {
        let (storage, behaviour) = behaviour_with(&CartSettings::default());
        let cart = new_cart(&storage);

        let update = behaviour
            .execute(
                &cart,
                CartCommand::add_item(
                    "delivery",
                    AddRequest::new(fixtures::SHOE, Some(fixtures::SHOE_42.to_string()), 1),
                ),
            )
            .await?;

        assert_eq!(update.cart.totals.sub_total_net, 5_500);

        let missing_variant = behaviour.execute(&cart, add(fixtures::SHOE, 1)).await;

        assert!(
            matches!(
                &missing_variant,
                Err(CartBehaviourError::CommandRejected { message_code, .. })
                    if message_code == message_codes::VARIANT_REQUIRED
            ),
            "expected variant rejection, got {missing_variant:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_is_rejected() {
        let (storage, behaviour) = behaviour_with(&CartSettings::default());
        let cart = new_cart(&storage);

        let result = behaviour.execute(&cart, add("nope", 1)).await;

        assert!(
            matches!(
                &result,
                Err(CartBehaviourError::CommandRejected { message_code, .. })
                    if message_code == message_codes::PRODUCT_NOT_FOUND
            ),
            "expected rejection, got {result:?}"
        );
    }

    #[tokio::test]
    async fn unknown_cart_is_not_found() {
        let (_storage, behaviour) = behaviour_with(&CartSettings::default());

        let result = behaviour
            .execute(&Cart::new("ghost", "EUR"), CartCommand::DeleteAllItems)
            .await;

        assert!(
            matches!(result, Err(CartBehaviourError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn vouchers_must_be_known() -> TestResult {
        let (storage, behaviour) = behaviour_with(&CartSettings::default());
        let cart = new_cart(&storage);

        behaviour.execute(&cart, add(fixtures::SHIRT, 2)).await?;

        let invalid = behaviour
            .execute(
                &cart,
                CartCommand::ApplyVoucher {
                    code: "bogus".to_string(),
                },
            )
            .await;

        assert!(
            matches!(invalid, Err(CartBehaviourError::CommandRejected { .. })),
            "expected rejection, got {invalid:?}"
        );

        let update = behaviour
            .execute(
                &cart,
                CartCommand::ApplyVoucher {
                    code: "valid_voucher".to_string(),
                },
            )
            .await?;

        assert_eq!(update.cart.totals.total_discount, 200);
        assert_eq!(update.cart.totals.grand_total, 1_800);

        Ok(())
    }

    #[tokio::test]
    async fn removing_last_item_drops_vouchers() -> TestResult {
        let (storage, behaviour) = behaviour_with(&CartSettings::default());
        let cart = new_cart(&storage);

        behaviour.execute(&cart, add(fixtures::SHIRT, 1)).await?;
        behaviour
            .execute(
                &cart,
                CartCommand::ApplyVoucher {
                    code: "valid_voucher".to_string(),
                },
            )
            .await?;

        let update = behaviour.execute(&cart, CartCommand::DeleteAllItems).await?;

        assert!(update.cart.applied_vouchers.is_empty(), "voucher kept");
        assert_eq!(
            update.notices,
            vec![CartNotice::CouponCodeRemoved {
                code: "valid_voucher".to_string()
            }]
        );

        Ok(())
    }

    #[tokio::test]
    async fn empty_deliveries_are_removed_when_configured() -> TestResult {
        let settings = CartSettings {
            delete_empty_delivery: true,
            ..CartSettings::default()
        };
        let (storage, behaviour) = behaviour_with(&settings);
        let cart = new_cart(&storage);

        let update = behaviour.execute(&cart, add(fixtures::SHIRT, 1)).await?;
        let item_id = update
            .cart
            .items()
            .next()
            .map(|item| item.id.clone())
            .ok_or("missing line")?;

        let update = behaviour
            .execute(
                &cart,
                CartCommand::DeleteItem {
                    delivery_code: "delivery".to_string(),
                    item_id,
                },
            )
            .await?;

        assert!(update.cart.deliveries.is_empty(), "delivery kept");
        assert!(
            update.notices.contains(&CartNotice::DeliveryRemoved {
                delivery_code: "delivery".to_string()
            }),
            "missing notice in {:?}",
            update.notices
        );

        Ok(())
    }

    #[tokio::test]
    async fn empty_deliveries_stay_by_default() -> TestResult {
        let (storage, behaviour) = behaviour_with(&CartSettings::default());
        let cart = new_cart(&storage);

        behaviour.execute(&cart, add(fixtures::SHIRT, 1)).await?;

        let update = behaviour.execute(&cart, CartCommand::DeleteAllItems).await?;

        assert!(update.cart.has_delivery("delivery"), "delivery removed");

        Ok(())
    }

    #[tokio::test]
    async fn place_order_is_idempotent() -> TestResult {
        let (storage, behaviour) = behaviour_with(&CartSettings::default());
        let cart = new_cart(&storage);

        behaviour.execute(&cart, add(fixtures::SHIRT, 1)).await?;

        let first = behaviour.place_order(&cart).await?;
        let second = behaviour.place_order(&cart).await?;

        assert!(!first.replayed, "first placement is fresh");
        assert!(second.replayed, "second placement is a replay");
        assert_eq!(first.infos, second.infos);
        assert_eq!(first.infos.0.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn placed_cart_rejects_commands() -> TestResult {
        let (storage, behaviour) = behaviour_with(&CartSettings::default());
        let cart = new_cart(&storage);

        behaviour.execute(&cart, add(fixtures::SHIRT, 1)).await?;
        behaviour.place_order(&cart).await?;

        let result = behaviour.execute(&cart, add(fixtures::SHIRT, 1)).await;

        assert!(
            matches!(result, Err(CartBehaviourError::CartAlreadyPlaced)),
            "expected CartAlreadyPlaced, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn empty_cart_cannot_be_placed() {
        let (storage, behaviour) = behaviour_with(&CartSettings::default());
        let cart = new_cart(&storage);

        let result = behaviour.place_order(&cart).await;

        assert!(
            matches!(result, Err(CartBehaviourError::CommandRejected { .. })),
            "expected rejection, got {result:?}"
        );
    }

    fn limited_add(delivery_code: &str, qty: i64, clamp: bool) -> CartCommand {
        CartCommand::AddItem {
            delivery_code: delivery_code.to_string(),
            request: AddRequest::new(fixtures::LIMITED, None, qty),
            delivery_info: None,
            limit: Some(QtyLimit::new(2, clamp)),
        }
    }

    #[tokio::test]
    async fn limit_is_checked_against_stored_cart() -> TestResult {
        let (storage, behaviour) = behaviour_with(&CartSettings::default());
        let cart = new_cart(&storage);

        behaviour.execute(&cart, limited_add("delivery", 2, false)).await?;

        let rejected = behaviour.execute(&cart, limited_add("express", 1, false)).await;

        assert!(
            matches!(
                &rejected,
                Err(CartBehaviourError::CommandRejected { message_code, .. })
                    if message_code == message_codes::QTY_RESTRICTED
            ),
            "expected restriction, got {rejected:?}"
        );

        let stored = storage.get(&cart.id).await.ok_or("cart vanished")?;

        assert!(!stored.has_delivery("express"), "rejected add created a delivery");

        Ok(())
    }

    #[tokio::test]
    async fn limit_clamps_with_notice() -> TestResult {
        let (storage, behaviour) = behaviour_with(&CartSettings::default());
        let cart = new_cart(&storage);

        let update = behaviour.execute(&cart, limited_add("delivery", 5, true)).await?;
        let line = update.cart.items().next().ok_or("missing line")?;

        assert_eq!(line.qty, 2);
        assert_eq!(
            update.notices,
            vec![CartNotice::QtyAdjusted {
                item_id: line.id.clone(),
                delivery_code: "delivery".to_string(),
                marketplace_code: fixtures::LIMITED.to_string(),
                requested: 5,
                adjusted: 2,
            }]
        );

        Ok(())
    }

    #[tokio::test]
    async fn qty_limit_counts_other_deliveries() -> TestResult {
        let (storage, behaviour) = behaviour_with(&CartSettings::default());
        let cart = new_cart(&storage);

        behaviour.execute(&cart, limited_add("delivery", 1, false)).await?;

        let update = behaviour.execute(&cart, limited_add("express", 1, false)).await?;
        let item_id = update
            .cart
            .delivery("express")
            .and_then(|delivery| delivery.items.first())
            .map(|item| item.id.clone())
            .ok_or("missing line")?;

        let result = behaviour
            .execute(
                &cart,
                CartCommand::UpdateItemQty {
                    delivery_code: "express".to_string(),
                    item_id,
                    qty: 2,
                    limit: Some(QtyLimit::new(2, false)),
                },
            )
            .await;

        assert!(
            matches!(result, Err(CartBehaviourError::CommandRejected { .. })),
            "expected restriction, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_item_creates_delivery_with_given_info() -> TestResult {
        let (storage, behaviour) = behaviour_with(&CartSettings::default());
        let cart = new_cart(&storage);

        let info = DeliveryInfo {
            method: "pickup".to_string(),
            ..DeliveryInfo::new("ignored")
        };

        let update = behaviour
            .execute(
                &cart,
                CartCommand::AddItem {
                    delivery_code: "express".to_string(),
                    request: AddRequest::new(fixtures::SHIRT, None, 1),
                    delivery_info: Some(info),
                    limit: None,
                },
            )
            .await?;

        let delivery = update.cart.delivery("express").ok_or("missing delivery")?;

        assert_eq!(delivery.info.method, "pickup");
        assert_eq!(delivery.items.len(), 1);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_limited_adds_never_exceed_the_limit() -> TestResult {
        let (storage, behaviour) = behaviour_with(&CartSettings::default());
        let behaviour = Arc::new(behaviour);
        let cart = new_cart(&storage);

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let behaviour = behaviour.clone();
                let cart = cart.clone();

                tokio::spawn(async move {
                    behaviour.execute(&cart, limited_add("delivery", 1, false)).await
                })
            })
            .collect();

        let mut accepted = 0;

        for task in tasks {
            if task.await?.is_ok() {
                accepted += 1;
            }
        }

        let stored = storage.get(&cart.id).await.ok_or("cart vanished")?;

        assert_eq!(accepted, 2);
        assert_eq!(stored.qty_of(fixtures::LIMITED, None), 2);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_are_serialised() -> TestResult {
        const ADDS: u64 = 50;

        let (storage, behaviour) = behaviour_with(&CartSettings::default());
        let behaviour = Arc::new(behaviour);
        let cart = new_cart(&storage);

        behaviour.execute(&cart, add(fixtures::SHIRT, 3)).await?;

        let tasks: Vec<_> = (0..ADDS)
            .map(|_| {
                let behaviour = behaviour.clone();
                let cart = cart.clone();

                tokio::spawn(async move { behaviour.execute(&cart, add(fixtures::SHIRT, 1)).await })
            })
            .collect();

        for task in tasks {
            task.await??;
        }

        let stored = storage.get(&cart.id).await.ok_or("cart vanished")?;

        assert_eq!(stored.qty_of(fixtures::SHIRT, None), 3 + ADDS);
        assert_eq!(stored.totals.sub_total_gross, (3 + ADDS) * 1_000);

        Ok(())
    }
}
