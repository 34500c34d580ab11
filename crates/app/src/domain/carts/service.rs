//! Cart service: the write path.

use std::{fmt, sync::Arc};

use serde::Serialize;
use tracing::info;
use trolley::{
    cart::{Address, Cart, DeliveryInfo},
    commands::{AddRequest, CartCommand, QtyLimit},
    decorated::DecoratedCart,
    notices::CartNotice,
    orders::PlacedOrderInfos,
    products::{Product, ProductKind},
};

use crate::{
    domain::{
        carts::{
            behaviour::{CartOrderBehaviour, CartUpdate},
            delivery_info::DeliveryInfoBuilder,
            errors::{CartBehaviourError, CartServiceError, message_codes},
            events::EventPublisher,
            receiver::CartReceiverService,
            validation::{CartValidationResult, CartValidator, ItemValidator},
        },
        products::{ProductService, ProductServiceError},
    },
    sessions::Session,
    settings::CartSettings,
};

/// A committed change: the re-fetched cart plus the notices it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartMutation {
    pub cart: DecoratedCart,
    pub notices: Vec<CartNotice>,
}

pub struct CartService {
    receiver: Arc<CartReceiverService>,
    products: Arc<dyn ProductService>,
    events: Arc<dyn EventPublisher>,
    delivery_info_builder: Arc<dyn DeliveryInfoBuilder>,
    item_validator: Option<Arc<dyn ItemValidator>>,
    cart_validator: Option<Arc<dyn CartValidator>>,
    settings: CartSettings,
}

impl fmt::Debug for CartService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartService")
            .field("receiver", &self.receiver)
            .field("has_item_validator", &self.item_validator.is_some())
            .field("has_cart_validator", &self.cart_validator.is_some())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl CartService {
    pub fn new(
        receiver: Arc<CartReceiverService>,
        products: Arc<dyn ProductService>,
        events: Arc<dyn EventPublisher>,
        delivery_info_builder: Arc<dyn DeliveryInfoBuilder>,
        settings: CartSettings,
    ) -> Self {
        Self {
            receiver,
            products,
            events,
            delivery_info_builder,
            item_validator: None,
            cart_validator: None,
            settings,
        }
    }

    #[must_use]
    pub fn with_item_validator(mut self, validator: Arc<dyn ItemValidator>) -> Self {
        self.item_validator = Some(validator);
        self
    }

    #[must_use]
    pub fn with_cart_validator(mut self, validator: Arc<dyn CartValidator>) -> Self {
        self.cart_validator = Some(validator);
        self
    }

    pub fn receiver(&self) -> &CartReceiverService {
        &self.receiver
    }

    pub(crate) fn events(&self) -> &dyn EventPublisher {
        self.events.as_ref()
    }

    /// Builds an add request. Quantities below one become one.
    pub fn build_add_request(
        &self,
        marketplace_code: &str,
        variant_marketplace_code: Option<String>,
        qty: i64,
    ) -> AddRequest {
        AddRequest::new(marketplace_code, variant_marketplace_code, qty)
    }

    /// Adds a product to a delivery of the session's cart.
    ///
    /// The product must exist in the catalog. Quantities above the product's
    /// restriction are clamped or rejected depending on
    /// [`CartSettings::adjust_items_to_restricted_qty`]. The backend checks the
    /// restriction and creates a missing delivery in the same commit as the line.
    ///
    /// # Errors
    ///
    /// Rejections carry a message code, see [`CartServiceError::message_code`].
    pub async fn add_product(
        &self,
        session: &mut Session,
        delivery_code: &str,
        request: AddRequest,
    ) -> Result<CartMutation, CartServiceError> {
        let delivery_code = self
            .settings
            .delivery_code_or_default(delivery_code)
            .to_string();

        let product = self
            .resolve_product(
                &request.marketplace_code,
                request.variant_marketplace_code.as_deref(),
            )
            .await?;

        if request.variant_marketplace_code.is_none()
            && matches!(product.kind, ProductKind::Configurable { .. })
        {
            return Err(CartServiceError::rejected(
                message_codes::VARIANT_REQUIRED,
                format!("product {} needs a variant", request.marketplace_code),
            ));
        }

        if let Some(validator) = &self.item_validator {
            validator
                .validate(session, &delivery_code, &request, &product)
                .await
                .map_err(|error| CartServiceError::Rejected {
                    message: error.message,
                    message_code: error.message_code,
                })?;
        }

        let (cart, behaviour) = self.receiver.get_cart(session).await?;

        let delivery_info = if cart.has_delivery(&delivery_code) {
            None
        } else {
            Some(
                self.delivery_info_builder
                    .build_by_delivery_code(&delivery_code)?,
            )
        };

        let update = self
            .run(
                session,
                &cart,
                behaviour.as_ref(),
                CartCommand::AddItem {
                    delivery_code,
                    request: request.clone(),
                    delivery_info,
                    limit: self.qty_limit(&product),
                },
            )
            .await?;

        let mut added = request;

        let adjusted = update.notices.iter().find_map(|notice| match notice {
            CartNotice::QtyAdjusted {
                marketplace_code,
                adjusted,
                ..
            } if *marketplace_code == added.marketplace_code => Some(*adjusted),
            _ => None,
        });

        if let Some(adjusted) = adjusted {
            added.qty = adjusted;
        }

        self.events.publish_add_to_cart(&added);

        self.finish(session, update.notices).await
    }

    /// Sets a line's quantity. Quantities below one delete the line.
    ///
    /// The product's restriction applies as in [`Self::add_product`], counting
    /// the product's lines in other deliveries too.
    ///
    /// # Errors
    ///
    /// Rejects unknown lines with [`message_codes::ITEM_NOT_FOUND`].
    pub async fn update_item_qty(
        &self,
        session: &mut Session,
        delivery_code: &str,
        item_id: &str,
        qty: i64,
    ) -> Result<CartMutation, CartServiceError> {
        let delivery_code = self
            .settings
            .delivery_code_or_default(delivery_code)
            .to_string();
        let (cart, behaviour) = self.receiver.get_cart(session).await?;

        let item = cart
            .find_item(&delivery_code, item_id)
            .cloned()
            .ok_or_else(|| {
                CartServiceError::rejected(
                    message_codes::ITEM_NOT_FOUND,
                    format!("item {item_id} not found in delivery {delivery_code}"),
                )
            })?;

        if qty < 1 {
            let update = self
                .run(
                    session,
                    &cart,
                    behaviour.as_ref(),
                    CartCommand::DeleteItem {
                        delivery_code,
                        item_id: item.id.clone(),
                    },
                )
                .await?;

            return self.finish(session, update.notices).await;
        }

        let qty = u32::try_from(qty).unwrap_or(u32::MAX);

        let limit = match self
            .resolve_product(
                &item.marketplace_code,
                item.variant_marketplace_code.as_deref(),
            )
            .await
        {
            Ok(product) => self.qty_limit(&product),
            Err(CartServiceError::ProductNotFound(_) | CartServiceError::Rejected { .. }) => None,
            Err(error) => return Err(error),
        };

        let update = self
            .run(
                session,
                &cart,
                behaviour.as_ref(),
                CartCommand::UpdateItemQty {
                    delivery_code: delivery_code.clone(),
                    item_id: item.id.clone(),
                    qty,
                    limit,
                },
            )
            .await?;

        let granted = update
            .cart
            .find_item(&delivery_code, &item.id)
            .map_or(qty, |line| line.qty);

        self.events
            .publish_qty_changed(&item, item.qty, granted, &cart.id);

        self.finish(session, update.notices).await
    }

    pub async fn delete_item(
        &self,
        session: &mut Session,
        delivery_code: &str,
        item_id: &str,
    ) -> Result<CartMutation, CartServiceError> {
        let delivery_code = self
            .settings
            .delivery_code_or_default(delivery_code)
            .to_string();

        self.execute(
            session,
            CartCommand::DeleteItem {
                delivery_code,
                item_id: item_id.to_string(),
            },
        )
        .await
    }

    pub async fn delete_all_items(
        &self,
        session: &mut Session,
    ) -> Result<CartMutation, CartServiceError> {
        self.execute(session, CartCommand::DeleteAllItems).await
    }

    pub async fn delete_delivery(
        &self,
        session: &mut Session,
        delivery_code: &str,
    ) -> Result<CartMutation, CartServiceError> {
        self.execute(
            session,
            CartCommand::DeleteDelivery {
                delivery_code: delivery_code.to_string(),
            },
        )
        .await
    }

    pub async fn apply_voucher(
        &self,
        session: &mut Session,
        code: &str,
    ) -> Result<CartMutation, CartServiceError> {
        self.execute(
            session,
            CartCommand::ApplyVoucher {
                code: code.to_string(),
            },
        )
        .await
    }

    pub async fn remove_voucher(
        &self,
        session: &mut Session,
        code: &str,
    ) -> Result<CartMutation, CartServiceError> {
        self.execute(
            session,
            CartCommand::RemoveVoucher {
                code: code.to_string(),
            },
        )
        .await
    }

    pub async fn apply_gift_card(
        &self,
        session: &mut Session,
        code: &str,
    ) -> Result<CartMutation, CartServiceError> {
        self.execute(
            session,
            CartCommand::ApplyGiftCard {
                code: code.to_string(),
            },
        )
        .await
    }

    pub async fn remove_gift_card(
        &self,
        session: &mut Session,
        code: &str,
    ) -> Result<CartMutation, CartServiceError> {
        self.execute(
            session,
            CartCommand::RemoveGiftCard {
                code: code.to_string(),
            },
        )
        .await
    }

    /// Applies a code as voucher, or as gift card when no voucher matches.
    ///
    /// # Errors
    ///
    /// Rejects with [`message_codes::CODE_INVALID`] when neither applies.
    pub async fn apply_voucher_or_gift_card(
        &self,
        session: &mut Session,
        code: &str,
    ) -> Result<CartMutation, CartServiceError> {
        let (cart, behaviour) = self.receiver.get_cart(session).await?;

        let voucher = self
            .run(
                session,
                &cart,
                behaviour.as_ref(),
                CartCommand::ApplyVoucher {
                    code: code.to_string(),
                },
            )
            .await;

        let update = match voucher {
            Err(CartServiceError::Behaviour(CartBehaviourError::CommandRejected { .. })) => {
                match self
                    .run(
                        session,
                        &cart,
                        behaviour.as_ref(),
                        CartCommand::ApplyGiftCard {
                            code: code.to_string(),
                        },
                    )
                    .await
                {
                    Err(CartServiceError::Behaviour(CartBehaviourError::CommandRejected {
                        ..
                    })) => {
                        return Err(CartServiceError::rejected(
                            message_codes::CODE_INVALID,
                            format!("{code} is neither a valid voucher nor a valid gift card"),
                        ));
                    }
                    result => result?,
                }
            }
            result => result?,
        };

        self.finish(session, update.notices).await
    }

    pub async fn update_delivery_info(
        &self,
        session: &mut Session,
        delivery_code: &str,
        info: DeliveryInfo,
    ) -> Result<CartMutation, CartServiceError> {
        self.execute(
            session,
            CartCommand::UpdateDeliveryInfo {
                delivery_code: delivery_code.to_string(),
                info,
            },
        )
        .await
    }

    pub async fn update_billing_address(
        &self,
        session: &mut Session,
        address: Address,
    ) -> Result<CartMutation, CartServiceError> {
        self.execute(session, CartCommand::UpdateBillingAddress { address })
            .await
    }

    /// Places the session's cart.
    ///
    /// On success the session loses its guest cart key and its cached carts,
    /// so the next request starts a new cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartServiceError::InvalidCart`] when validation fails.
    pub async fn place_order(
        &self,
        session: &mut Session,
    ) -> Result<PlacedOrderInfos, CartServiceError> {
        let (decorated, behaviour) = self.receiver.get_decorated_cart(session).await?;

        let validation = self.validate_cart(session, &decorated).await;

        if !validation.is_valid() {
            return Err(CartServiceError::InvalidCart(validation));
        }

        let placed = match behaviour.place_order(&decorated.cart).await {
            Ok(placed) => placed,
            Err(error) => {
                if matches!(error, CartBehaviourError::NotFound) {
                    self.receiver.delete_cached_cart(session).await;
                }

                return Err(error.into());
            }
        };

        if !placed.replayed {
            self.events.publish_order_placed(&placed.cart, &placed.infos);

            info!(
                cart_id = %placed.cart.id,
                grand_total = placed.cart.totals.grand_total,
                currency = %placed.cart.currency_code,
                order_numbers = ?placed.infos.order_numbers().collect::<Vec<_>>(),
                "order placed"
            );
        }

        self.receiver.delete_all_cached_carts(session).await;
        session.clear_guest_cart_id();

        Ok(placed.infos)
    }

    /// Forgets the session's guest cart together with its queued notices.
    ///
    /// # Errors
    ///
    /// The in-memory session never fails here.
    pub async fn delete_saved_session_guest_cart_id(
        &self,
        session: &mut Session,
    ) -> Result<(), CartServiceError> {
        self.receiver.delete_cached_cart(session).await;

        session.clear_guest_cart_id();
        session.take_notices();

        Ok(())
    }

    pub async fn validate_cart(
        &self,
        session: &Session,
        cart: &DecoratedCart,
    ) -> CartValidationResult {
        match &self.cart_validator {
            Some(validator) => validator.validate(session, cart).await,
            None => CartValidationResult::valid(),
        }
    }

    /// Reduces lines above their product's restriction and removes lines
    /// whose product can no longer be ordered at all.
    ///
    /// # Errors
    ///
    /// Fails when the cart cannot be received or a command fails.
    pub async fn adjust_items_to_restricted_qty(
        &self,
        session: &mut Session,
    ) -> Result<CartMutation, CartServiceError> {
        let (decorated, behaviour) = self.receiver.get_decorated_cart(session).await?;
        let mut notices = Vec::new();

        for (delivery, line) in decorated.items() {
            let Some(max_qty) = line.product.effective_max_qty() else {
                continue;
            };

            if line.item.qty <= max_qty {
                continue;
            }

            let delivery_code = delivery.delivery.code().to_string();

            let command = if max_qty == 0 {
                notices.push(CartNotice::ItemRemoved {
                    item_id: line.item.id.clone(),
                    delivery_code: delivery_code.clone(),
                    marketplace_code: line.item.marketplace_code.clone(),
                });

                CartCommand::DeleteItem {
                    delivery_code,
                    item_id: line.item.id.clone(),
                }
            } else {
                notices.push(CartNotice::QtyAdjusted {
                    item_id: line.item.id.clone(),
                    delivery_code: delivery_code.clone(),
                    marketplace_code: line.item.marketplace_code.clone(),
                    requested: line.item.qty,
                    adjusted: max_qty,
                });

                CartCommand::UpdateItemQty {
                    delivery_code,
                    item_id: line.item.id.clone(),
                    qty: max_qty,
                    limit: None,
                }
            };

            let update = self
                .run(session, &decorated.cart, behaviour.as_ref(), command)
                .await?;

            notices.extend(update.notices);
        }

        if notices.is_empty() {
            return Ok(CartMutation {
                cart: decorated,
                notices,
            });
        }

        self.finish(session, notices).await
    }

    /// Drains the notices queued on the session.
    pub fn take_notices(&self, session: &mut Session) -> Vec<CartNotice> {
        session.take_notices()
    }

    /// Looks a product up in the catalog, switched to the given variant.
    pub(crate) async fn resolve_product(
        &self,
        marketplace_code: &str,
        variant: Option<&str>,
    ) -> Result<Product, CartServiceError> {
        let product = match self.products.get(marketplace_code).await {
            Ok(product) => product,
            Err(ProductServiceError::NotFound) => {
                return Err(CartServiceError::ProductNotFound(marketplace_code.to_string()));
            }
            Err(error) => return Err(CartServiceError::Product(error)),
        };

        match variant {
            Some(variant) => product.with_active_variant(variant).ok_or_else(|| {
                CartServiceError::rejected(
                    message_codes::VARIANT_NOT_FOUND,
                    format!("variant {variant} of product {marketplace_code} not found"),
                )
            }),
            None => Ok(product),
        }
    }

    /// The product's restriction, enforced by the backend against the stored cart.
    pub(crate) fn qty_limit(&self, product: &Product) -> Option<QtyLimit> {
        product
            .effective_max_qty()
            .map(|max_qty| QtyLimit::new(max_qty, self.settings.adjust_items_to_restricted_qty))
    }

    async fn execute(
        &self,
        session: &mut Session,
        command: CartCommand,
    ) -> Result<CartMutation, CartServiceError> {
        let (cart, behaviour) = self.receiver.get_cart(session).await?;

        let update = self
            .run(session, &cart, behaviour.as_ref(), command)
            .await?;

        self.finish(session, update.notices).await
    }

    /// Runs one command and keeps the session's cache entry in line with the outcome.
    async fn run(
        &self,
        session: &Session,
        cart: &Cart,
        behaviour: &dyn CartOrderBehaviour,
        command: CartCommand,
    ) -> Result<CartUpdate, CartServiceError> {
        match behaviour.execute(cart, command).await {
            Ok(update) => {
                self.receiver.invalidate_cached_cart(session).await;

                Ok(update)
            }
            Err(CartBehaviourError::NotFound) => {
                self.receiver.delete_cached_cart(session).await;

                Err(CartBehaviourError::NotFound.into())
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn finish(
        &self,
        session: &mut Session,
        notices: Vec<CartNotice>,
    ) -> Result<CartMutation, CartServiceError> {
        session.push_notices(notices.iter().cloned());

        let (cart, _behaviour) = self.receiver.get_decorated_cart(session).await?;

        Ok(CartMutation { cart, notices })
    }
}
