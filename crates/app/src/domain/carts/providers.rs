//! Guest and customer cart providers.

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use trolley::cart::Cart;
use uuid::Uuid;

use crate::{
    auth::Auth,
    domain::carts::{
        behaviour::{CartOrderBehaviour, InMemoryCartStorage},
        errors::CartProviderError,
    },
};

/// Cart id addressing "the current cart" of an authenticated customer.
pub const CUSTOMER_CART_ID: &str = "me";

/// Carts for anonymous sessions.
pub struct DefaultGuestCartService {
    storage: Arc<InMemoryCartStorage>,
    behaviour: Arc<dyn CartOrderBehaviour>,
    currency_code: String,
}

impl fmt::Debug for DefaultGuestCartService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultGuestCartService")
            .field("currency_code", &self.currency_code)
            .finish_non_exhaustive()
    }
}

impl DefaultGuestCartService {
    pub fn new(
        storage: Arc<InMemoryCartStorage>,
        behaviour: Arc<dyn CartOrderBehaviour>,
        currency_code: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            behaviour,
            currency_code: currency_code.into(),
        }
    }
}

#[async_trait]
impl GuestCartService for DefaultGuestCartService {
    async fn get_cart(&self, cart_id: &str) -> Result<Cart, CartProviderError> {
        self.storage
            .get(cart_id)
            .await
            .ok_or(CartProviderError::NotFound)
    }

    async fn get_new_cart(&self) -> Result<Cart, CartProviderError> {
        let cart = Cart::new(Uuid::now_v7().to_string(), self.currency_code.clone());

        self.storage.insert(cart.clone());

        Ok(cart)
    }

    fn get_cart_order_behaviour(&self) -> Arc<dyn CartOrderBehaviour> {
        self.behaviour.clone()
    }
}

/// Carts of authenticated customers, one open cart per subject.
///
/// The open cart is created on first access and replaced once it has been placed.
pub struct DefaultCustomerCartService {
    storage: Arc<InMemoryCartStorage>,
    behaviour: Arc<dyn CartOrderBehaviour>,
    currency_code: String,
    open_carts: Mutex<FxHashMap<String, String>>,
}

impl fmt::Debug for DefaultCustomerCartService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultCustomerCartService")
            .field("currency_code", &self.currency_code)
            .finish_non_exhaustive()
    }
}

impl DefaultCustomerCartService {
    pub fn new(
        storage: Arc<InMemoryCartStorage>,
        behaviour: Arc<dyn CartOrderBehaviour>,
        currency_code: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            behaviour,
            currency_code: currency_code.into(),
            open_carts: Mutex::new(FxHashMap::default()),
        }
    }

    fn open_cart_id(&self, subject: &str) -> Option<String> {
        self.open_carts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(subject)
            .cloned()
    }

    fn open_new_cart(&self, subject: &str) -> Cart {
        let cart = Cart::new(Uuid::now_v7().to_string(), self.currency_code.clone());

        self.storage.insert(cart.clone());
        self.open_carts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(subject.to_string(), cart.id.clone());

        cart
    }
}

#[async_trait]
impl CustomerCartService for DefaultCustomerCartService {
    async fn get_cart(&self, auth: &Auth, cart_id: &str) -> Result<Cart, CartProviderError> {
        let open_cart_id = self.open_cart_id(&auth.subject);

        if cart_id != CUSTOMER_CART_ID && open_cart_id.as_deref() != Some(cart_id) {
            return Err(CartProviderError::NotFound);
        }

        let open_cart = match open_cart_id {
            Some(id) => self.storage.get(&id).await,
            None => None,
        };

        match open_cart {
            Some(cart) if !cart.is_placed() => Ok(cart),
            _ => Ok(self.open_new_cart(&auth.subject)),
        }
    }

    fn get_cart_order_behaviour(&self, _auth: &Auth) -> Arc<dyn CartOrderBehaviour> {
        self.behaviour.clone()
    }
}

/// Provides carts for anonymous sessions.
#[automock]
#[async_trait]
pub trait GuestCartService: Send + Sync {
    async fn get_cart(&self, cart_id: &str) -> Result<Cart, CartProviderError>;

    /// Allocates a fresh cart. Always succeeds for healthy backends.
    async fn get_new_cart(&self) -> Result<Cart, CartProviderError>;

    fn get_cart_order_behaviour(&self) -> Arc<dyn CartOrderBehaviour>;
}

/// Provides carts tied to an authenticated identity.
#[automock]
#[async_trait]
pub trait CustomerCartService: Send + Sync {
    /// Pass [`CUSTOMER_CART_ID`] to address the customer's current cart.
    async fn get_cart(&self, auth: &Auth, cart_id: &str) -> Result<Cart, CartProviderError>;

    fn get_cart_order_behaviour(&self, auth: &Auth) -> Arc<dyn CartOrderBehaviour>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;
    use trolley::commands::{AddRequest, CartCommand};

    use crate::test::fixtures;

    use super::*;

    fn providers() -> (Arc<InMemoryCartStorage>, DefaultGuestCartService, DefaultCustomerCartService) {
        let storage = Arc::new(InMemoryCartStorage::new());
        let behaviour = fixtures::in_memory_behaviour(storage.clone());

        (
            storage.clone(),
            DefaultGuestCartService::new(storage.clone(), behaviour.clone(), "EUR"),
            DefaultCustomerCartService::new(storage, behaviour, "EUR"),
        )
    }

    #[tokio::test]
    async fn guest_carts_get_fresh_ids() -> TestResult {
        let (storage, guests, _customers) = providers();

        let first = guests.get_new_cart().await?;
        let second = guests.get_new_cart().await?;

        assert_ne!(first.id, second.id);
        assert!(storage.has_cart(&first.id), "first cart not stored");
        assert_eq!(guests.get_cart(&second.id).await?, second);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_guest_cart_is_not_found() {
        let (_storage, guests, _customers) = providers();

        let result = guests.get_cart("missing").await;

        assert!(
            matches!(result, Err(CartProviderError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn customer_cart_is_stable_per_subject() -> TestResult {
        let (_storage, _guests, customers) = providers();
        let alice = Auth::new("alice", "token-a");
        let bob = Auth::new("bob", "token-b");

        let first = customers.get_cart(&alice, CUSTOMER_CART_ID).await?;
        let again = customers.get_cart(&alice, &first.id).await?;
        let other = customers.get_cart(&bob, CUSTOMER_CART_ID).await?;

        assert_eq!(first.id, again.id);
        assert_ne!(first.id, other.id);

        let foreign = customers.get_cart(&bob, &first.id).await;

        assert!(
            matches!(foreign, Err(CartProviderError::NotFound)),
            "expected NotFound, got {foreign:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn placed_customer_cart_is_replaced() -> TestResult {
        let (_storage, _guests, customers) = providers();
        let alice = Auth::new("alice", "token-a");

        let cart = customers.get_cart(&alice, CUSTOMER_CART_ID).await?;
        let behaviour = customers.get_cart_order_behaviour(&alice);

        behaviour
            .execute(
                &cart,
                CartCommand::add_item("delivery", AddRequest::new(fixtures::SHIRT, None, 1)),
            )
            .await?;
        behaviour.place_order(&cart).await?;

        let next = customers.get_cart(&alice, CUSTOMER_CART_ID).await?;

        assert_ne!(next.id, cart.id);
        assert!(next.is_empty(), "new cart should start empty");

        Ok(())
    }
}
