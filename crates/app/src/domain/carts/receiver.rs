//! Cart receiver: resolves, decorates and caches the session's cart.

use std::{fmt, sync::Arc};

use tracing::{debug, warn};
use trolley::{cart::Cart, decorated::DecoratedCart};

use crate::{
    auth::Auth,
    domain::carts::{
        behaviour::CartOrderBehaviour,
        cache::{CartCache, CartCacheIdentifier},
        decorator::DecoratedCartFactory,
        errors::{CartProviderError, CartReceiverError},
        providers::{CUSTOMER_CART_ID, CustomerCartService, GuestCartService},
    },
    sessions::Session,
    settings::CartSettings,
};

/// Which provider a session resolves to.
enum Origin<'a> {
    Guest(&'a str),
    Customer(&'a Auth),
    Anonymous,
}

impl<'a> Origin<'a> {
    /// A non-empty guest id wins over authentication.
    fn of(session: &'a Session) -> Self {
        match (
            session.guest_cart_id().filter(|id| !id.is_empty()),
            session.auth(),
        ) {
            (Some(cart_id), _) => Origin::Guest(cart_id),
            (None, Some(auth)) => Origin::Customer(auth),
            (None, None) => Origin::Anonymous,
        }
    }
}

fn temporary(error: &CartProviderError) -> CartReceiverError {
    warn!(%error, "cart provider failed");

    CartReceiverError::TemporaryCartService
}

pub struct CartReceiverService {
    guest_carts: Arc<dyn GuestCartService>,
    customer_carts: Arc<dyn CustomerCartService>,
    decorator: DecoratedCartFactory,
    cache: Option<Arc<dyn CartCache>>,
    customer_guest_fallback: bool,
}

impl fmt::Debug for CartReceiverService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartReceiverService")
            .field("has_cache", &self.cache.is_some())
            .field("customer_guest_fallback", &self.customer_guest_fallback)
            .finish_non_exhaustive()
    }
}

impl CartReceiverService {
    pub fn new(
        guest_carts: Arc<dyn GuestCartService>,
        customer_carts: Arc<dyn CustomerCartService>,
        decorator: DecoratedCartFactory,
        cache: Option<Arc<dyn CartCache>>,
        settings: &CartSettings,
    ) -> Self {
        Self {
            guest_carts,
            customer_carts,
            decorator,
            cache,
            customer_guest_fallback: settings.customer_cart_guest_fallback,
        }
    }

    /// Whether the session carries the guest cart key, whatever its value.
    pub fn should_have_guest_cart(&self, session: &Session) -> bool {
        session.has_guest_cart_key()
    }

    /// The session's guest cart, or an empty cart when it has none.
    ///
    /// # Errors
    ///
    /// Any provider failure surfaces as [`CartReceiverError::TemporaryCartService`].
    pub async fn view_guest_cart(&self, session: &Session) -> Result<Cart, CartReceiverError> {
        let Some(cart_id) = session.guest_cart_id() else {
            return Ok(Cart::default());
        };

        self.guest_carts
            .get_cart(cart_id)
            .await
            .map_err(|error| temporary(&error))
    }

    /// The session's cart without creating one.
    ///
    /// # Errors
    ///
    /// Returns [`CartReceiverError::TemporaryCartService`] when a provider fails.
    pub async fn view_cart(&self, session: &Session) -> Result<Cart, CartReceiverError> {
        let Origin::Customer(auth) = Origin::of(session) else {
            return self.view_guest_cart(session).await;
        };

        match self.customer_carts.get_cart(auth, CUSTOMER_CART_ID).await {
            Ok(cart) => Ok(cart),
            Err(CartProviderError::NotFound) if self.customer_guest_fallback => self
                .guest_carts
                .get_new_cart()
                .await
                .map_err(|error| temporary(&error)),
            Err(CartProviderError::NotFound) => Ok(Cart::default()),
            Err(error) => Err(temporary(&error)),
        }
    }

    /// Decorates a cart with catalog products.
    ///
    /// # Errors
    ///
    /// Returns [`CartReceiverError::NoCartGiven`] without a cart.
    pub async fn decorate_cart(&self, cart: Option<&Cart>) -> Result<DecoratedCart, CartReceiverError> {
        let cart = cart.ok_or(CartReceiverError::NoCartGiven)?;

        Ok(self.decorator.create(cart.clone()).await)
    }

    /// Read-only decorated view of the session's cart, served from the cache when possible.
    ///
    /// # Errors
    ///
    /// Returns [`CartReceiverError::TemporaryCartService`] when a provider fails.
    pub async fn view_decorated_cart(
        &self,
        session: &Session,
    ) -> Result<DecoratedCart, CartReceiverError> {
        if let Some(cached) = self.cached_cart(session).await {
            return Ok(cached);
        }

        let cart = self.view_cart(session).await?;
        let decorated = self.decorate_cart(Some(&cart)).await?;

        if !cart.id.is_empty() {
            self.store_cached_cart(session, &decorated).await;
        }

        Ok(decorated)
    }

    /// The session's cart and the behaviour that mutates it, creating a
    /// guest cart when the session has none or its guest cart is gone.
    ///
    /// # Errors
    ///
    /// Returns [`CartReceiverError::TemporaryCartService`] when a provider fails.
    pub async fn get_cart(
        &self,
        session: &mut Session,
    ) -> Result<(Cart, Arc<dyn CartOrderBehaviour>), CartReceiverError> {
        match Origin::of(session) {
            Origin::Guest(cart_id) => match self.guest_carts.get_cart(cart_id).await {
                Ok(cart) => Ok((cart, self.guest_carts.get_cart_order_behaviour())),
                Err(CartProviderError::NotFound) => {
                    debug!(cart_id, "guest cart vanished, starting a new one");

                    self.new_guest_cart(session).await
                }
                Err(error) => Err(temporary(&error)),
            },
            Origin::Customer(auth) => match self.customer_cart(auth).await {
                Err(CartReceiverError::NoCartGiven) if self.customer_guest_fallback => {
                    self.new_guest_cart(session).await
                }
                Err(CartReceiverError::NoCartGiven) => Err(CartReceiverError::TemporaryCartService),
                result => result,
            },
            Origin::Anonymous => self.new_guest_cart(session).await,
        }
    }

    /// The customer's current cart and behaviour.
    ///
    /// # Errors
    ///
    /// Returns [`CartReceiverError::NoCartGiven`] when the customer has no cart.
    pub async fn customer_cart(
        &self,
        auth: &Auth,
    ) -> Result<(Cart, Arc<dyn CartOrderBehaviour>), CartReceiverError> {
        match self.customer_carts.get_cart(auth, CUSTOMER_CART_ID).await {
            Ok(cart) => Ok((cart, self.customer_carts.get_cart_order_behaviour(auth))),
            Err(CartProviderError::NotFound) => Err(CartReceiverError::NoCartGiven),
            Err(error) => Err(temporary(&error)),
        }
    }

    async fn new_guest_cart(
        &self,
        session: &mut Session,
    ) -> Result<(Cart, Arc<dyn CartOrderBehaviour>), CartReceiverError> {
        let cart = self
            .guest_carts
            .get_new_cart()
            .await
            .map_err(|error| temporary(&error))?;

        session.set_guest_cart_id(cart.id.clone());

        Ok((cart, self.guest_carts.get_cart_order_behaviour()))
    }

    pub fn get_cart_order_behaviour(&self, session: &Session) -> Arc<dyn CartOrderBehaviour> {
        match Origin::of(session) {
            Origin::Customer(auth) => self.customer_carts.get_cart_order_behaviour(auth),
            Origin::Guest(_) | Origin::Anonymous => self.guest_carts.get_cart_order_behaviour(),
        }
    }

    /// The session's decorated cart and its behaviour.
    ///
    /// Behaviours are never cached; a cache hit still resolves the current one.
    ///
    /// # Errors
    ///
    /// Returns [`CartReceiverError::TemporaryCartService`] when a provider fails.
    pub async fn get_decorated_cart(
        &self,
        session: &mut Session,
    ) -> Result<(DecoratedCart, Arc<dyn CartOrderBehaviour>), CartReceiverError> {
        if let Some(cached) = self.cached_cart(session).await {
            return Ok((cached, self.get_cart_order_behaviour(session)));
        }

        let (cart, behaviour) = self.get_cart(session).await?;
        let decorated = self.decorate_cart(Some(&cart)).await?;

        self.store_cached_cart(session, &decorated).await;

        Ok((decorated, behaviour))
    }

    async fn cached_cart(&self, session: &Session) -> Option<DecoratedCart> {
        let cache = self.cache.as_ref()?;
        let id = CartCacheIdentifier::from_session(session)?;

        match cache.get_cart(session, &id).await {
            Ok(cart) => Some(cart),
            Err(error) => {
                debug!(cache_key = %id.cache_key(), %error, "cart cache miss");

                None
            }
        }
    }

    async fn store_cached_cart(&self, session: &Session, cart: &DecoratedCart) {
        let (Some(cache), Some(id)) = (&self.cache, CartCacheIdentifier::from_session(session))
        else {
            return;
        };

        if let Err(error) = cache.cache_cart(session, &id, cart).await {
            warn!(cache_key = %id.cache_key(), %error, "failed to cache cart");
        }
    }

    /// Marks the session's current cache entry stale.
    pub async fn invalidate_cached_cart(&self, session: &Session) {
        let (Some(cache), Some(id)) = (&self.cache, CartCacheIdentifier::from_session(session))
        else {
            return;
        };

        if let Err(error) = cache.invalidate(session, &id).await {
            warn!(cache_key = %id.cache_key(), %error, "failed to invalidate cached cart");
        }
    }

    pub async fn delete_cached_cart(&self, session: &Session) {
        let (Some(cache), Some(id)) = (&self.cache, CartCacheIdentifier::from_session(session))
        else {
            return;
        };

        if let Err(error) = cache.delete(session, &id).await {
            warn!(cache_key = %id.cache_key(), %error, "failed to delete cached cart");
        }
    }

    /// Drops every cached cart of the session. Called on identity changes.
    pub async fn delete_all_cached_carts(&self, session: &Session) {
        let Some(cache) = &self.cache else {
            return;
        };

        if let Err(error) = cache.delete_all(session).await {
            warn!(%error, "failed to clear cart cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;
    use trolley::{cart::Item, pricing::LinePrice};

    use crate::{
        BoxError,
        domain::{
            carts::{
                behaviour::{BehaviourKind, InMemoryCartStorage},
                cache::MockCartCache,
                errors::CartCacheError,
                providers::{MockCustomerCartService, MockGuestCartService},
            },
            products::{MockProductService, ProductServiceError},
        },
        test::fixtures,
    };

    use super::*;

    fn receiver(
        guests: MockGuestCartService,
        customers: MockCustomerCartService,
        cache: Option<Arc<dyn CartCache>>,
        settings: &CartSettings,
    ) -> CartReceiverService {
        CartReceiverService::new(
            Arc::new(guests),
            Arc::new(customers),
            DecoratedCartFactory::new(fixtures::catalog_service()),
            cache,
            settings,
        )
    }

    fn defective() -> CartProviderError {
        CartProviderError::Backend(BoxError::from("defective"))
    }

    #[test]
    fn guest_cart_key_presence_decides() {
        let receiver = receiver(
            MockGuestCartService::new(),
            MockCustomerCartService::new(),
            None,
            &CartSettings::default(),
        );
        let mut session = Session::new();

        session.insert_value("stuff", json!("x"));

        assert!(!receiver.should_have_guest_cart(&session));

        session.set_guest_cart_id("");

        assert!(receiver.should_have_guest_cart(&session));

        session.set_guest_cart_id("cart-1");

        assert!(receiver.should_have_guest_cart(&session));
    }

    #[tokio::test]
    async fn view_guest_cart_without_key_is_empty() -> TestResult {
        let mut guests = MockGuestCartService::new();

        guests.expect_get_cart().never();

        let receiver = receiver(
            guests,
            MockCustomerCartService::new(),
            None,
            &CartSettings::default(),
        );
        let mut session = Session::new();

        session.insert_value("stuff", json!("x"));

        assert_eq!(receiver.view_guest_cart(&session).await?, Cart::default());

        Ok(())
    }

    #[tokio::test]
    async fn view_guest_cart_hides_provider_errors() {
        let mut guests = MockGuestCartService::new();

        guests
            .expect_get_cart()
            .once()
            .withf(|cart_id| cart_id == "cart-1")
            .return_once(|_| Err(defective()));

        let receiver = receiver(
            guests,
            MockCustomerCartService::new(),
            None,
            &CartSettings::default(),
        );
        let mut session = Session::new();

        session.set_guest_cart_id("cart-1");

        let result = receiver.view_guest_cart(&session).await;

        assert!(
            matches!(result, Err(CartReceiverError::TemporaryCartService)),
            "expected TemporaryCartService, got {result:?}"
        );
        assert!(
            result.is_err_and(|error| !error.to_string().contains("defective")),
            "backend text leaked"
        );
    }

    #[tokio::test]
    async fn decorate_cart_requires_a_cart() -> TestResult {
        let receiver = receiver(
            MockGuestCartService::new(),
            MockCustomerCartService::new(),
            None,
            &CartSettings::default(),
        );

        let missing = receiver.decorate_cart(None).await;

        assert!(
            matches!(&missing, Err(CartReceiverError::NoCartGiven)),
            "expected NoCartGiven, got {missing:?}"
        );
        assert!(missing.is_err_and(|error| error.to_string() == "no cart given"));

        let mut cart = Cart::new("cart-1", "EUR");

        cart.add_item(
            "delivery",
            Item::new(
                "line-1",
                fixtures::SHIRT,
                None,
                "Shirt",
                1,
                LinePrice {
                    net: 1_000,
                    gross: 1_000,
                    tax: 0,
                },
            ),
        )?;

        let decorated = receiver.decorate_cart(Some(&cart)).await?;

        assert_eq!(decorated.delivery("delivery").map(|d| d.items.len()), Some(1));

        Ok(())
    }

    #[tokio::test]
    async fn decorated_cart_for_fresh_session_uses_guest_behaviour() -> TestResult {
        let storage = Arc::new(InMemoryCartStorage::new());
        let behaviour = fixtures::in_memory_behaviour(storage);
        let mut guests = MockGuestCartService::new();

        guests.expect_get_cart().never();
        guests
            .expect_get_new_cart()
            .once()
            .return_once(|| Ok(Cart::new("fresh", "EUR")));
        guests
            .expect_get_cart_order_behaviour()
            .once()
            .return_once(move || behaviour);

        let receiver = receiver(
            guests,
            MockCustomerCartService::new(),
            None,
            &CartSettings::default(),
        );
        let mut session = Session::new();

        let (decorated, behaviour) = receiver.get_decorated_cart(&mut session).await?;

        assert_eq!(decorated.cart.id, "fresh");
        assert_eq!(behaviour.kind(), BehaviourKind::InMemory);
        assert_eq!(session.guest_cart_id(), Some("fresh"));

        Ok(())
    }

    #[tokio::test]
    async fn vanished_guest_cart_is_replaced() -> TestResult {
        let storage = Arc::new(InMemoryCartStorage::new());
        let behaviour = fixtures::in_memory_behaviour(storage);
        let mut guests = MockGuestCartService::new();

        guests
            .expect_get_cart()
            .once()
            .return_once(|_| Err(CartProviderError::NotFound));
        guests
            .expect_get_new_cart()
            .once()
            .return_once(|| Ok(Cart::new("fresh", "EUR")));
        guests
            .expect_get_cart_order_behaviour()
            .once()
            .return_once(move || behaviour);

        let receiver = receiver(
            guests,
            MockCustomerCartService::new(),
            None,
            &CartSettings::default(),
        );
        let mut session = Session::new();

        session.set_guest_cart_id("stale");

        let (cart, _behaviour) = receiver.get_cart(&mut session).await?;

        assert_eq!(cart.id, "fresh");
        assert_eq!(session.guest_cart_id(), Some("fresh"));

        Ok(())
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let mut guests = MockGuestCartService::new();

        guests
            .expect_get_cart()
            .once()
            .return_once(|_| Err(defective()));
        guests.expect_get_cart_order_behaviour().never();

        let receiver = receiver(
            guests,
            MockCustomerCartService::new(),
            None,
            &CartSettings::default(),
        );
        let mut session = Session::new();

        session.set_guest_cart_id("cart-1");

        let result = receiver.get_decorated_cart(&mut session).await;

        assert!(
            matches!(result, Err(CartReceiverError::TemporaryCartService)),
            "expected TemporaryCartService, got {:?}",
            result.err()
        );
    }

    #[tokio::test]
    async fn customer_session_uses_customer_provider() -> TestResult {
        let storage = Arc::new(InMemoryCartStorage::new());
        let behaviour = fixtures::in_memory_behaviour(storage);
        let mut guests = MockGuestCartService::new();
        let mut customers = MockCustomerCartService::new();

        guests.expect_get_new_cart().never();
        customers
            .expect_get_cart()
            .once()
            .withf(|auth, cart_id| auth.subject == "alice" && cart_id == CUSTOMER_CART_ID)
            .return_once(|_, _| Ok(Cart::new("alice-cart", "EUR")));
        customers
            .expect_get_cart_order_behaviour()
            .once()
            .return_once(move |_| behaviour);

        let receiver = receiver(guests, customers, None, &CartSettings::default());
        let mut session = Session::new();

        session.set_auth(Some(Auth::new("alice", "token")));

        let (cart, _behaviour) = receiver.get_cart(&mut session).await?;

        assert_eq!(cart.id, "alice-cart");
        assert!(!session.has_guest_cart_key(), "customer must not get a guest key");

        Ok(())
    }

    #[tokio::test]
    async fn missing_customer_cart_falls_back_only_when_configured() -> TestResult {
        let mut customers = MockCustomerCartService::new();
        let mut guests = MockGuestCartService::new();

        customers
            .expect_get_cart()
            .times(2)
            .returning(|_, _| Err(CartProviderError::NotFound));
        guests
            .expect_get_new_cart()
            .once()
            .return_once(|| Ok(Cart::new("fallback", "EUR")));

        let strict = CartSettings::default();
        let lenient = CartSettings {
            customer_cart_guest_fallback: true,
            ..CartSettings::default()
        };

        let guests = Arc::new(guests);
        let customers = Arc::new(customers);
        let mut session = Session::new();

        session.set_auth(Some(Auth::new("alice", "token")));

        let strict = CartReceiverService::new(
            guests.clone(),
            customers.clone(),
            DecoratedCartFactory::new(fixtures::catalog_service()),
            None,
            &strict,
        );
        let lenient = CartReceiverService::new(
            guests,
            customers,
            DecoratedCartFactory::new(fixtures::catalog_service()),
            None,
            &lenient,
        );

        assert_eq!(strict.view_cart(&session).await?, Cart::default());
        assert_eq!(lenient.view_cart(&session).await?.id, "fallback");

        Ok(())
    }

    #[tokio::test]
    async fn cache_hit_skips_provider_lookup() -> TestResult {
        let storage = Arc::new(InMemoryCartStorage::new());
        let behaviour = fixtures::in_memory_behaviour(storage);
        let mut guests = MockGuestCartService::new();
        let mut cache = MockCartCache::new();

        guests.expect_get_cart().never();
        guests
            .expect_get_cart_order_behaviour()
            .once()
            .return_once(move || behaviour);
        cache
            .expect_get_cart()
            .once()
            .withf(|_, id| *id == CartCacheIdentifier::guest("cart-1"))
            .return_once(|_, _| {
                Ok(DecoratedCart {
                    cart: Cart::new("cart-1", "EUR"),
                    ..DecoratedCart::default()
                })
            });
        cache.expect_cache_cart().never();

        let receiver = receiver(
            guests,
            MockCustomerCartService::new(),
            Some(Arc::new(cache)),
            &CartSettings::default(),
        );
        let mut session = Session::new();

        session.set_guest_cart_id("cart-1");

        let (decorated, _behaviour) = receiver.get_decorated_cart(&mut session).await?;

        assert_eq!(decorated.cart.id, "cart-1");

        Ok(())
    }

    #[tokio::test]
    async fn cache_miss_decorates_and_stores() -> TestResult {
        let storage = Arc::new(InMemoryCartStorage::new());
        let behaviour = fixtures::in_memory_behaviour(storage);
        let mut guests = MockGuestCartService::new();
        let mut cache = MockCartCache::new();

        guests
            .expect_get_cart()
            .once()
            .return_once(|_| Ok(Cart::new("cart-1", "EUR")));
        guests
            .expect_get_cart_order_behaviour()
            .once()
            .return_once(move || behaviour);
        cache
            .expect_get_cart()
            .once()
            .return_once(|_, _| Err(CartCacheError::Expired));
        cache
            .expect_cache_cart()
            .once()
            .withf(|_, id, cart| id.cart_id == "cart-1" && cart.cart.id == "cart-1")
            .return_once(|_, _, _| Ok(()));

        let receiver = receiver(
            guests,
            MockCustomerCartService::new(),
            Some(Arc::new(cache)),
            &CartSettings::default(),
        );
        let mut session = Session::new();

        session.set_guest_cart_id("cart-1");

        receiver.get_decorated_cart(&mut session).await?;

        Ok(())
    }

    #[tokio::test]
    async fn decoration_tolerates_catalog_outage() -> TestResult {
        let mut products = MockProductService::new();

        products.expect_get().returning(|_| {
            Err(ProductServiceError::Unavailable(BoxError::from("down")))
        });

        let receiver = CartReceiverService::new(
            Arc::new(MockGuestCartService::new()),
            Arc::new(MockCustomerCartService::new()),
            DecoratedCartFactory::new(Arc::new(products)),
            None,
            &CartSettings::default(),
        );
        let mut cart = Cart::new("cart-1", "EUR");

        cart.add_item(
            "delivery",
            Item::new("line-1", "shirt", None, "Shirt", 1, LinePrice::default()),
        )?;

        let decorated = receiver.decorate_cart(Some(&cart)).await?;

        assert!(decorated.has_warnings(), "outage should be recorded");

        Ok(())
    }
}
