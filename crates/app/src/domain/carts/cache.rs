//! Session-scoped cache of decorated carts.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use rustc_hash::FxHashMap;
use trolley::decorated::DecoratedCart;

use crate::{
    domain::carts::errors::CartCacheError,
    sessions::{Session, SessionId},
};

/// Which cart a cache entry belongs to.
///
/// The customer flag keeps a guest cart and a customer cart with the same id
/// from ever sharing an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CartCacheIdentifier {
    pub cart_id: String,
    pub is_customer_cart: bool,
}

impl CartCacheIdentifier {
    pub fn guest(cart_id: impl Into<String>) -> Self {
        Self {
            cart_id: cart_id.into(),
            is_customer_cart: false,
        }
    }

    pub fn customer(cart_id: impl Into<String>) -> Self {
        Self {
            cart_id: cart_id.into(),
            is_customer_cart: true,
        }
    }

    /// Identifier for the cart the session currently resolves to.
    ///
    /// A non-empty guest id wins over authentication. Customer entries are
    /// keyed by subject since the session does not know the customer's cart id.
    pub fn from_session(session: &Session) -> Option<Self> {
        if let Some(cart_id) = session.guest_cart_id().filter(|id| !id.is_empty()) {
            return Some(Self::guest(cart_id));
        }

        session.auth().map(|auth| Self::customer(&auth.subject))
    }

    pub fn cache_key(&self) -> String {
        let kind = if self.is_customer_cart { "customer" } else { "guest" };

        format!("{kind}_{}", self.cart_id)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    cart: DecoratedCart,
    cached_at: Timestamp,
    invalidated: bool,
}

/// Decorated carts held in process memory, one namespace per session.
#[derive(Debug)]
pub struct InMemoryCartCache {
    lifetime: SignedDuration,
    sessions: Mutex<FxHashMap<SessionId, FxHashMap<String, CacheEntry>>>,
}

impl InMemoryCartCache {
    pub fn new(lifetime: SignedDuration) -> Self {
        Self {
            lifetime,
            sessions: Mutex::new(FxHashMap::default()),
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: Timestamp) -> bool {
        !entry
            .cached_at
            .checked_add(self.lifetime)
            .is_ok_and(|expires_at| expires_at > now)
    }
}

#[async_trait]
impl CartCache for InMemoryCartCache {
    async fn get_cart(
        &self,
        session: &Session,
        id: &CartCacheIdentifier,
    ) -> Result<DecoratedCart, CartCacheError> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        let entry = sessions
            .get(&session.id())
            .and_then(|entries| entries.get(&id.cache_key()))
            .ok_or(CartCacheError::Miss)?;

        if entry.invalidated {
            return Err(CartCacheError::Invalidated);
        }

        if self.is_expired(entry, Timestamp::now()) {
            return Err(CartCacheError::Expired);
        }

        Ok(entry.cart.clone())
    }

    async fn cache_cart(
        &self,
        session: &Session,
        id: &CartCacheIdentifier,
        cart: &DecoratedCart,
    ) -> Result<(), CartCacheError> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(session.id())
            .or_default()
            .insert(
                id.cache_key(),
                CacheEntry {
                    cart: cart.clone(),
                    cached_at: Timestamp::now(),
                    invalidated: false,
                },
            );

        Ok(())
    }

    async fn invalidate(
        &self,
        session: &Session,
        id: &CartCacheIdentifier,
    ) -> Result<(), CartCacheError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = sessions
            .get_mut(&session.id())
            .and_then(|entries| entries.get_mut(&id.cache_key()))
        {
            entry.invalidated = true;
        }

        Ok(())
    }

    async fn delete(&self, session: &Session, id: &CartCacheIdentifier) -> Result<(), CartCacheError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entries) = sessions.get_mut(&session.id()) {
            entries.remove(&id.cache_key());
        }

        Ok(())
    }

    async fn delete_all(&self, session: &Session) -> Result<(), CartCacheError> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&session.id());

        Ok(())
    }
}

/// Cache of decorated carts, scoped to a session.
///
/// Errors are never fatal to callers: any failure falls back to a rebuild.
#[automock]
#[async_trait]
pub trait CartCache: Send + Sync {
    async fn get_cart(
        &self,
        session: &Session,
        id: &CartCacheIdentifier,
    ) -> Result<DecoratedCart, CartCacheError>;

    async fn cache_cart(
        &self,
        session: &Session,
        id: &CartCacheIdentifier,
        cart: &DecoratedCart,
    ) -> Result<(), CartCacheError>;

    /// Marks an entry stale without removing it.
    async fn invalidate(
        &self,
        session: &Session,
        id: &CartCacheIdentifier,
    ) -> Result<(), CartCacheError>;

    async fn delete(&self, session: &Session, id: &CartCacheIdentifier)
    -> Result<(), CartCacheError>;

    /// Drops the whole namespace of the session.
    async fn delete_all(&self, session: &Session) -> Result<(), CartCacheError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;
    use trolley::cart::Cart;

    use crate::auth::Auth;

    use super::*;

    fn decorated(id: &str) -> DecoratedCart {
        DecoratedCart {
            cart: Cart::new(id, "EUR"),
            ..DecoratedCart::default()
        }
    }

    #[tokio::test]
    async fn caches_per_session() -> TestResult {
        let cache = InMemoryCartCache::new(SignedDuration::from_mins(5));
        let session = Session::new();
        let other = Session::new();
        let id = CartCacheIdentifier::guest("cart-1");

        cache.cache_cart(&session, &id, &decorated("cart-1")).await?;

        assert_eq!(cache.get_cart(&session, &id).await?.cart.id, "cart-1");

        let foreign = cache.get_cart(&other, &id).await;

        assert!(
            matches!(foreign, Err(CartCacheError::Miss)),
            "expected Miss, got {foreign:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn guest_and_customer_entries_are_distinct() -> TestResult {
        let cache = InMemoryCartCache::new(SignedDuration::from_mins(5));
        let session = Session::new();

        cache
            .cache_cart(&session, &CartCacheIdentifier::guest("x"), &decorated("x"))
            .await?;

        let result = cache
            .get_cart(&session, &CartCacheIdentifier::customer("x"))
            .await;

        assert!(
            matches!(result, Err(CartCacheError::Miss)),
            "expected Miss, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn invalidated_entries_miss() -> TestResult {
        let cache = InMemoryCartCache::new(SignedDuration::from_mins(5));
        let session = Session::new();
        let id = CartCacheIdentifier::guest("cart-1");

        cache.cache_cart(&session, &id, &decorated("cart-1")).await?;
        cache.invalidate(&session, &id).await?;

        let result = cache.get_cart(&session, &id).await;

        assert!(
            matches!(result, Err(CartCacheError::Invalidated)),
            "expected Invalidated, got {result:?}"
        );

        cache.cache_cart(&session, &id, &decorated("cart-1")).await?;

        assert!(cache.get_cart(&session, &id).await.is_ok(), "recached entry should hit");

        Ok(())
    }

    #[tokio::test]
    async fn expired_entries_miss() -> TestResult {
        let cache = InMemoryCartCache::new(SignedDuration::ZERO);
        let session = Session::new();
        let id = CartCacheIdentifier::guest("cart-1");

        cache.cache_cart(&session, &id, &decorated("cart-1")).await?;

        let result = cache.get_cart(&session, &id).await;

        assert!(
            matches!(result, Err(CartCacheError::Expired)),
            "expected Expired, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn delete_all_clears_the_namespace() -> TestResult {
        let cache = InMemoryCartCache::new(SignedDuration::from_mins(5));
        let session = Session::new();
        let guest = CartCacheIdentifier::guest("cart-1");
        let customer = CartCacheIdentifier::customer("alice");

        cache.cache_cart(&session, &guest, &decorated("cart-1")).await?;
        cache.cache_cart(&session, &customer, &decorated("cart-2")).await?;
        cache.delete(&session, &guest).await?;

        assert!(cache.get_cart(&session, &guest).await.is_err(), "guest entry deleted");
        assert!(cache.get_cart(&session, &customer).await.is_ok(), "customer entry kept");

        cache.delete_all(&session).await?;

        assert!(cache.get_cart(&session, &customer).await.is_err(), "namespace cleared");

        Ok(())
    }

    #[test]
    fn identifier_prefers_guest_cart() {
        let mut session = Session::new();

        assert_eq!(CartCacheIdentifier::from_session(&session), None);

        session.set_auth(Some(Auth::new("alice", "token")));

        assert_eq!(
            CartCacheIdentifier::from_session(&session),
            Some(CartCacheIdentifier::customer("alice"))
        );

        session.set_guest_cart_id("cart-1");

        assert_eq!(
            CartCacheIdentifier::from_session(&session),
            Some(CartCacheIdentifier::guest("cart-1"))
        );
        assert_eq!(CartCacheIdentifier::guest("cart-1").cache_key(), "guest_cart-1");
    }
}
