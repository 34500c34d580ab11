//! In-memory cart storage.

use std::sync::{Arc, Mutex, PoisonError};

use rustc_hash::FxHashMap;
use tokio::sync::Mutex as AsyncMutex;
use trolley::{cart::Cart, orders::PlacedOrderInfos};

#[derive(Debug, Clone)]
pub struct StoredCart {
    pub cart: Cart,
    pub placed_order: Option<PlacedOrderInfos>,
}

/// Carts keyed by id, each behind its own lock.
///
/// The map lock is only held to look up or insert a slot. Updates hold the
/// per-cart lock, so writers to one cart queue up while other carts proceed.
#[derive(Debug, Default)]
pub struct InMemoryCartStorage {
    carts: Mutex<FxHashMap<String, Arc<AsyncMutex<StoredCart>>>>,
}

impl InMemoryCartStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, cart_id: &str) -> Option<Arc<AsyncMutex<StoredCart>>> {
        self.carts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(cart_id)
            .cloned()
    }

    pub fn has_cart(&self, cart_id: &str) -> bool {
        self.slot(cart_id).is_some()
    }

    /// Stores a cart unless one with the same id exists. Returns whether it was stored.
    pub fn insert(&self, cart: Cart) -> bool {
        let mut carts = self.carts.lock().unwrap_or_else(PoisonError::into_inner);

        if carts.contains_key(&cart.id) {
            return false;
        }

        carts.insert(
            cart.id.clone(),
            Arc::new(AsyncMutex::new(StoredCart {
                cart,
                placed_order: None,
            })),
        );

        true
    }

    pub async fn get(&self, cart_id: &str) -> Option<Cart> {
        let slot = self.slot(cart_id)?;
        let stored = slot.lock().await;

        Some(stored.cart.clone())
    }

    /// Applies `apply` to a copy of the stored cart and commits the copy on success.
    ///
    /// Nothing is awaited between taking the copy and committing it, so a
    /// dropped future leaves the stored cart untouched. Returns `None` for
    /// unknown ids.
    pub async fn update<T, E>(
        &self,
        cart_id: &str,
        apply: impl FnOnce(&mut StoredCart) -> Result<T, E>,
    ) -> Option<Result<T, E>> {
        let slot = self.slot(cart_id)?;
        let mut stored = slot.lock().await;
        let mut draft = stored.clone();

        let result = apply(&mut draft);

        if result.is_ok() {
            *stored = draft;
        }

        Some(result)
    }

    pub fn remove(&self, cart_id: &str) -> bool {
        self.carts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(cart_id)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failed_updates_are_not_committed() {
        let storage = InMemoryCartStorage::new();

        storage.insert(Cart::new("c1", "EUR"));

        let result = storage
            .update("c1", |stored| {
                stored.cart.currency_code = "USD".to_string();

                Err::<(), _>("rejected")
            })
            .await;

        assert_eq!(result, Some(Err("rejected")));
        assert_eq!(
            storage.get("c1").await.map(|cart| cart.currency_code),
            Some("EUR".to_string())
        );
    }

    #[tokio::test]
    async fn unknown_ids_are_none() {
        let storage = InMemoryCartStorage::new();

        assert!(storage.get("missing").await.is_none(), "unexpected cart");
        assert!(
            storage
                .update("missing", |_| Ok::<(), ()>(()))
                .await
                .is_none(),
            "update of unknown cart"
        );
    }

    #[test]
    fn insert_keeps_existing_carts() {
        let storage = InMemoryCartStorage::new();

        assert!(storage.insert(Cart::new("c1", "EUR")), "first insert");
        assert!(!storage.insert(Cart::new("c1", "USD")), "second insert");
        assert!(storage.remove("c1"), "remove");
        assert!(!storage.has_cart("c1"), "removed");
    }
}
