//! Cart order behaviours: the backends that execute cart commands.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use trolley::{
    cart::Cart, commands::CartCommand, notices::CartNotice, orders::PlacedOrderInfos,
};

use crate::domain::carts::errors::CartBehaviourError;

mod in_memory;
mod remote;
mod storage;

pub use in_memory::{InMemoryCartOrderBehaviour, InMemoryPromotions};
pub use remote::{
    RemoteBackendConfig, RemoteCartClient, RemoteCartError, RemoteCartOrderBehaviour,
    RemoteCustomerCartService, RemoteGuestCartService,
};
pub use storage::{InMemoryCartStorage, StoredCart};

/// Which backend a behaviour talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviourKind {
    InMemory,
    Remote,
}

/// A committed command: the cart as stored afterwards plus notices for the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartUpdate {
    pub cart: Cart,

    #[serde(default)]
    pub notices: Vec<CartNotice>,
}

/// Result of placing a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub cart: Cart,

    pub infos: PlacedOrderInfos,

    /// The cart had been placed before; `infos` is the original confirmation.
    #[serde(default)]
    pub replayed: bool,
}

/// Executes commands against a cart backend.
///
/// Commands are addressed by the id of the given cart. Implementations
/// serialise commands per cart id and apply each one completely or not at all.
#[automock]
#[async_trait]
pub trait CartOrderBehaviour: Send + Sync {
    fn kind(&self) -> BehaviourKind;

    async fn execute(
        &self,
        cart: &Cart,
        command: CartCommand,
    ) -> Result<CartUpdate, CartBehaviourError>;

    /// Places the cart. Placing an already placed cart returns the original
    /// confirmation.
    async fn place_order(&self, cart: &Cart) -> Result<PlacedOrder, CartBehaviourError>;
}
