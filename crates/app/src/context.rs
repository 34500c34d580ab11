//! App Context

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::{
    auth::IdentityService,
    domain::{
        carts::{
            CartReceiverService, CartService,
            behaviour::{
                CartOrderBehaviour, InMemoryCartOrderBehaviour, InMemoryCartStorage,
                RemoteBackendConfig, RemoteCartClient, RemoteCustomerCartService,
                RemoteGuestCartService,
            },
            cache::{CartCache, InMemoryCartCache},
            decorator::DecoratedCartFactory,
            delivery_info::DefaultDeliveryInfoBuilder,
            events::BroadcastEventPublisher,
            providers::{
                CustomerCartService, DefaultCustomerCartService, DefaultGuestCartService,
                GuestCartService,
            },
            validation::DefaultCartValidator,
        },
        products::ProductService,
    },
    sessions::{InMemorySessionStore, SessionStore},
    settings::CartSettings,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Where carts live.
#[derive(Debug, Clone)]
pub enum CartBackend {
    InMemory,
    Remote(RemoteBackendConfig),
}

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to build remote cart client")]
    RemoteClient(#[source] reqwest::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub settings: CartSettings,
    pub products: Arc<dyn ProductService>,
    pub identity: Arc<dyn IdentityService>,
    pub sessions: Arc<dyn SessionStore>,
    pub events: Arc<BroadcastEventPublisher>,
    pub receiver: Arc<CartReceiverService>,
    pub carts: Arc<CartService>,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("settings", &self.settings)
            .field("carts", &self.carts)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Wire every cart service for the given backend.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote backend client cannot be built.
    pub fn build(
        settings: CartSettings,
        backend: &CartBackend,
        products: Arc<dyn ProductService>,
        identity: Arc<dyn IdentityService>,
    ) -> Result<Self, AppInitError> {
        let (guest_carts, customer_carts): (Arc<dyn GuestCartService>, Arc<dyn CustomerCartService>) =
            match backend {
                CartBackend::InMemory => {
                    let storage = Arc::new(InMemoryCartStorage::new());
                    let behaviour: Arc<dyn CartOrderBehaviour> = Arc::new(
                        InMemoryCartOrderBehaviour::new(storage.clone(), products.clone(), &settings),
                    );

                    (
                        Arc::new(DefaultGuestCartService::new(
                            storage.clone(),
                            behaviour.clone(),
                            settings.default_currency.clone(),
                        )),
                        Arc::new(DefaultCustomerCartService::new(
                            storage,
                            behaviour,
                            settings.default_currency.clone(),
                        )),
                    )
                }
                CartBackend::Remote(config) => {
                    let client =
                        Arc::new(RemoteCartClient::new(config).map_err(AppInitError::RemoteClient)?);

                    (
                        Arc::new(RemoteGuestCartService::new(
                            client.clone(),
                            settings.default_currency.clone(),
                        )),
                        Arc::new(RemoteCustomerCartService::new(client)),
                    )
                }
            };

        let cache: Option<Arc<dyn CartCache>> = settings
            .enable_cart_cache
            .then(|| Arc::new(InMemoryCartCache::new(settings.cache_lifetime)) as Arc<dyn CartCache>);

        let receiver = Arc::new(CartReceiverService::new(
            guest_carts,
            customer_carts,
            DecoratedCartFactory::new(products.clone()),
            cache,
            &settings,
        ));

        let events = Arc::new(BroadcastEventPublisher::new(EVENT_CHANNEL_CAPACITY));

        let carts = CartService::new(
            receiver.clone(),
            products.clone(),
            events.clone(),
            Arc::new(DefaultDeliveryInfoBuilder::new(
                settings.default_use_billing_address,
            )),
            settings.clone(),
        )
        .with_cart_validator(Arc::new(DefaultCartValidator));

        Ok(Self {
            settings,
            products,
            identity,
            sessions: Arc::new(InMemorySessionStore::new()),
            events,
            receiver,
            carts: Arc::new(carts),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use testresult::TestResult;

    use crate::{
        auth::StaticIdentityService,
        domain::{carts::behaviour::BehaviourKind, products::InMemoryProductService},
        sessions::Session,
    };

    use super::*;

    fn build(backend: &CartBackend) -> Result<AppContext, AppInitError> {
        AppContext::build(
            CartSettings::default(),
            backend,
            Arc::new(InMemoryProductService::default()),
            Arc::new(StaticIdentityService::default()),
        )
    }

    #[test]
    fn builds_in_memory_context() -> TestResult {
        let ctx = build(&CartBackend::InMemory)?;

        let behaviour = ctx.receiver.get_cart_order_behaviour(&Session::new());

        assert_eq!(behaviour.kind(), BehaviourKind::InMemory);

        Ok(())
    }

    #[test]
    fn builds_remote_context() -> TestResult {
        let ctx = build(&CartBackend::Remote(RemoteBackendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(1),
        }))?;

        let behaviour = ctx.receiver.get_cart_order_behaviour(&Session::new());

        assert_eq!(behaviour.kind(), BehaviourKind::Remote);

        Ok(())
    }
}
