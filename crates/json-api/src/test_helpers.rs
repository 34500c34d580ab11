//! Test helpers.

use std::sync::Arc;

use salvo::{affix_state::inject, prelude::*};

use trolley::products::{Product, ProductKind, Variant};
use trolley_app::{
    auth::{IdentityService, MockIdentityService, StaticIdentityService},
    context::{AppContext, AppInitError, CartBackend},
    domain::products::InMemoryProductService,
    settings::CartSettings,
};

use crate::{router::app_router, sessions, state::State};

pub(crate) const CUSTOMER_TOKEN: &str = "customer-token";
pub(crate) const CUSTOMER_SUBJECT: &str = "customer-1";

pub(crate) const SHIRT: &str = "shirt";
pub(crate) const SHOE: &str = "shoe";
pub(crate) const SHOE_42: &str = "shoe-42";
pub(crate) const LIMITED: &str = "limited-edition";

/// Shirt at 10.00, a configurable shoe at 55.00 and a limited edition
/// capped at two per line.
fn catalog() -> Vec<Product> {
    vec![
        Product::simple(SHIRT, "Shirt", 1_000),
        Product {
            kind: ProductKind::Configurable {
                variants: vec![Variant {
                    marketplace_code: SHOE_42.to_string(),
                    title: "Shoe 42".to_string(),
                    price: 5_500,
                    max_qty: None,
                }],
                active_variant: None,
            },
            ..Product::simple(SHOE, "Shoe", 5_000)
        },
        Product {
            max_qty: Some(2),
            ..Product::simple(LIMITED, "Limited Edition", 2_500)
        },
    ]
}

fn state(
    settings: CartSettings,
    identity: Arc<dyn IdentityService>,
) -> Result<Arc<State>, AppInitError> {
    let app = AppContext::build(
        settings,
        &CartBackend::InMemory,
        Arc::new(InMemoryProductService::new(catalog())),
        identity,
    )?;

    Ok(State::from_app_context(app))
}

/// The session middleware in front of `route`, over an in-memory app.
pub(crate) fn service_with_identity(
    identity: MockIdentityService,
    route: Router,
) -> Result<Service, AppInitError> {
    let state = state(CartSettings::default(), Arc::new(identity))?;

    Ok(Service::new(
        Router::new()
            .hoop(inject(state))
            .hoop(sessions::middleware::handler)
            .push(route),
    ))
}

/// The cart routes over an in-memory app accepting [`CUSTOMER_TOKEN`].
pub(crate) fn cart_service_with(settings: CartSettings) -> Result<Service, AppInitError> {
    let identity = StaticIdentityService::new([(
        CUSTOMER_TOKEN.to_string(),
        CUSTOMER_SUBJECT.to_string(),
    )]);

    let state = state(settings, Arc::new(identity))?;

    Ok(Service::new(
        Router::new().hoop(inject(state)).push(app_router()),
    ))
}

pub(crate) fn cart_service() -> Result<Service, AppInitError> {
    cart_service_with(CartSettings::default())
}
