//! Get Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use trolley_app::{
    domain::carts::{CartMutation, CartService, CartServiceError},
    sessions::Session,
};

use crate::{carts::errors::CartApiError, extensions::*, state::State};

/// View the decorated cart together with its pending notices.
///
/// With the clamp policy enabled, lines above their product's restriction are
/// adjusted first.
#[handler]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartMutation>, CartApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?.clone();
    let session = depot.session_or_500()?;

    let view = view_cart(state.carts(), session, state.clamps_restricted_qty()).await?;

    Ok(Json(view))
}

pub(crate) async fn view_cart(
    carts: &CartService,
    session: &mut Session,
    adjust_restricted_qty: bool,
) -> Result<CartMutation, CartServiceError> {
    let has_cart = session.has_guest_cart_key() || session.auth().is_some();

    let cart = if adjust_restricted_qty && has_cart {
        carts.adjust_items_to_restricted_qty(session).await?.cart
    } else {
        carts.receiver().view_decorated_cart(session).await?
    };

    Ok(CartMutation {
        cart,
        notices: carts.take_notices(session),
    })
}
