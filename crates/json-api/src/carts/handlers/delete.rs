//! Delete Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use trolley_app::domain::carts::CartMutation;

use crate::{
    carts::{errors::CartApiError, handlers::get::view_cart},
    extensions::*,
    state::State,
};

/// Forget the session's guest cart and return the fresh view.
#[handler]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartMutation>, CartApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?.clone();
    let session = depot.session_or_500()?;

    state
        .carts()
        .delete_saved_session_guest_cart_id(session)
        .await?;

    let view = view_cart(state.carts(), session, false).await?;

    Ok(Json(view))
}
