//! Delete All Cart Items Handler

use std::sync::Arc;

use salvo::prelude::*;

use trolley_app::domain::carts::CartMutation;

use crate::{carts::errors::CartApiError, extensions::*, state::State};

/// Empty every delivery of the cart.
#[handler]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartMutation>, CartApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?.clone();
    let session = depot.session_or_500()?;

    Ok(Json(state.carts().delete_all_items(session).await?))
}
