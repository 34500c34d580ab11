//! Place Order Handler

use std::sync::Arc;

use salvo::prelude::*;

use trolley::orders::PlacedOrderInfos;

use crate::{carts::errors::CartApiError, extensions::*, state::State};

/// Place the session's cart. The session starts a new cart afterwards.
#[handler]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<PlacedOrderInfos>, CartApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?.clone();
    let session = depot.session_or_500()?;

    let placed = state.carts().place_order(session).await?;

    Ok(Json(placed))
}
