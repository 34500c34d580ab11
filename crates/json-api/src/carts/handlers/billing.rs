//! Update Billing Address Handler

use std::sync::Arc;

use salvo::prelude::*;

use trolley::cart::Address;
use trolley_app::domain::carts::CartMutation;

use crate::{carts::errors::CartApiError, extensions::*, state::State};

#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<CartMutation>, CartApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?.clone();
    let address = req
        .parse_json::<Address>()
        .await
        .or_400("invalid billing address")?;

    let session = depot.session_or_500()?;

    let mutation = state
        .carts()
        .update_billing_address(session, address)
        .await?;

    Ok(Json(mutation))
}
