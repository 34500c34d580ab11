//! Update Cart Item Qty Handler

use std::sync::Arc;

use salvo::prelude::*;

use trolley_app::domain::carts::CartMutation;

use crate::{
    carts::{errors::CartApiError, params::path_param},
    extensions::*,
    state::State,
};

/// Set a line's quantity. Quantities below one delete the line.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<CartMutation>, CartApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?.clone();
    let delivery_code = path_param(req, "deliveryCode")?;
    let item_id = path_param(req, "itemId")?;
    let qty = req
        .query::<i64>("qty")
        .ok_or_else(|| StatusError::bad_request().brief("qty is required"))?;

    let session = depot.session_or_500()?;

    let mutation = state
        .carts()
        .update_item_qty(session, &delivery_code, &item_id, qty)
        .await?;

    Ok(Json(mutation))
}
