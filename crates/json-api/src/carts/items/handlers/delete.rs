//! Delete Cart Item Handler

use std::sync::Arc;

use salvo::prelude::*;

use trolley_app::domain::carts::CartMutation;

use crate::{
    carts::{errors::CartApiError, params::path_param},
    extensions::*,
    state::State,
};

#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<CartMutation>, CartApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?.clone();
    let delivery_code = path_param(req, "deliveryCode")?;
    let item_id = path_param(req, "itemId")?;

    let session = depot.session_or_500()?;

    let mutation = state
        .carts()
        .delete_item(session, &delivery_code, &item_id)
        .await?;

    Ok(Json(mutation))
}
