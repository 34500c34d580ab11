//! Delete Delivery Handler

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

    let session = depot.session_or_500()?;

    let mutation = state
        .carts()
        .delete_delivery(session, &delivery_code)
        .await?;

    Ok(Json(mutation))
}
