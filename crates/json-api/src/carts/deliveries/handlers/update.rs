//! Update Delivery Info Handler

use std::sync::Arc;

use salvo::prelude::*;

use trolley::cart::DeliveryInfo;
use trolley_app::domain::carts::CartMutation;

use crate::{
    carts::{errors::CartApiError, params::path_param},
    extensions::*,
    state::State,
};

/// Replace the delivery info of a delivery, creating the delivery if needed.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<CartMutation>, CartApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?.clone();
    let delivery_code = path_param(req, "deliveryCode")?;
    let info = req
        .parse_json::<DeliveryInfo>()
        .await
        .or_400("invalid delivery info")?;

    let session = depot.session_or_500()?;

    let mutation = state
        .carts()
        .update_delivery_info(session, &delivery_code, info)
        .await?;

    Ok(Json(mutation))
}
