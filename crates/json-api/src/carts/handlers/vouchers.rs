//! Voucher Handlers

use std::sync::Arc;

use salvo::prelude::*;

use trolley_app::domain::carts::CartMutation;

use crate::{
    carts::{errors::CartApiError, params::coupon_code},
    extensions::*,
    state::State,
};

#[handler]
pub(crate) async fn apply(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<CartMutation>, CartApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?.clone();
    let code = coupon_code(req)?;
    let session = depot.session_or_500()?;

    Ok(Json(state.carts().apply_voucher(session, &code).await?))
}

#[handler]
pub(crate) async fn remove(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<CartMutation>, CartApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?.clone();
    let code = coupon_code(req)?;
    let session = depot.session_or_500()?;

    Ok(Json(state.carts().remove_voucher(session, &code).await?))
}

/// Apply the code as voucher, falling back to a gift card.
#[handler]
pub(crate) async fn apply_combined(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<CartMutation>, CartApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?.clone();
    let code = coupon_code(req)?;
    let session = depot.session_or_500()?;

    let mutation = state
        .carts()
        .apply_voucher_or_gift_card(session, &code)
        .await?;

    Ok(Json(mutation))
}
