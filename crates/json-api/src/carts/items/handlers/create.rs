//! Add Cart Item Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    carts::{errors::CartApiError, params::path_param, responses::MessageResponse},
    extensions::*,
    state::State,
};

/// Add a product to a delivery.
///
/// Query: `marketplaceCode`, optional `variantMarketplaceCode`, `qty`
/// (defaults to one).
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<MessageResponse>, CartApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?.clone();
    let delivery_code = path_param(req, "deliveryCode")?;

    let marketplace_code = req.query::<String>("marketplaceCode").unwrap_or_default();
    let variant_marketplace_code = req
        .query::<String>("variantMarketplaceCode")
        .filter(|code| !code.is_empty());
    let qty = req.query::<i64>("qty").unwrap_or(1);

    let request =
        state
            .carts()
            .build_add_request(&marketplace_code, variant_marketplace_code, qty);

    let message = format!(
        "added {} / {} Qty {}",
        request.marketplace_code,
        request.variant_marketplace_code.as_deref().unwrap_or_default(),
        request.qty
    );

    let session = depot.session_or_500()?;

    state
        .carts()
        .add_product(session, &delivery_code, request)
        .await?;

    Ok(Json(MessageResponse::success(message)))
}
