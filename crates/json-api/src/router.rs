//! App Router

use salvo::Router;

use crate::{carts, sessions};

/// Cart routes, all behind the session middleware.
pub(crate) fn app_router() -> Router {
    Router::with_path("api/v1/cart")
        .hoop(sessions::middleware::handler)
        .get(carts::get::handler)
        .delete(carts::delete::handler)
        .push(Router::with_path("applyvoucher").post(carts::vouchers::apply))
        .push(Router::with_path("removevoucher").post(carts::vouchers::remove))
        .push(Router::with_path("applygiftcard").post(carts::gift_cards::apply))
        .push(Router::with_path("removegiftcard").post(carts::gift_cards::remove))
        .push(Router::with_path("applycombinedvouchergift").post(carts::vouchers::apply_combined))
        .push(Router::with_path("billing").post(carts::billing::handler))
        .push(Router::with_path("items").delete(carts::items::delete_all::handler))
        .push(Router::with_path("placeorder").post(carts::place_order::handler))
        .push(
            Router::with_path("delivery/{deliveryCode}")
                .delete(carts::deliveries::delete::handler)
                .push(Router::with_path("additem").post(carts::items::create::handler))
                .push(Router::with_path("deliveryinfo").post(carts::deliveries::update::handler))
                .push(
                    Router::with_path("item/{itemId}")
                        .put(carts::items::update::handler)
                        .delete(carts::items::delete::handler),
                ),
        )
}
