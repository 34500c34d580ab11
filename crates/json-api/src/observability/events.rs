//! Structured log of cart events.

use tokio::{
    sync::broadcast::{Receiver, error::RecvError},
    task::JoinHandle,
};
use tracing::{info, warn};

use trolley_app::domain::carts::events::CartEvent;

/// Log every event until the publisher goes away.
pub(crate) fn spawn_event_logger(mut events: Receiver<CartEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "cart event log fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn log_event(event: &CartEvent) {
    match event {
        CartEvent::OrderPlaced {
            cart_id,
            grand_total,
            currency_code,
            placed_order_infos,
        } => info!(
            cart_id = %cart_id,
            grand_total,
            currency = %currency_code,
            orders = placed_order_infos.0.len(),
            "cart.order_placed"
        ),
        CartEvent::AddToCart {
            marketplace_code,
            variant_marketplace_code,
            qty,
        } => info!(
            marketplace_code = %marketplace_code,
            variant_marketplace_code = variant_marketplace_code.as_deref().unwrap_or_default(),
            qty,
            "cart.add_to_cart"
        ),
        CartEvent::QtyChanged {
            cart_id,
            item_id,
            marketplace_code,
            qty_before,
            qty_after,
        } => info!(
            cart_id = %cart_id,
            item_id = %item_id,
            marketplace_code = %marketplace_code,
            qty_before,
            qty_after,
            "cart.qty_changed"
        ),
    }
}
