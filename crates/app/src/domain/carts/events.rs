//! Cart events.

use mockall::automock;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use trolley::{
    cart::{Cart, Item},
    commands::AddRequest,
    orders::PlacedOrderInfos,
};

/// Notifications for subscribers such as analytics or order export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CartEvent {
    OrderPlaced {
        cart_id: String,
        grand_total: u64,
        currency_code: String,
        placed_order_infos: PlacedOrderInfos,
    },
    AddToCart {
        marketplace_code: String,
        variant_marketplace_code: Option<String>,
        qty: u32,
    },
    QtyChanged {
        cart_id: String,
        item_id: String,
        marketplace_code: String,
        qty_before: u32,
        qty_after: u32,
    },
}

/// Publishes events on a broadcast channel.
///
/// Sending never waits; with no subscriber the event is dropped.
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<CartEvent>,
}

impl BroadcastEventPublisher {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));

        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.sender.subscribe()
    }

    fn send(&self, event: CartEvent) {
        if let Err(error) = self.sender.send(event) {
            debug!("cart event dropped: {error}");
        }
    }
}

impl EventPublisher for BroadcastEventPublisher {
    fn publish_order_placed(&self, cart: &Cart, placed_order_infos: &PlacedOrderInfos) {
        self.send(CartEvent::OrderPlaced {
            cart_id: cart.id.clone(),
            grand_total: cart.totals.grand_total,
            currency_code: cart.currency_code.clone(),
            placed_order_infos: placed_order_infos.clone(),
        });
    }

    fn publish_add_to_cart(&self, request: &AddRequest) {
        self.send(CartEvent::AddToCart {
            marketplace_code: request.marketplace_code.clone(),
            variant_marketplace_code: request.variant_marketplace_code.clone(),
            qty: request.qty,
        });
    }

    fn publish_qty_changed(&self, item: &Item, qty_before: u32, qty_after: u32, cart_id: &str) {
        self.send(CartEvent::QtyChanged {
            cart_id: cart_id.to_string(),
            item_id: item.id.clone(),
            marketplace_code: item.marketplace_code.clone(),
            qty_before,
            qty_after,
        });
    }
}

/// Fire-and-forget event sink. Implementations must not block.
#[automock]
pub trait EventPublisher: Send + Sync {
    fn publish_order_placed(&self, cart: &Cart, placed_order_infos: &PlacedOrderInfos);

    fn publish_add_to_cart(&self, request: &AddRequest);

    fn publish_qty_changed(&self, item: &Item, qty_before: u32, qty_after: u32, cart_id: &str);
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events() -> TestResult {
        let publisher = BroadcastEventPublisher::new(8);
        let mut receiver = publisher.subscribe();

        publisher.publish_add_to_cart(&AddRequest::new("shirt", None, 2));

        let event = receiver.recv().await?;

        assert_eq!(
            event,
            CartEvent::AddToCart {
                marketplace_code: "shirt".to_string(),
                variant_marketplace_code: None,
                qty: 2,
            }
        );

        Ok(())
    }

    #[test]
    fn publishing_without_subscribers_does_not_fail() {
        let publisher = BroadcastEventPublisher::new(0);

        publisher.publish_qty_changed(&Item::default(), 1, 2, "c1");
    }
}
