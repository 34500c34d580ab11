//! Identity transitions of a session.

use tracing::{info, warn};
use trolley::{
    cart::Cart,
    commands::{AddRequest, CartCommand},
    notices::CartNotice,
};

use crate::{
    auth::Auth,
    domain::carts::{behaviour::CartOrderBehaviour, service::CartService},
    sessions::Session,
};

impl CartService {
    /// Aligns the session with the identity of the current request.
    ///
    /// Any change of subject drops the session's cached carts. On login the
    /// lines of the guest cart move into the customer cart and the guest key
    /// is cleared.
    pub async fn sync_auth(&self, session: &mut Session, auth: Option<Auth>) {
        let current = session.auth().map(|auth| auth.subject.as_str());
        let next = auth.as_ref().map(|auth| auth.subject.as_str());

        if current == next {
            session.set_auth(auth);
            return;
        }

        self.receiver().delete_all_cached_carts(session).await;

        if let Some(auth) = &auth {
            self.merge_guest_cart(session, auth).await;
        }

        session.set_auth(auth);
    }

    async fn merge_guest_cart(&self, session: &mut Session, auth: &Auth) {
        if session.guest_cart_id().is_none_or(str::is_empty) {
            session.clear_guest_cart_id();
            return;
        }

        let guest_cart = match self.receiver().view_guest_cart(session).await {
            Ok(cart) => cart,
            Err(error) => {
                warn!(%error, "guest cart unavailable during login, dropping it");
                session.clear_guest_cart_id();
                return;
            }
        };

        let (customer_cart, behaviour) = match self.receiver().customer_cart(auth).await {
            Ok(resolved) => resolved,
            Err(error) => {
                warn!(subject = %auth.subject, %error, "customer cart unavailable, keeping guest cart");
                return;
            }
        };

        if !guest_cart.is_placed() {
            let notices = self
                .merge_lines(&guest_cart, &customer_cart, behaviour.as_ref())
                .await;

            session.push_notices(notices);

            info!(
                subject = %auth.subject,
                guest_cart_id = %guest_cart.id,
                customer_cart_id = %customer_cart.id,
                "merged guest cart into customer cart"
            );
        }

        session.clear_guest_cart_id();
    }

    /// Replays the guest cart's deliveries and lines on the customer cart,
    /// under the same quantity restrictions as a regular add. Failing
    /// commands are logged and skipped.
    async fn merge_lines(
        &self,
        guest_cart: &Cart,
        customer_cart: &Cart,
        behaviour: &dyn CartOrderBehaviour,
    ) -> Vec<CartNotice> {
        let mut commands = Vec::new();

        for delivery in &guest_cart.deliveries {
            if !customer_cart.has_delivery(delivery.code()) {
                commands.push(CartCommand::UpdateDeliveryInfo {
                    delivery_code: delivery.code().to_string(),
                    info: delivery.info.clone(),
                });
            }

            for item in &delivery.items {
                let limit = self
                    .resolve_product(
                        &item.marketplace_code,
                        item.variant_marketplace_code.as_deref(),
                    )
                    .await
                    .ok()
                    .and_then(|product| self.qty_limit(&product));

                commands.push(CartCommand::AddItem {
                    delivery_code: delivery.code().to_string(),
                    request: AddRequest::from_item(item),
                    delivery_info: None,
                    limit,
                });
            }
        }

        if customer_cart.billing_address.is_none()
            && let Some(address) = &guest_cart.billing_address
        {
            commands.push(CartCommand::UpdateBillingAddress {
                address: address.clone(),
            });
        }

        let mut notices = Vec::new();

        for command in commands {
            let name = command.name();

            match behaviour.execute(customer_cart, command).await {
                Ok(update) => notices.extend(update.notices),
                Err(error) => {
                    warn!(cart_id = %customer_cart.id, command = name, %error, "skipping guest cart entry");
                }
            }
        }

        notices
    }
}
