//! State

use std::sync::Arc;

use trolley_app::{context::AppContext, domain::carts::CartService};

/// Services shared by every request.
#[derive(Clone)]
pub(crate) struct State {
    pub(crate) app: AppContext,
}

impl State {
    #[must_use]
    pub(crate) fn from_app_context(app: AppContext) -> Arc<Self> {
        Arc::new(Self { app })
    }

    pub(crate) fn carts(&self) -> &CartService {
        &self.app.carts
    }

    /// Whether reads clamp lines to their product's quantity restriction.
    pub(crate) fn clamps_restricted_qty(&self) -> bool {
        self.app.settings.adjust_items_to_restricted_qty
    }
}
