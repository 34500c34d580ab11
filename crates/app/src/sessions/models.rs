//! Session model.

use rustc_hash::FxHashMap;
use serde_json::Value;
use trolley::notices::CartNotice;

use crate::{auth::Auth, uuids::TypedUuid};

pub type SessionId = TypedUuid<Session>;

/// Request-scoped session state.
///
/// The guest cart reference is a dedicated field: its presence alone marks the
/// session as owning a guest cart, whatever the stored id looks like.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    guest_cart_id: Option<String>,
    auth: Option<Auth>,
    cart_notices: Vec<CartNotice>,
    values: FxHashMap<String, Value>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    #[must_use]
    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            guest_cart_id: None,
            auth: None,
            cart_notices: Vec::new(),
            values: FxHashMap::default(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Whether the guest cart key is present, regardless of its value.
    pub fn has_guest_cart_key(&self) -> bool {
        self.guest_cart_id.is_some()
    }

    pub fn guest_cart_id(&self) -> Option<&str> {
        self.guest_cart_id.as_deref()
    }

    pub fn set_guest_cart_id(&mut self, cart_id: impl Into<String>) {
        self.guest_cart_id = Some(cart_id.into());
    }

    pub fn clear_guest_cart_id(&mut self) -> Option<String> {
        self.guest_cart_id.take()
    }

    pub fn auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    pub fn set_auth(&mut self, auth: Option<Auth>) {
        self.auth = auth;
    }

    pub fn notices(&self) -> &[CartNotice] {
        &self.cart_notices
    }

    pub fn push_notices(&mut self, notices: impl IntoIterator<Item = CartNotice>) {
        self.cart_notices.extend(notices);
    }

    pub fn take_notices(&mut self) -> Vec<CartNotice> {
        std::mem::take(&mut self.cart_notices)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert_value(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    pub fn remove_value(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Whether the session holds no state besides its id.
    pub fn is_empty(&self) -> bool {
        self.guest_cart_id.is_none()
            && self.auth.is_none()
            && self.cart_notices.is_empty()
            && self.values.is_empty()
    }
}
