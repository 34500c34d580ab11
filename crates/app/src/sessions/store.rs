//! Session storage.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{
    BoxError,
    sessions::{Session, SessionId},
};

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session storage unavailable")]
    Unavailable(#[source] BoxError),
}

/// Process-local session storage.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<FxHashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: SessionId) -> Result<Option<Session>, SessionStoreError> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        Ok(sessions.get(&id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        sessions.insert(session.id(), session.clone());

        Ok(())
    }

    async fn delete(&self, id: SessionId) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        sessions.remove(&id);

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session, `None` when unknown.
    async fn load(&self, id: SessionId) -> Result<Option<Session>, SessionStoreError>;

    /// Persists a session, replacing any previous state.
    async fn save(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Forgets a session.
    async fn delete(&self, id: SessionId) -> Result<(), SessionStoreError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn saves_and_loads_sessions() -> TestResult {
        let store = InMemorySessionStore::new();
        let mut session = Session::new();

        session.set_guest_cart_id("cart-1");
        store.save(&session).await?;

        let loaded = store.load(session.id()).await?;

        assert_eq!(
            loaded.as_ref().and_then(Session::guest_cart_id),
            Some("cart-1")
        );

        store.delete(session.id()).await?;

        assert!(store.load(session.id()).await?.is_none(), "session deleted");

        Ok(())
    }
}
