//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};

use trolley_app::sessions::Session;

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    /// The session loaded by the session middleware.
    fn session_or_500(&mut self) -> Result<&mut Session, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn session_or_500(&mut self) -> Result<&mut Session, StatusError> {
        self.obtain_mut::<Session>()
            .map_err(|_ignored| StatusError::internal_server_error().brief("no session loaded"))
    }
}
