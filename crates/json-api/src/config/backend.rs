//! Cart Backend Config

use std::{path::PathBuf, time::Duration};

use clap::Args;
use thiserror::Error;

use trolley_app::{context::CartBackend, domain::carts::behaviour::RemoteBackendConfig};

/// Cart backend kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    /// Carts live in process memory.
    InMemory,

    /// Carts live in a remote commerce backend.
    Remote,
}

#[derive(Debug, Error)]
pub enum BackendConfigError {
    #[error("CART_REMOTE_URL is required for the remote cart backend")]
    MissingRemoteUrl,
}

/// Cart backend settings.
#[derive(Debug, Args)]
pub struct BackendConfig {
    /// Cart backend (in-memory, remote)
    #[arg(long, env = "CART_BACKEND", value_enum, default_value_t = BackendKind::InMemory)]
    pub cart_backend: BackendKind,

    /// Base URL of the remote cart backend
    #[arg(long, env = "CART_REMOTE_URL")]
    pub cart_remote_url: Option<String>,

    /// Remote request timeout in seconds.
    #[arg(long, env = "CART_REMOTE_TIMEOUT_SECONDS", default_value_t = 5_u64)]
    pub cart_remote_timeout_seconds: u64,

    /// JSON file with the product catalog
    #[arg(long, env = "CATALOG_PATH")]
    pub catalog_path: Option<PathBuf>,
}

impl BackendConfig {
    /// Resolve the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote backend has no base URL.
    pub fn cart_backend(&self) -> Result<CartBackend, BackendConfigError> {
        match self.cart_backend {
            BackendKind::InMemory => Ok(CartBackend::InMemory),
            BackendKind::Remote => {
                let base_url = self
                    .cart_remote_url
                    .clone()
                    .filter(|url| !url.trim().is_empty())
                    .ok_or(BackendConfigError::MissingRemoteUrl)?;

                Ok(CartBackend::Remote(RemoteBackendConfig {
                    base_url,
                    timeout: Duration::from_secs(self.cart_remote_timeout_seconds),
                }))
            }
        }
    }
}
