//! Server configuration module

use clap::Parser;

use crate::config::{
    backend::BackendConfig, cart::CartConfig, identity::IdentityConfig, logging::LoggingConfig,
    server::ServerRuntimeConfig,
};

pub(crate) mod backend;
pub(crate) mod cart;
pub(crate) mod identity;
pub(crate) mod logging;
pub(crate) mod server;

/// Trolley JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "trolley-json", about = "Trolley JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Cart policy settings.
    #[command(flatten)]
    pub cart: CartConfig,

    /// Cart backend and catalog settings.
    #[command(flatten)]
    pub backend: BackendConfig,

    /// Customer identity settings.
    #[command(flatten)]
    pub identity: IdentityConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }
}
