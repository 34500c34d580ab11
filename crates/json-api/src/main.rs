//! Trolley JSON API Server

use std::{process, sync::Arc};

use salvo::{
    affix_state::inject,
    oapi::{
        OpenApi,
        security::{Http, HttpAuthScheme, SecurityScheme},
        swagger_ui::SwaggerUi,
    },
    prelude::*,
    trailing_slash::remove_slash,
};
use thiserror::Error;
use tracing::{error, info};

use trolley_app::{
    auth::{AuthServiceError, StaticIdentityService},
    context::{AppContext, AppInitError},
    domain::products::{InMemoryProductService, ProductServiceError},
    settings::CartSettings,
};

use crate::{
    config::{ServerConfig, backend::BackendConfigError},
    state::State,
};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod carts;
mod config;
mod extensions;
mod healthcheck;
mod observability;
mod router;
mod sessions;
mod shutdown;
mod state;
#[cfg(test)]
mod test_helpers;

#[derive(Debug, Error)]
enum StartupError {
    #[error("failed to load product catalog: {0}")]
    Catalog(#[from] ProductServiceError),

    #[error("invalid CUSTOMER_TOKENS: {0}")]
    Identity(#[from] AuthServiceError),

    #[error("invalid cart backend configuration: {0}")]
    Backend(#[from] BackendConfigError),

    #[error("failed to initialize app context: {0}")]
    App(#[from] AppInitError),
}

/// Trolley JSON API Server entry point
#[tokio::main]
pub async fn main() {
    // Load configuration from .env and CLI arguments
    let config = ServerConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    if let Err(init_error) = observability::init_subscriber(&config) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, must use eprintln"
        )]
        {
            eprintln!("{init_error}");
        }

        process::exit(1);
    }

    let app = match build_app_context(&config) {
        Ok(app) => app,
        Err(startup_error) => {
            error!("{startup_error}");

            process::exit(1);
        }
    };

    let addr = config.socket_addr();

    info!("Starting server on {addr}");

    // Bind server
    let listener = TcpListener::new(addr).bind().await;

    let event_logger = observability::spawn_event_logger(app.events.subscribe());

    let router = Router::new()
        .hoop(CatchPanic::new())
        .hoop(remove_slash())
        .hoop(observability::request_logging)
        .hoop(inject(State::from_app_context(app)))
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(router::app_router());

    let doc = OpenApi::new("Trolley API", env!("CARGO_PKG_VERSION"))
        .add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
        .merge_router(&router);

    let router = router
        .push(doc.into_router("/api-doc/openapi.json"))
        .push(SwaggerUi::new("/api-doc/openapi.json").into_router("docs"));

    let server = Server::new(listener);

    let handle = server.handle();

    // Listen for shutdown signal
    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    // Start serving requests
    server.serve(router).await;

    event_logger.abort();
}

fn build_app_context(config: &ServerConfig) -> Result<AppContext, StartupError> {
    let products = match &config.backend.catalog_path {
        Some(path) => {
            let catalog = InMemoryProductService::from_json_file(path)?;

            info!(products = catalog.len(), path = %path.display(), "catalog loaded");

            catalog
        }
        None => InMemoryProductService::new([]),
    };

    let identity = StaticIdentityService::from_pairs(&config.identity.customer_tokens)?;
    let backend = config.backend.cart_backend()?;

    let app = AppContext::build(
        CartSettings::from(&config.cart),
        &backend,
        Arc::new(products),
        Arc::new(identity),
    )?;

    Ok(app)
}
