//! HTTP cart backend.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;
use trolley::{cart::Cart, commands::CartCommand};

use crate::{
    auth::Auth,
    domain::carts::{
        behaviour::{BehaviourKind, CartOrderBehaviour, CartUpdate, PlacedOrder},
        errors::{CartBehaviourError, CartProviderError},
        providers::{CUSTOMER_CART_ID, CustomerCartService, GuestCartService},
    },
};

/// Configuration for connecting to a remote cart backend.
#[derive(Debug, Clone)]
pub struct RemoteBackendConfig {
    /// Base URL, e.g. `"http://carts.internal:8080"`.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

/// Errors that can occur when talking to the remote backend.
#[derive(Debug, Error)]
pub enum RemoteCartError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("cart not found")]
    NotFound,

    #[error("cart has already been placed")]
    Conflict,

    #[error("{message}")]
    Rejected {
        message: String,
        message_code: String,
    },

    /// Any other non-2xx response.
    #[error("unexpected response from cart backend: {0}")]
    UnexpectedResponse(String),
}

impl From<RemoteCartError> for CartBehaviourError {
    fn from(error: RemoteCartError) -> Self {
        match error {
            RemoteCartError::NotFound => Self::NotFound,
            RemoteCartError::Conflict => Self::CartAlreadyPlaced,
            RemoteCartError::Rejected {
                message,
                message_code,
            } => Self::CommandRejected {
                message,
                message_code,
            },
            error @ (RemoteCartError::Http(_) | RemoteCartError::UnexpectedResponse(_)) => {
                Self::BackendUnavailable(Box::new(error))
            }
        }
    }
}

impl From<RemoteCartError> for CartProviderError {
    fn from(error: RemoteCartError) -> Self {
        match error {
            RemoteCartError::NotFound => Self::NotFound,
            error => Self::Backend(Box::new(error)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RejectionBody {
    message: String,

    #[serde(default)]
    message_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewCartBody<'a> {
    currency_code: &'a str,
}

fn error_for_status(status: StatusCode, body: &str) -> RemoteCartError {
    match status {
        StatusCode::NOT_FOUND => RemoteCartError::NotFound,
        StatusCode::CONFLICT => RemoteCartError::Conflict,
        StatusCode::UNPROCESSABLE_ENTITY => match serde_json::from_str::<RejectionBody>(body) {
            Ok(rejection) => RemoteCartError::Rejected {
                message: rejection.message,
                message_code: rejection.message_code,
            },
            Err(_) => RemoteCartError::UnexpectedResponse(format!(
                "rejection without readable body: {body}"
            )),
        },
        status => RemoteCartError::UnexpectedResponse(format!(
            "request failed with status {status}: {body}"
        )),
    }
}

/// HTTP client for the remote cart backend.
#[derive(Debug, Clone)]
pub struct RemoteCartClient {
    base_url: String,
    http: Client,
}

impl RemoteCartClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(config: &RemoteBackendConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(
        request: RequestBuilder,
        auth: Option<&Auth>,
    ) -> Result<T, RemoteCartError> {
        let request = match auth {
            Some(auth) => request.bearer_auth(&auth.token),
            None => request,
        };

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(error_for_status(status, &text));
        }

        Ok(response.json().await?)
    }

    pub async fn get_cart(
        &self,
        cart_id: &str,
        auth: Option<&Auth>,
    ) -> Result<Cart, RemoteCartError> {
        Self::send(self.http.get(self.url(&format!("/carts/{cart_id}"))), auth).await
    }

    pub async fn create_cart(&self, currency_code: &str) -> Result<Cart, RemoteCartError> {
        Self::send(
            self.http
                .post(self.url("/carts"))
                .json(&NewCartBody { currency_code }),
            None,
        )
        .await
    }

    pub async fn get_customer_cart(&self, auth: &Auth) -> Result<Cart, RemoteCartError> {
        Self::send(self.http.get(self.url("/customers/me/cart")), Some(auth)).await
    }

    pub async fn execute(
        &self,
        cart_id: &str,
        command: &CartCommand,
        auth: Option<&Auth>,
    ) -> Result<CartUpdate, RemoteCartError> {
        Self::send(
            self.http
                .post(self.url(&format!("/carts/{cart_id}/commands")))
                .json(command),
            auth,
        )
        .await
    }

    pub async fn place_order(
        &self,
        cart_id: &str,
        auth: Option<&Auth>,
    ) -> Result<PlacedOrder, RemoteCartError> {
        Self::send(
            self.http.post(self.url(&format!("/carts/{cart_id}/order"))),
            auth,
        )
        .await
    }
}

/// Forwards commands to the remote backend, as guest or on behalf of a customer.
#[derive(Debug, Clone)]
pub struct RemoteCartOrderBehaviour {
    client: Arc<RemoteCartClient>,
    auth: Option<Auth>,
}

impl RemoteCartOrderBehaviour {
    #[must_use]
    pub fn new(client: Arc<RemoteCartClient>, auth: Option<Auth>) -> Self {
        Self { client, auth }
    }
}

#[async_trait]
impl CartOrderBehaviour for RemoteCartOrderBehaviour {
    fn kind(&self) -> BehaviourKind {
        BehaviourKind::Remote
    }

    async fn execute(
        &self,
        cart: &Cart,
        command: CartCommand,
    ) -> Result<CartUpdate, CartBehaviourError> {
        debug!(cart_id = %cart.id, command = command.name(), "forwarding cart command");

        Ok(self
            .client
            .execute(&cart.id, &command, self.auth.as_ref())
            .await?)
    }

    async fn place_order(&self, cart: &Cart) -> Result<PlacedOrder, CartBehaviourError> {
        Ok(self.client.place_order(&cart.id, self.auth.as_ref()).await?)
    }
}

/// Guest carts held by the remote backend.
#[derive(Debug, Clone)]
pub struct RemoteGuestCartService {
    client: Arc<RemoteCartClient>,
    currency_code: String,
}

impl RemoteGuestCartService {
    #[must_use]
    pub fn new(client: Arc<RemoteCartClient>, currency_code: impl Into<String>) -> Self {
        Self {
            client,
            currency_code: currency_code.into(),
        }
    }
}

#[async_trait]
impl GuestCartService for RemoteGuestCartService {
    async fn get_cart(&self, cart_id: &str) -> Result<Cart, CartProviderError> {
        Ok(self.client.get_cart(cart_id, None).await?)
    }

    async fn get_new_cart(&self) -> Result<Cart, CartProviderError> {
        Ok(self.client.create_cart(&self.currency_code).await?)
    }

    fn get_cart_order_behaviour(&self) -> Arc<dyn CartOrderBehaviour> {
        Arc::new(RemoteCartOrderBehaviour::new(self.client.clone(), None))
    }
}

/// Customer carts held by the remote backend.
#[derive(Debug, Clone)]
pub struct RemoteCustomerCartService {
    client: Arc<RemoteCartClient>,
}

impl RemoteCustomerCartService {
    #[must_use]
    pub fn new(client: Arc<RemoteCartClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CustomerCartService for RemoteCustomerCartService {
    async fn get_cart(&self, auth: &Auth, cart_id: &str) -> Result<Cart, CartProviderError> {
        if cart_id == CUSTOMER_CART_ID {
            return Ok(self.client.get_customer_cart(auth).await?);
        }

        Ok(self.client.get_cart(cart_id, Some(auth)).await?)
    }

    fn get_cart_order_behaviour(&self, auth: &Auth) -> Arc<dyn CartOrderBehaviour> {
        Arc::new(RemoteCartOrderBehaviour::new(
            self.client.clone(),
            Some(auth.clone()),
        ))
    }
}
