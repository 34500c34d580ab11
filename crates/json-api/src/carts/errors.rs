//! Errors

use salvo::{
    http::{StatusCode, StatusError},
    Scribe,
    prelude::{Json, Response},
};
use tracing::error;

use trolley_app::domain::carts::{CartBehaviourError, CartServiceError, message_codes};

use crate::carts::responses::MessageResponse;

/// A failed cart request, rendered as a `MessageResponse` body.
#[derive(Debug)]
pub(crate) struct CartApiError {
    status: StatusCode,
    body: MessageResponse,
}

impl CartApiError {
    fn new(status: StatusCode, message: impl Into<String>, message_code: &str) -> Self {
        Self {
            status,
            body: MessageResponse::failure(message, message_code),
        }
    }
}

impl Scribe for CartApiError {
    fn render(self, res: &mut Response) {
        res.status_code(self.status);
        res.render(Json(self.body));
    }
}

impl From<CartServiceError> for CartApiError {
    fn from(error: CartServiceError) -> Self {
        let status = status_for(&error);

        if status.is_server_error() {
            error!("cart request failed: {error:?}");
        }

        Self::new(status, error.to_string(), error.message_code().unwrap_or_default())
    }
}

impl From<StatusError> for CartApiError {
    fn from(error: StatusError) -> Self {
        let message = if error.brief.is_empty() {
            error.name
        } else {
            error.brief
        };

        Self::new(error.code, message, "")
    }
}

fn status_for(error: &CartServiceError) -> StatusCode {
    match error {
        CartServiceError::Behaviour(CartBehaviourError::CartAlreadyPlaced) => StatusCode::CONFLICT,
        CartServiceError::Behaviour(CartBehaviourError::CommandRejected { message_code, .. })
        | CartServiceError::Rejected { message_code, .. } => rejection_status(message_code),
        CartServiceError::ProductNotFound(_) | CartServiceError::InvalidCart(_) => {
            StatusCode::BAD_REQUEST
        }
        CartServiceError::Receiver(_)
        | CartServiceError::Behaviour(
            CartBehaviourError::NotFound | CartBehaviourError::BackendUnavailable(_),
        )
        | CartServiceError::Product(_)
        | CartServiceError::DeliveryInfo(_)
        | CartServiceError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn rejection_status(message_code: &str) -> StatusCode {
    match message_code {
        message_codes::ITEM_NOT_FOUND | message_codes::DELIVERY_NOT_FOUND => StatusCode::NOT_FOUND,
        message_codes::CART_ALREADY_PLACED => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    }
}

#[cfg(test)]
mod tests {
    use salvo::{
        prelude::*,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;
    use trolley_app::domain::carts::CartReceiverError;

    use super::*;

    #[handler]
    async fn temporarily_unavailable() -> Result<(), CartApiError> {
        Err(CartServiceError::from(CartReceiverError::TemporaryCartService).into())
    }

    #[handler]
    async fn unknown_item() -> Result<(), CartApiError> {
        Err(CartServiceError::from(CartBehaviourError::rejected(
            message_codes::ITEM_NOT_FOUND,
            "item x not found",
        ))
        .into())
    }

    async fn send(route: Router) -> (Option<StatusCode>, TestResult<MessageResponse>) {
        let mut res = TestClient::get("http://example.com")
            .send(&Service::new(route))
            .await;

        let body = res.take_json::<MessageResponse>().await.map_err(Into::into);

        (res.status_code, body)
    }

    #[tokio::test]
    async fn test_temporary_failures_render_500_body() -> TestResult {
        let (status, body) = send(Router::new().get(temporarily_unavailable)).await;

        assert_eq!(status, Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(
            body?,
            MessageResponse::failure(
                "the cart could not be received currently - try again later",
                ""
            )
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_items_render_404_with_code() -> TestResult {
        let (status, body) = send(Router::new().get(unknown_item)).await;
        let body = body?;

        assert_eq!(status, Some(StatusCode::NOT_FOUND));
        assert_eq!(body.message_code, message_codes::ITEM_NOT_FOUND);
        assert!(!body.success, "error bodies are never successful");

        Ok(())
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&CartBehaviourError::CartAlreadyPlaced.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&CartServiceError::rejected(message_codes::VOUCHER_INVALID, "no")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&CartServiceError::rejected(message_codes::DELIVERY_NOT_FOUND, "no")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&CartServiceError::ProductNotFound("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&CartBehaviourError::NotFound.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_status_errors_keep_their_brief() {
        let error = CartApiError::from(StatusError::bad_request().brief("couponCode is required"));

        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.body.message, "couponCode is required");
        assert_eq!(error.body.message_code, "");
    }
}
