//! Session middleware.
//!
//! Resolves the session named by the `x-session-id` header, authenticates an
//! optional bearer token and applies login/logout transitions before the
//! handler runs. The session is saved once the handler is done.

use std::sync::Arc;

use salvo::{http::header::AUTHORIZATION, prelude::*};
use tracing::error;

use trolley_app::{
    auth::{Auth, AuthServiceError},
    sessions::{Session, SessionId},
};

use crate::{extensions::*, state::State};

pub(crate) const SESSION_ID_HEADER: &str = "x-session-id";

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let state = match depot.obtain_or_500::<Arc<State>>() {
        Ok(state) => state.clone(),
        Err(error) => {
            res.render(error);

            return;
        }
    };

    let session_id = resolve_session_id(req);

    let header = res
        .add_header(SESSION_ID_HEADER, session_id.to_string(), true)
        .map(|_response| ())
        .or_500("failed to set session header");

    if let Err(error) = header {
        res.render(error);

        return;
    }

    let auth = match authenticate(req, &state).await {
        Ok(auth) => auth,
        Err(error) => {
            res.render(error);

            return;
        }
    };

    let mut session = match state.app.sessions.load(session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => Session::with_id(session_id),
        Err(source) => {
            error!("failed to load session {session_id}: {source}");

            res.render(StatusError::internal_server_error());

            return;
        }
    };

    state.carts().sync_auth(&mut session, auth).await;

    depot.inject(session);

    ctrl.call_next(req, depot, res).await;

    let Ok(session) = depot.obtain::<Session>() else {
        return;
    };

    if let Err(source) = state.app.sessions.save(session).await {
        error!("failed to save session {session_id}: {source}");

        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
    }
}

fn resolve_session_id(req: &Request) -> SessionId {
    req.header::<String>(SESSION_ID_HEADER)
        .and_then(|value| value.trim().parse::<SessionId>().ok())
        .unwrap_or_default()
}

/// No header means a guest request; a header that does not carry a known
/// bearer token is rejected.
async fn authenticate(req: &Request, state: &State) -> Result<Option<Auth>, StatusError> {
    let Some(value) = req.headers().get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(extract_bearer_token)
        .ok_or_else(|| StatusError::unauthorized().brief("Invalid Authorization header"))?;

    match state.app.identity.authenticate_bearer(token).await {
        Ok(auth) => Ok(Some(auth)),
        Err(AuthServiceError::NotFound) => {
            Err(StatusError::unauthorized().brief("Invalid bearer token"))
        }
        Err(source) => {
            error!("failed to authenticate bearer token: {source}");

            Err(StatusError::internal_server_error())
        }
    }
}

fn extract_bearer_token(value: &str) -> Option<&str> {
    let mut parts = value.splitn(2, ' ');

    let scheme = parts.next()?;
    let token = parts.next()?.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }

    Some(token)
}
