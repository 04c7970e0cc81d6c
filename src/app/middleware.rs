//! Defines application-specific Axum middleware.

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use tower_cookies::Cookies;

use crate::app::error::AppError;
use crate::app::oauth::{OAuthError, RawIdentity};
use crate::app::state::AppState;

/// Private cookie holding the access token issued by the identity service.
pub const COOKIE_SESSION: &str = "__session";

/// Private cookie holding the session expiry (unix seconds) captured at code
/// exchange. The `/user` endpoint does not echo it back, so it is kept
/// client-side alongside the token.
pub const COOKIE_SESSION_EXPIRY: &str = "__session_expiry";

/// The authenticated caller, resolved once per request by the `session`
/// middleware and made available to handlers as a request extension.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub access_token: String,
    pub identity: RawIdentity,
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required.".to_string()))
    }
}

pub async fn session(
    State(state): State<AppState>,
    cookies: Cookies,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let access_token = cookies
        .private(&state.cookie_key)
        .get(COOKIE_SESSION)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| AppError::Unauthorized("Missing session cookie".to_string()))?;

    let session = state.gateway.get_session(&access_token).await.map_err(|err| match err {
        OAuthError::Unauthenticated => AppError::Unauthorized("Session expired or invalid".to_string()),
        other => AppError::OAuth(other),
    })?;

    let (mut parts, body) = req.into_parts();
    parts.extensions.insert(CurrentSession { access_token, identity: session.user });
    let req = Request::from_parts(parts, body);

    Ok(next.run(req).await)
}
