use axum::debug_handler;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect};
use tower_cookies::{cookie::time, Cookie, Cookies};

use crate::app::error::AppError;
use crate::app::extractors::{AppPath, AppQuery};
use crate::app::middleware::{CurrentSession, COOKIE_SESSION, COOKIE_SESSION_EXPIRY};
use crate::app::response::Response;
use crate::app::state::AppState;
use crate::profiles::domain::inout::{
    DescribeSessionInput, GetProfileInput, LogoutInput, OAuthCallbackInput, OAuthLoginInput, SyncProfileInput,
};
use crate::profiles::inbound::model::{
    HomeResponse, MyProfileResponse, OAuthCallbackQuery, ProfileResponse, SessionStateResponse,
    SyncProfileResponse,
};

/// How many profiles the landing endpoint shows.
const RECENT_PROFILES_LIMIT: i64 = 3;

/// Session cookie lifetime when the identity service omits an expiry.
const SESSION_MAX_AGE_FALLBACK_SECS: i64 = 3600;

fn session_cookie(name: &'static str, value: String, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .path("/")
        .max_age(max_age)
        .build()
}

/// Removal must carry the same path the cookie was set with, or browsers keep
/// the original.
fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

#[debug_handler]
pub async fn oauth_login(State(state): State<AppState>, AppPath(provider): AppPath<String>) -> Result<Redirect, AppError> {
    let output = state.profiles.authn.oauth_login(OAuthLoginInput { provider }).await?;

    Ok(Redirect::to(&output.auth_url))
}

/// The browser lands here after provider sign-in. Always answers with a
/// redirect: errors are tagged onto the auth page's query string rather than
/// rendered as API errors, since the caller is a browser mid-flow.
#[debug_handler]
pub async fn oauth_callback(
    State(state): State<AppState>,
    cookies: Cookies,
    AppQuery(query): AppQuery<OAuthCallbackQuery>,
) -> Redirect {
    let Some(code) = query.code.filter(|code| !code.is_empty()) else {
        return Redirect::to("/profile");
    };

    match state.profiles.authn.oauth_callback(OAuthCallbackInput { code }).await {
        Ok(output) => {
            let jar = cookies.private(&state.cookie_key);
            let max_age = time::Duration::seconds(output.expires_in.unwrap_or(SESSION_MAX_AGE_FALLBACK_SECS));

            jar.add(session_cookie(COOKIE_SESSION, output.access_token, max_age));

            if let Some(expires_at) = output.expires_at {
                jar.add(session_cookie(COOKIE_SESSION_EXPIRY, expires_at.to_string(), max_age));
            }

            Redirect::to("/profile")
        },
        Err(AppError::OAuth(err)) => {
            tracing::error!(error = ?err, "Error exchanging code for session");
            Redirect::to("/auth?error=session_error")
        },
        Err(err) => {
            tracing::error!(error = ?err, "Unexpected error in auth callback");
            Redirect::to("/auth?error=unexpected")
        },
    }
}

#[debug_handler]
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Result<Redirect, AppError> {
    let jar = cookies.private(&state.cookie_key);

    if let Some(cookie) = jar.get(COOKIE_SESSION) {
        let access_token = cookie.value().to_string();

        jar.remove(removal_cookie(COOKIE_SESSION));
        jar.remove(removal_cookie(COOKIE_SESSION_EXPIRY));

        state.profiles.authn.logout(LogoutInput { access_token }).await?;
    }

    Ok(Redirect::to("/auth"))
}

#[debug_handler]
pub async fn session_state(State(state): State<AppState>, cookies: Cookies) -> impl IntoResponse {
    let jar = cookies.private(&state.cookie_key);

    let access_token = jar.get(COOKIE_SESSION).map(|cookie| cookie.value().to_string());
    let expires_at = jar
        .get(COOKIE_SESSION_EXPIRY)
        .and_then(|cookie| cookie.value().parse::<i64>().ok());

    state
        .profiles
        .authn
        .describe_session(DescribeSessionInput { access_token, expires_at })
        .await
        .map(SessionStateResponse::from)
        .map(Response::new)
}

#[debug_handler]
pub async fn get_profile(State(state): State<AppState>, session: CurrentSession) -> impl IntoResponse {
    state
        .profiles
        .profile
        .get_profile(GetProfileInput { identity: session.identity })
        .await
        .map(|output| MyProfileResponse {
            profile: ProfileResponse::from(output.profile),
            provider: output.provider,
        })
        .map(Response::new)
}

#[debug_handler]
pub async fn sync_profile(State(state): State<AppState>, session: CurrentSession) -> impl IntoResponse {
    state
        .profiles
        .profile
        .sync_profile(SyncProfileInput { identity: session.identity })
        .await
        .map(|output| SyncProfileResponse { success: output.success, provider: output.provider })
        .map(|response| Response::with_message(response, "Profile synced"))
}

#[debug_handler]
pub async fn list_profiles(State(state): State<AppState>) -> impl IntoResponse {
    state
        .profiles
        .profile
        .list_profiles()
        .await
        .map(|profiles| profiles.into_iter().map(ProfileResponse::from).collect::<Vec<_>>())
        .map(Response::new)
}

#[debug_handler]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    state
        .profiles
        .profile
        .recent_profiles(RECENT_PROFILES_LIMIT)
        .await
        .map(|profiles| HomeResponse {
            message: "Welcome to Profile Hub".to_string(),
            recent_profiles: profiles.into_iter().map(ProfileResponse::from).collect(),
        })
        .map(Response::new)
}
