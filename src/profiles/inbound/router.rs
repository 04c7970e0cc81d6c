use axum::routing::{get, post};
use axum::{middleware, Router};

use crate::app::middleware::session;
use crate::app::state::AppState;
use crate::profiles::inbound::http::{
    get_profile, home, list_profiles, logout, oauth_callback, oauth_login, session_state, sync_profile,
};

pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/profile", get(get_profile))
        .route("/profile/sync", post(sync_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), session));

    let public_routes = Router::new()
        .route("/", get(home))
        .route("/profiles", get(list_profiles))
        // authentication scope
        .route("/auth/social/{provider}", get(oauth_login))
        .route("/auth/callback", get(oauth_callback))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(session_state));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
