use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use tokio::signal;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_cookies::{CookieManagerLayer, Key};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    decompression::RequestDecompressionLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::app::config::Config;
use crate::app::oauth::{AuthGateway, HostedAuthGateway};
use crate::app::state::{AppState, ProfilesState};
use crate::profiles::inbound::router;
use crate::profiles::outbound::store::{ProfileSQL, ProfileStore};
use crate::profiles::usecase::authn::{AuthnService, AuthnUseCase};
use crate::profiles::usecase::profile::{ProfileService, ProfileUseCase};

mod app;
mod profiles;

/// Initializes all dependencies and starts the web server.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Create a broadcast channel to signal shutdown to all application components.
    // Spawn a task to listen for shutdown signals (Ctrl+C and SIGTERM).
    let (shutdown_tx, _) = broadcast::channel(1);
    spawn_shutdown_listener(shutdown_tx.clone());

    // Initialize globally shared resources like config and the database pool.
    let config = Config::builder("config/config.yaml").env_prefix("APP").build()?;
    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.get::<u32>("database.max_connections")?)
        .connect(&config.get::<String>("database.url")?)
        .await?;

    // Initialize the cookie encryption key. Key derivation requires at least
    // 64 decoded bytes; a short secret is a startup error, not a panic.
    let session_secret = config.get::<String>("session.secret")?;
    let cookie_key = Key::try_from(general_purpose::STANDARD.decode(session_secret)?.as_slice())?;

    // Initialize the hosted identity gateway.
    let gateway: Arc<dyn AuthGateway> = Arc::new(HostedAuthGateway::new(
        config.get::<String>("auth.base_url")?,
        config.get::<String>("auth.publishable_key")?,
    )?);

    // Collect scopes for each enabled OAuth provider. A provider with no
    // config entry stays disabled and sign-in attempts for it are rejected.
    let mut provider_scopes = HashMap::new();
    for provider in ["github", "google"] {
        if let Ok(scopes) = config.get::<String>(&format!("oauth.{provider}.scopes")) {
            provider_scopes.insert(provider.to_string(), scopes);
        }
    }

    // Initialize profiles module
    let store: Arc<dyn ProfileStore> = Arc::new(ProfileSQL::new(db_pool));
    let authn_svc: Arc<dyn AuthnUseCase> = Arc::new(AuthnService::new(
        gateway.clone(),
        store.clone(),
        config.get::<String>("auth.site_url")?,
        provider_scopes,
    ));
    let profile_svc: Arc<dyn ProfileUseCase> = Arc::new(ProfileService::new(store));

    // Assemble the final AppState from the shared resources and module states.
    let app_state = AppState {
        config: Arc::new(config),
        cookie_key,
        gateway,
        profiles: ProfilesState::new(authn_svc, profile_svc),
    };

    // Create the Router and Middlewares
    let timeout_secs = Duration::from_secs(app_state.config.get::<u64>("server.timeout_secs")?);
    let app = router::create_router(app_state.clone()).layer(
        ServiceBuilder::new()
            .layer(CookieManagerLayer::new())
            .layer(TraceLayer::new_for_http()) // Logs requests and responses
            .layer(CorsLayer::new().allow_origin(Any)) // Enables CORS for all origins
            .layer(RequestDecompressionLayer::new()) // Enables request compression
            .layer(CompressionLayer::new()) // Enables response compression
            .layer(TimeoutLayer::new(timeout_secs)), // Adds a request timeout
    );

    let server_address = app_state.config.get::<String>("server.address")?;
    let listener = tokio::net::TcpListener::bind(&server_address).await?;

    tracing::info!("🚀 listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_tx.subscribe().recv().await.ok();
            tracing::info!("🛑 Server is shutting down gracefully...");
        })
        .await?;

    Ok(())
}

/// Spawns a background task to listen for system shutdown signals.
fn spawn_shutdown_listener(shutdown_tx: broadcast::Sender<()>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("🔻 Received SIGINT (Ctrl+C)")},
            _ = terminate => { tracing::info!("🔻 Received SIGTERM")},
        }

        // Send the shutdown signal to all parts of the application.
        if shutdown_tx.send(()).is_err() {
            tracing::error!("Failed to send shutdown signal");
        }
    });
}
