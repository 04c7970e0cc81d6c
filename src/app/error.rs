//! A centralized and idiomatic error handling module for the Axum web
//! application.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use super::config::ConfigError;
use super::oauth::OAuthError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid request format: {0}")]
    RequestFormat(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Internal Libraries
    #[error("Config operation failed")]
    Config(#[from] ConfigError),

    #[error("OAuth operation failed")]
    OAuth(#[from] OAuthError),

    // Third Party Libraries
    #[error("Database operation failed")]
    Database(#[from] sqlx::Error),

    #[error("An internal server error occurred")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            AppError::Validation(err) => {
                let details = json!(err.field_errors());
                (StatusCode::UNPROCESSABLE_ENTITY, "Validation failed".to_string(), Some(details))
            },
            AppError::RequestFormat(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),

            AppError::Config(err) => {
                tracing::error!("Config getter error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                    None,
                )
            },
            AppError::OAuth(err) => {
                let status = match err {
                    OAuthError::InvalidUrl(_) | OAuthError::CodeExchange(_) => StatusCode::BAD_REQUEST,
                    OAuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
                    OAuthError::HttpClient(_) | OAuthError::SessionParse | OAuthError::Upstream(_) => {
                        StatusCode::BAD_GATEWAY
                    },
                };

                let message = match err {
                    OAuthError::InvalidUrl(_) => err.to_string(),
                    OAuthError::Unauthenticated => "No authenticated session".to_string(),
                    OAuthError::CodeExchange(_) => "OAuth operation failed".to_string(),
                    OAuthError::HttpClient(_) | OAuthError::SessionParse | OAuthError::Upstream(_) => {
                        tracing::error!("Identity service error: {:?}", err);
                        "Identity service unavailable".to_string()
                    },
                };

                (status, message, None)
            },
            AppError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                    None,
                )
            },
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred".to_string(),
                None,
            ),
        };

        (status, Json(ErrorResponse { message, details })).into_response()
    }
}
