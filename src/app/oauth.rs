//! Client for the hosted identity service that owns the OAuth flows.
//!
//! Sign-in is a redirect handoff: the browser is sent to the service's
//! `/authorize` endpoint and comes back to us with an authorization code. This
//! module only exchanges that code for a session and reads session state; it
//! never speaks the OAuth protocol with the providers itself.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Code exchange failed: {0}")]
    CodeExchange(String),

    #[error("Failed to parse session response")]
    SessionParse,

    #[error("No authenticated session")]
    Unauthenticated,

    #[error("Identity service returned status {0}")]
    Upstream(u16),
}

/// The provider-shaped user object returned by the identity service.
///
/// `user_metadata` is free-form and its keys vary per provider. The provider
/// name lives in `app_metadata`, or in `raw_app_meta_data` on payloads from
/// older service versions; both forms are tolerated downstream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawIdentity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub app_metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub raw_app_meta_data: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: RawIdentity,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Builds the URL the browser is redirected to for provider sign-in.
    fn authorize_url(&self, provider: &str, redirect_to: &str, scopes: &str) -> Result<String, OAuthError>;

    /// Exchanges an authorization code for a session.
    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, OAuthError>;

    /// Resolves the session behind an access token, or `Unauthenticated`.
    async fn get_session(&self, access_token: &str) -> Result<Session, OAuthError>;

    /// Terminates the session behind an access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), OAuthError>;
}

/// `AuthGateway` backed by a GoTrue-style REST API.
#[derive(Debug, Clone)]
pub struct HostedAuthGateway {
    base_url: String,
    publishable_key: String,
    http: Client,
}

impl HostedAuthGateway {
    pub fn new(base_url: String, publishable_key: String) -> Result<Self, OAuthError> {
        // Fail fast on a malformed base URL instead of on the first request.
        Url::parse(&base_url)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            publishable_key,
            http: Client::new(),
        })
    }
}

#[async_trait]
impl AuthGateway for HostedAuthGateway {
    fn authorize_url(&self, provider: &str, redirect_to: &str, scopes: &str) -> Result<String, OAuthError> {
        let mut url = Url::parse(&format!("{}/authorize", self.base_url))?;

        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to);

        if !scopes.is_empty() {
            url.query_pairs_mut().append_pair("scopes", scopes);
        }

        Ok(url.to_string())
    }

    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, OAuthError> {
        let response = self
            .http
            .post(format!("{}/token?grant_type=authorization_code", self.base_url))
            .header("apikey", &self.publishable_key)
            .json(&json!({ "auth_code": code }))
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Code exchange rejected by identity service: {}", body);
            return Err(OAuthError::CodeExchange(body));
        }

        response.json::<Session>().await.map_err(|_| OAuthError::SessionParse)
    }

    async fn get_session(&self, access_token: &str) -> Result<Session, OAuthError> {
        let response = self
            .http
            .get(format!("{}/user", self.base_url))
            .header("apikey", &self.publishable_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(OAuthError::Unauthenticated),
            status if !status.is_success() => Err(OAuthError::Upstream(status.as_u16())),
            _ => {
                let user = response.json::<RawIdentity>().await.map_err(|_| OAuthError::SessionParse)?;

                Ok(Session {
                    access_token: access_token.to_string(),
                    expires_in: None,
                    expires_at: None,
                    user,
                })
            },
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), OAuthError> {
        let response = self
            .http
            .post(format!("{}/logout", self.base_url))
            .header("apikey", &self.publishable_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(OAuthError::Unauthenticated),
            status if !status.is_success() => Err(OAuthError::Upstream(status.as_u16())),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn gateway(base_url: &str) -> HostedAuthGateway {
        HostedAuthGateway::new(base_url.to_string(), "test-key".to_string()).unwrap()
    }

    #[test]
    fn test_new_invalid_base_url() {
        let result = HostedAuthGateway::new("not a url".to_string(), "key".to_string());

        assert!(matches!(result.unwrap_err(), OAuthError::InvalidUrl(_)));
    }

    #[test]
    fn test_authorize_url() {
        let gateway = gateway("http://localhost:9999/auth/v1/");

        let url = gateway
            .authorize_url("github", "http://localhost:3000/auth/callback", "read:user user:email")
            .unwrap();

        assert!(url.starts_with("http://localhost:9999/auth/v1/authorize"));
        assert!(url.contains("provider=github"));
        assert!(url.contains("redirect_to=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"));
        assert!(url.contains("scopes=read%3Auser+user%3Aemail"));
    }

    #[test]
    fn test_authorize_url_without_scopes() {
        let gateway = gateway("http://localhost:9999/auth/v1");

        let url = gateway.authorize_url("google", "http://localhost:3000/auth/callback", "").unwrap();

        assert!(!url.contains("scopes="));
    }

    #[tokio::test]
    async fn test_exchange_code_for_session() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(query_param("grant_type", "authorization_code"))
            .and(header("apikey", "test-key"))
            .and(body_json(json!({ "auth_code": "code-123" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "token-abc",
                "expires_in": 3600,
                "expires_at": 1750000000,
                "user": {
                    "id": "u1",
                    "email": "u1@example.com",
                    "user_metadata": { "name": "User One" },
                    "app_metadata": { "provider": "github" }
                }
            })))
            .mount(&server)
            .await;

        let session = gateway(&server.uri()).exchange_code_for_session("code-123").await.unwrap();

        assert_eq!(session.access_token, "token-abc");
        assert_eq!(session.expires_in, Some(3600));
        assert_eq!(session.user.id, "u1");
        assert_eq!(session.user.email.as_deref(), Some("u1@example.com"));
        assert_eq!(session.user.app_metadata["provider"], "github");
    }

    #[tokio::test]
    async fn test_exchange_code_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid code"))
            .mount(&server)
            .await;

        let result = gateway(&server.uri()).exchange_code_for_session("expired").await;

        assert!(matches!(result.unwrap_err(), OAuthError::CodeExchange(body) if body == "invalid code"));
    }

    #[tokio::test]
    async fn test_get_session() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user"))
            .and(bearer_token("token-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u1",
                "email": "u1@example.com",
                "app_metadata": { "provider": "google" }
            })))
            .mount(&server)
            .await;

        let session = gateway(&server.uri()).get_session("token-abc").await.unwrap();

        assert_eq!(session.access_token, "token-abc");
        assert_eq!(session.user.id, "u1");
        assert!(session.user.user_metadata.is_empty());
        assert!(session.user.raw_app_meta_data.is_none());
    }

    #[tokio::test]
    async fn test_get_session_unauthenticated() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = gateway(&server.uri()).get_session("stale").await;

        assert!(matches!(result.unwrap_err(), OAuthError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_sign_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/logout"))
            .and(bearer_token("token-abc"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        assert!(gateway(&server.uri()).sign_out("token-abc").await.is_ok());
    }

    #[tokio::test]
    async fn test_sign_out_upstream_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = gateway(&server.uri()).sign_out("token-abc").await;

        assert!(matches!(result.unwrap_err(), OAuthError::Upstream(500)));
    }
}
