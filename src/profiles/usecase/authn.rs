use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use validator::Validate;

use crate::app::error::AppError;
use crate::app::oauth::{AuthGateway, OAuthError};
use crate::profiles::domain::inout::{
    DescribeSessionInput, DescribeSessionOutput, LogoutInput, LogoutOutput, OAuthCallbackInput,
    OAuthCallbackOutput, OAuthLoginInput, OAuthLoginOutput,
};
use crate::profiles::domain::profile::{normalize, Provider};
use crate::profiles::outbound::store::ProfileStore;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthnUseCase: Send + Sync {
    async fn oauth_login(&self, input: OAuthLoginInput) -> Result<OAuthLoginOutput, AppError>;
    async fn oauth_callback(&self, input: OAuthCallbackInput) -> Result<OAuthCallbackOutput, AppError>;
    async fn logout(&self, input: LogoutInput) -> Result<LogoutOutput, AppError>;
    async fn describe_session(&self, input: DescribeSessionInput) -> Result<DescribeSessionOutput, AppError>;
}

pub struct AuthnService {
    gateway: Arc<dyn AuthGateway>,
    store: Arc<dyn ProfileStore>,
    site_url: String,
    provider_scopes: HashMap<String, String>,
}

impl AuthnService {
    pub fn new(
        gateway: Arc<dyn AuthGateway>,
        store: Arc<dyn ProfileStore>,
        site_url: String,
        provider_scopes: HashMap<String, String>,
    ) -> Self {
        Self {
            gateway,
            store,
            site_url: site_url.trim_end_matches('/').to_string(),
            provider_scopes,
        }
    }
}

#[async_trait]
impl AuthnUseCase for AuthnService {
    async fn oauth_login(&self, input: OAuthLoginInput) -> Result<OAuthLoginOutput, AppError> {
        input.validate()?;

        let scopes = self
            .provider_scopes
            .get(&input.provider)
            .ok_or_else(|| AppError::NotFound(format!("OAuth provider '{}' is not enabled", input.provider)))?;

        let redirect_to = format!("{}/auth/callback", self.site_url);
        let auth_url = self.gateway.authorize_url(&input.provider, &redirect_to, scopes)?;

        Ok(OAuthLoginOutput { auth_url })
    }

    async fn oauth_callback(&self, input: OAuthCallbackInput) -> Result<OAuthCallbackOutput, AppError> {
        input.validate()?;

        let session = self.gateway.exchange_code_for_session(&input.code).await?;

        let provider = Provider::resolve(&session.user);
        let record = normalize(&session.user, Utc::now());

        // A failed upsert must not block sign-in: the user still gets their
        // session, the profile row is just left unsynced until the next
        // sign-in or a manual sync.
        match self.store.upsert(&record).await {
            Ok(()) => {
                tracing::info!(user_id = %record.id, %provider, "Profile synced after sign-in");
            },
            Err(err) => {
                tracing::error!(user_id = %record.id, error = ?err, "Failed to upsert profile after sign-in");
            },
        }

        Ok(OAuthCallbackOutput {
            access_token: session.access_token,
            expires_in: session.expires_in,
            expires_at: session.expires_at,
        })
    }

    async fn logout(&self, input: LogoutInput) -> Result<LogoutOutput, AppError> {
        // The local cookie is removed by the handler either way; an upstream
        // revocation failure only means the token ages out on its own.
        if let Err(err) = self.gateway.sign_out(&input.access_token).await {
            tracing::warn!(error = ?err, "Upstream sign-out failed");
        }

        Ok(LogoutOutput { success: true })
    }

    async fn describe_session(&self, input: DescribeSessionInput) -> Result<DescribeSessionOutput, AppError> {
        let Some(access_token) = input.access_token else {
            return Ok(DescribeSessionOutput::unauthenticated());
        };

        match self.gateway.get_session(&access_token).await {
            Ok(session) => {
                let provider = Provider::resolve(&session.user);

                Ok(DescribeSessionOutput {
                    authenticated: true,
                    user_id: Some(session.user.id),
                    email: session.user.email,
                    provider: Some(provider.to_string()),
                    // The /user endpoint carries no expiry; fall back to the
                    // one remembered from code exchange.
                    expires_at: session.expires_at.or(input.expires_at),
                })
            },
            // A stale or revoked token is a state to report, not an error.
            Err(OAuthError::Unauthenticated) => Ok(DescribeSessionOutput::unauthenticated()),
            Err(err) => Err(err.into()),
        }
    }
}
