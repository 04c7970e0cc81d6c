//! Input and output types for the profiles use cases.

use serde::Serialize;
use validator::Validate;

use crate::app::oauth::RawIdentity;
use crate::profiles::domain::profile::ProfileRecord;

#[derive(Debug, Validate)]
pub struct OAuthLoginInput {
    #[validate(length(min = 1, message = "Provider must not be empty"))]
    pub provider: String,
}

#[derive(Debug)]
pub struct OAuthLoginOutput {
    pub auth_url: String,
}

#[derive(Debug, Validate)]
pub struct OAuthCallbackInput {
    #[validate(length(min = 1, message = "Authorization code must not be empty"))]
    pub code: String,
}

#[derive(Debug)]
pub struct OAuthCallbackOutput {
    pub access_token: String,
    pub expires_in: Option<i64>,
    pub expires_at: Option<i64>,
}

#[derive(Debug)]
pub struct LogoutInput {
    pub access_token: String,
}

#[derive(Debug)]
pub struct LogoutOutput {
    pub success: bool,
}

/// `expires_at` is the expiry remembered from code exchange; it backfills the
/// report when the identity service does not return one with the session.
#[derive(Debug)]
pub struct DescribeSessionInput {
    pub access_token: Option<String>,
    pub expires_at: Option<i64>,
}

/// Session state as reported to the debug endpoint. All user fields are absent
/// when `authenticated` is false.
#[derive(Debug, Serialize, PartialEq)]
pub struct DescribeSessionOutput {
    pub authenticated: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub provider: Option<String>,
    pub expires_at: Option<i64>,
}

impl DescribeSessionOutput {
    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            user_id: None,
            email: None,
            provider: None,
            expires_at: None,
        }
    }
}

#[derive(Debug)]
pub struct SyncProfileInput {
    pub identity: RawIdentity,
}

#[derive(Debug)]
pub struct SyncProfileOutput {
    pub success: bool,
    pub provider: String,
}

#[derive(Debug)]
pub struct GetProfileInput {
    pub identity: RawIdentity,
}

#[derive(Debug)]
pub struct GetProfileOutput {
    pub profile: ProfileRecord,
    pub provider: String,
}
