//! Normalization of provider-shaped identities into canonical profile records.
//!
//! Every sign-in and every manual sync funnels through [`normalize`], so the
//! OAuth callback and the sync action produce identical records for the same
//! raw identity. The function is total: malformed or missing metadata is never
//! an error, it just falls through the per-provider candidate chain.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::app::oauth::RawIdentity;

/// The identity provider a user signed in with, resolved from the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    Github,
    Google,
    Other(String),
}

impl Provider {
    /// Resolves the provider name from the identity payload.
    ///
    /// The current service puts it in `app_metadata`; payloads from older
    /// service versions carry it in `raw_app_meta_data` instead. Both are
    /// tolerated, with `"unknown"` as the final fallback.
    pub fn resolve(identity: &RawIdentity) -> Self {
        let name = first_present([
            identity.app_metadata.get("provider"),
            identity.raw_app_meta_data.as_ref().and_then(|meta| meta.get("provider")),
        ])
        .unwrap_or_else(|| "unknown".to_string());

        match name.as_str() {
            "github" => Provider::Github,
            "google" => Provider::Google,
            _ => Provider::Other(name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Provider::Github => "github",
            Provider::Google => "google",
            Provider::Other(name) => name,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The canonical, store-shaped profile persisted for every user regardless of
/// originating provider. `id` is the primary key and never changes across
/// syncs; all other fields are overwritten on every sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRecord {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Maps a raw identity into a canonical profile record.
///
/// Pure and total: no I/O and no failure path. Each field resolves through an
/// ordered candidate chain keyed on the provider; the first present, non-empty
/// string wins. `name` always resolves, falling back to a provider-labeled
/// default. `updated_at` is stamped with `now` unconditionally, which makes
/// every sync a full overwrite rather than a merge.
pub fn normalize(identity: &RawIdentity, now: DateTime<Utc>) -> ProfileRecord {
    let provider = Provider::resolve(identity);
    let meta = &identity.user_metadata;

    let account_email = identity.email.as_deref().filter(|email| !email.is_empty()).map(String::from);

    let (name, email, avatar_url) = match &provider {
        Provider::Github => (
            first_present([meta.get("name")]).unwrap_or_else(|| "GitHub User".to_string()),
            first_present([meta.get("email")]).or(account_email),
            first_present([meta.get("avatar_url")]),
        ),
        Provider::Google => (
            first_present([meta.get("full_name"), meta.get("name")]).unwrap_or_else(|| "Google User".to_string()),
            first_present([meta.get("email")]).or(account_email),
            first_present([meta.get("picture"), meta.get("avatar_url")]),
        ),
        Provider::Other(other) => (
            first_present([meta.get("name"), meta.get("full_name")]).unwrap_or_else(|| format!("{other} User")),
            first_present([meta.get("email")]).or(account_email),
            first_present([meta.get("avatar_url"), meta.get("picture")]),
        ),
    };

    ProfileRecord { id: identity.id.clone(), name, email, avatar_url, updated_at: now }
}

/// Returns the first candidate that is a present, non-empty string.
fn first_present<'a>(candidates: impl IntoIterator<Item = Option<&'a Value>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|value| !value.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn identity(id: &str, provider: Option<&str>, metadata: Value, email: Option<&str>) -> RawIdentity {
        let app_metadata = match provider {
            Some(name) => json!({ "provider": name }),
            None => json!({}),
        };

        RawIdentity {
            id: id.to_string(),
            email: email.map(String::from),
            user_metadata: metadata.as_object().cloned().unwrap_or_default(),
            app_metadata: app_metadata.as_object().cloned().unwrap_or_default(),
            raw_app_meta_data: None,
        }
    }

    fn frozen_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_github_name_fallback_and_account_email() {
        let identity = identity(
            "u1",
            Some("github"),
            json!({ "avatar_url": "a.png" }),
            Some("u1@x.com"),
        );

        let record = normalize(&identity, frozen_now());

        assert_eq!(record.id, "u1");
        assert_eq!(record.name, "GitHub User");
        assert_eq!(record.email.as_deref(), Some("u1@x.com"));
        assert_eq!(record.avatar_url.as_deref(), Some("a.png"));
        assert_eq!(record.updated_at, frozen_now());
    }

    #[test]
    fn test_github_metadata_name_wins() {
        let identity = identity(
            "u1",
            Some("github"),
            json!({ "name": "Octo Cat", "email": "octo@github.com" }),
            Some("u1@x.com"),
        );

        let record = normalize(&identity, frozen_now());

        assert_eq!(record.name, "Octo Cat");
        assert_eq!(record.email.as_deref(), Some("octo@github.com"));
    }

    #[test]
    fn test_google_full_name_and_picture() {
        let identity = identity(
            "u2",
            Some("google"),
            json!({ "full_name": "Jane Doe", "picture": "p.png" }),
            None,
        );

        let record = normalize(&identity, frozen_now());

        assert_eq!(record.id, "u2");
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.email, None);
        assert_eq!(record.avatar_url.as_deref(), Some("p.png"));
    }

    #[test]
    fn test_google_falls_back_to_name() {
        let identity = identity("u4", Some("google"), json!({ "name": "Fallback Name" }), None);

        let record = normalize(&identity, frozen_now());

        assert_eq!(record.name, "Fallback Name");
    }

    #[test]
    fn test_unrecognized_provider_with_empty_metadata() {
        let identity = identity("u3", Some("twitter"), json!({}), None);

        let record = normalize(&identity, frozen_now());

        assert_eq!(record.id, "u3");
        assert_eq!(record.name, "twitter User");
        assert_eq!(record.email, None);
        assert_eq!(record.avatar_url, None);
    }

    #[test]
    fn test_unrecognized_provider_chain_order() {
        let identity = identity(
            "u5",
            Some("gitlab"),
            json!({ "full_name": "Full Name", "picture": "pic.png" }),
            None,
        );

        let record = normalize(&identity, frozen_now());

        // name prefers `name` over `full_name`; avatar prefers `avatar_url` over `picture`
        assert_eq!(record.name, "Full Name");
        assert_eq!(record.avatar_url.as_deref(), Some("pic.png"));
    }

    #[test]
    fn test_empty_strings_are_treated_as_absent() {
        let identity = identity(
            "u6",
            Some("github"),
            json!({ "name": "", "email": "", "avatar_url": "" }),
            Some(""),
        );

        let record = normalize(&identity, frozen_now());

        assert_eq!(record.name, "GitHub User");
        assert_eq!(record.email, None);
        assert_eq!(record.avatar_url, None);
    }

    #[test]
    fn test_non_string_metadata_values_are_skipped() {
        let identity = identity(
            "u7",
            Some("github"),
            json!({ "name": 42, "avatar_url": { "nested": true } }),
            None,
        );

        let record = normalize(&identity, frozen_now());

        assert_eq!(record.name, "GitHub User");
        assert_eq!(record.avatar_url, None);
    }

    #[test]
    fn test_frozen_clock_is_deterministic() {
        let identity = identity("u8", Some("google"), json!({ "full_name": "Jane Doe" }), Some("jane@x.com"));

        let first = normalize(&identity, frozen_now());
        let second = normalize(&identity, frozen_now());

        assert_eq!(first, second);
    }

    #[test]
    fn test_provider_resolution_prefers_app_metadata() {
        let mut identity = identity("u9", Some("github"), json!({}), None);
        identity.raw_app_meta_data = json!({ "provider": "google" }).as_object().cloned();

        assert_eq!(Provider::resolve(&identity), Provider::Github);
    }

    #[test]
    fn test_provider_resolution_legacy_field_fallback() {
        let mut identity = identity("u10", None, json!({}), None);
        identity.raw_app_meta_data = json!({ "provider": "google" }).as_object().cloned();

        assert_eq!(Provider::resolve(&identity), Provider::Google);
    }

    #[test]
    fn test_provider_resolution_defaults_to_unknown() {
        let identity = identity("u11", None, json!({ "name": "No Provider" }), None);
        let provider = Provider::resolve(&identity);

        assert_eq!(provider, Provider::Other("unknown".to_string()));

        let record = normalize(&identity, frozen_now());
        assert_eq!(record.name, "No Provider");
    }

    #[test]
    fn test_id_passthrough() {
        let identity = identity("opaque-stable-id", Some("github"), json!({}), None);

        assert_eq!(normalize(&identity, frozen_now()).id, "opaque-stable-id");
    }
}
