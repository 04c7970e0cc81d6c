use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::app::error::AppError;
use crate::profiles::domain::inout::{GetProfileInput, GetProfileOutput, SyncProfileInput, SyncProfileOutput};
use crate::profiles::domain::profile::{normalize, ProfileRecord, Provider};
use crate::profiles::outbound::store::ProfileStore;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileUseCase: Send + Sync {
    /// Re-normalizes the caller's identity and overwrites their profile row.
    /// Produces the same record as the post-sign-in sync for the same input.
    async fn sync_profile(&self, input: SyncProfileInput) -> Result<SyncProfileOutput, AppError>;

    async fn get_profile(&self, input: GetProfileInput) -> Result<GetProfileOutput, AppError>;
    async fn list_profiles(&self) -> Result<Vec<ProfileRecord>, AppError>;
    async fn recent_profiles(&self, limit: i64) -> Result<Vec<ProfileRecord>, AppError>;
}

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ProfileUseCase for ProfileService {
    async fn sync_profile(&self, input: SyncProfileInput) -> Result<SyncProfileOutput, AppError> {
        let provider = Provider::resolve(&input.identity);
        let record = normalize(&input.identity, Utc::now());

        // Unlike the post-sign-in sync, a store failure here is surfaced: the
        // user explicitly asked for the write and should see it fail.
        self.store.upsert(&record).await.map_err(|err| {
            tracing::error!(user_id = %record.id, error = ?err, "Profile sync failed");
            err
        })?;

        Ok(SyncProfileOutput { success: true, provider: provider.to_string() })
    }

    async fn get_profile(&self, input: GetProfileInput) -> Result<GetProfileOutput, AppError> {
        let provider = Provider::resolve(&input.identity);

        let profile = self.store.find_by_id(&input.identity.id).await?.ok_or_else(|| {
            AppError::NotFound("Your profile has not been synced yet. Run a profile sync and try again.".to_string())
        })?;

        Ok(GetProfileOutput { profile, provider: provider.to_string() })
    }

    async fn list_profiles(&self) -> Result<Vec<ProfileRecord>, AppError> {
        self.store.find_all().await
    }

    async fn recent_profiles(&self, limit: i64) -> Result<Vec<ProfileRecord>, AppError> {
        self.store.find_recent(limit).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use crate::app::oauth::RawIdentity;
    use crate::profiles::outbound::store::MockProfileStore;

    use super::*;

    fn google_identity() -> RawIdentity {
        RawIdentity {
            id: "u2".to_string(),
            email: None,
            user_metadata: json!({ "full_name": "Jane Doe", "picture": "p.png" })
                .as_object()
                .cloned()
                .unwrap(),
            app_metadata: json!({ "provider": "google" }).as_object().cloned().unwrap(),
            raw_app_meta_data: None,
        }
    }

    fn stored_record() -> ProfileRecord {
        ProfileRecord {
            id: "u2".to_string(),
            name: "Jane Doe".to_string(),
            email: None,
            avatar_url: Some("p.png".to_string()),
            updated_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_sync_profile_upserts_normalized_record() {
        let mut store = MockProfileStore::new();
        store
            .expect_upsert()
            .withf(|record| {
                record.id == "u2"
                    && record.name == "Jane Doe"
                    && record.email.is_none()
                    && record.avatar_url.as_deref() == Some("p.png")
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = ProfileService::new(Arc::new(store));
        let output = service
            .sync_profile(SyncProfileInput { identity: google_identity() })
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.provider, "google");
    }

    #[tokio::test]
    async fn test_sync_profile_surfaces_store_failure() {
        let mut store = MockProfileStore::new();
        store
            .expect_upsert()
            .returning(|_| Err(AppError::Database(sqlx::Error::PoolTimedOut)));

        let service = ProfileService::new(Arc::new(store));
        let result = service.sync_profile(SyncProfileInput { identity: google_identity() }).await;

        assert!(matches!(result.unwrap_err(), AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_get_profile() {
        let mut store = MockProfileStore::new();
        store
            .expect_find_by_id()
            .withf(|id| id == "u2")
            .returning(|_| Ok(Some(stored_record())));

        let service = ProfileService::new(Arc::new(store));
        let output = service.get_profile(GetProfileInput { identity: google_identity() }).await.unwrap();

        assert_eq!(output.profile, stored_record());
        assert_eq!(output.provider, "google");
    }

    #[tokio::test]
    async fn test_get_profile_not_synced() {
        let mut store = MockProfileStore::new();
        store.expect_find_by_id().returning(|_| Ok(None));

        let service = ProfileService::new(Arc::new(store));
        let result = service.get_profile(GetProfileInput { identity: google_identity() }).await;

        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_recent_profiles_passes_limit() {
        let mut store = MockProfileStore::new();
        store
            .expect_find_recent()
            .withf(|limit| *limit == 3)
            .returning(|_| Ok(vec![stored_record()]));

        let service = ProfileService::new(Arc::new(store));
        let profiles = service.recent_profiles(3).await.unwrap();

        assert_eq!(profiles.len(), 1);
    }
}
