//! The profiles table data source.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::app::error::AppError;
use crate::profiles::domain::profile::ProfileRecord;
use crate::profiles::outbound::model::ProfileModel;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Inserts or fully replaces the record keyed by its id. The key itself is
    /// never updated; concurrent writes for the same id resolve to
    /// last-writer-wins through the database's native upsert atomicity.
    async fn upsert(&self, record: &ProfileRecord) -> Result<(), AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<ProfileRecord>, AppError>;
    async fn find_all(&self) -> Result<Vec<ProfileRecord>, AppError>;
    async fn find_recent(&self, limit: i64) -> Result<Vec<ProfileRecord>, AppError>;
}

pub struct ProfileSQL {
    pool: PgPool,
}

impl ProfileSQL {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for ProfileSQL {
    async fn upsert(&self, record: &ProfileRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
                INSERT INTO profiles (id, name, email, avatar_url, updated_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name,
                    email = EXCLUDED.email,
                    avatar_url = EXCLUDED.avatar_url,
                    updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.avatar_url)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ProfileRecord>, AppError> {
        let model = sqlx::query_as::<_, ProfileModel>(
            "SELECT id, name, email, avatar_url, updated_at FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(model.map(ProfileRecord::from))
    }

    async fn find_all(&self) -> Result<Vec<ProfileRecord>, AppError> {
        let models = sqlx::query_as::<_, ProfileModel>(
            "SELECT id, name, email, avatar_url, updated_at FROM profiles ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_recent(&self, limit: i64) -> Result<Vec<ProfileRecord>, AppError> {
        let models = sqlx::query_as::<_, ProfileModel>(
            r#"
                SELECT id, name, email, avatar_url, updated_at
                FROM profiles
                ORDER BY created_at DESC
                LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}
