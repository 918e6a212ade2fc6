use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::tracker_config;

/// Per-user connection settings for the external issue tracker. The token is
/// kept out of the serialized form; API reads go through [`TrackerConfigInfo`].
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub id: Uuid,
    pub user_email: String,
    pub base_url: String,
    pub account_email: String,
    pub api_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Redacted view returned by the HTTP API.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerConfigInfo {
    pub id: Uuid,
    pub user_email: String,
    pub base_url: String,
    pub account_email: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertTrackerConfig {
    pub base_url: String,
    pub account_email: String,
    pub api_token: String,
}

impl TrackerConfig {
    fn from_model(model: tracker_config::Model) -> Self {
        Self {
            id: model.uuid,
            user_email: model.user_email,
            base_url: model.base_url,
            account_email: model.account_email,
            api_token: model.api_token,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub fn info(&self) -> TrackerConfigInfo {
        TrackerConfigInfo {
            id: self.id,
            user_email: self.user_email.clone(),
            base_url: self.base_url.clone(),
            account_email: self.account_email.clone(),
            updated_at: self.updated_at,
        }
    }

    pub async fn find_by_user_email<C: ConnectionTrait>(
        db: &C,
        user_email: &str,
    ) -> Result<Option<Self>, DbErr> {
        let record = tracker_config::Entity::find()
            .filter(tracker_config::Column::UserEmail.eq(user_email))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    /// One config per user email. A second save overwrites the first.
    pub async fn upsert_for_user<C: ConnectionTrait>(
        db: &C,
        user_email: &str,
        data: &UpsertTrackerConfig,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let existing = tracker_config::Entity::find()
            .filter(tracker_config::Column::UserEmail.eq(user_email))
            .one(db)
            .await?;
        let model = match existing {
            Some(record) => {
                let mut active: tracker_config::ActiveModel = record.into();
                active.base_url = Set(data.base_url.clone());
                active.account_email = Set(data.account_email.clone());
                active.api_token = Set(data.api_token.clone());
                active.updated_at = Set(now);
                active.update(db).await?
            }
            None => {
                let active = tracker_config::ActiveModel {
                    uuid: Set(Uuid::new_v4()),
                    user_email: Set(user_email.to_string()),
                    base_url: Set(data.base_url.clone()),
                    account_email: Set(data.account_email.clone()),
                    api_token: Set(data.api_token.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                active.insert(db).await?
            }
        };
        Ok(Self::from_model(model))
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn upsert_overwrites_existing_config() {
        let db = setup_db().await;

        let first = TrackerConfig::upsert_for_user(
            &db,
            "ops@example.com",
            &UpsertTrackerConfig {
                base_url: "https://tracker.example.com".to_string(),
                account_email: "bot@example.com".to_string(),
                api_token: "token-1".to_string(),
            },
        )
        .await
        .unwrap();

        let second = TrackerConfig::upsert_for_user(
            &db,
            "ops@example.com",
            &UpsertTrackerConfig {
                base_url: "https://tracker.example.com".to_string(),
                account_email: "bot@example.com".to_string(),
                api_token: "token-2".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.api_token, "token-2");

        let loaded = TrackerConfig::find_by_user_email(&db, "ops@example.com")
            .await
            .unwrap()
            .expect("config");
        assert_eq!(loaded.api_token, "token-2");
    }

    #[tokio::test]
    async fn info_omits_the_api_token() {
        let db = setup_db().await;
        let config = TrackerConfig::upsert_for_user(
            &db,
            "ops@example.com",
            &UpsertTrackerConfig {
                base_url: "https://tracker.example.com".to_string(),
                account_email: "bot@example.com".to_string(),
                api_token: "secret".to_string(),
            },
        )
        .await
        .unwrap();

        let info = serde_json::to_value(config.info()).unwrap();
        assert!(info.get("api_token").is_none());
        assert_eq!(info["base_url"], "https://tracker.example.com");
    }
}
