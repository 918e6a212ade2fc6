use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{entities::master_mapping, models::ids};

#[derive(Debug, Error)]
pub enum MasterMappingError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Ticket source not found")]
    SourceNotFound,
    #[error("Mapping already exists for this source and identity")]
    DuplicateMapping,
}

/// Links an external assignee identity (as it appears in ticket exports) to
/// an internal user email, per ticket source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterMapping {
    pub id: Uuid,
    pub source_id: Uuid,
    pub external_identity_value: String,
    pub internal_user_email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMasterMapping {
    pub source_id: Uuid,
    pub external_identity_value: String,
    pub internal_user_email: String,
}

impl MasterMapping {
    fn from_model(model: master_mapping::Model, source_uuid: Uuid) -> Self {
        Self {
            id: model.uuid,
            source_id: source_uuid,
            external_identity_value: model.external_identity_value,
            internal_user_email: model.internal_user_email,
            created_at: model.created_at.into(),
        }
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = master_mapping::Entity::find()
            .order_by_asc(master_mapping::Column::ExternalIdentityValue)
            .all(db)
            .await?;
        let mut mappings = Vec::with_capacity(records.len());
        for model in records {
            let source_uuid = ids::source_uuid_by_id(db, model.source_id)
                .await?
                .ok_or(DbErr::RecordNotFound("Ticket source not found".to_string()))?;
            mappings.push(Self::from_model(model, source_uuid));
        }
        Ok(mappings)
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateMasterMapping,
    ) -> Result<Self, MasterMappingError> {
        let source_row_id = ids::source_id_by_uuid(db, data.source_id)
            .await?
            .ok_or(MasterMappingError::SourceNotFound)?;
        let existing = master_mapping::Entity::find()
            .filter(master_mapping::Column::SourceId.eq(source_row_id))
            .filter(
                master_mapping::Column::ExternalIdentityValue
                    .eq(data.external_identity_value.as_str()),
            )
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(MasterMappingError::DuplicateMapping);
        }
        let active = master_mapping::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            source_id: Set(source_row_id),
            external_identity_value: Set(data.external_identity_value.clone()),
            internal_user_email: Set(data.internal_user_email.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model, data.source_id))
    }

    /// Resolves an external identity to an internal email, if mapped.
    pub async fn lookup<C: ConnectionTrait>(
        db: &C,
        source_id: Uuid,
        external_identity_value: &str,
    ) -> Result<Option<String>, DbErr> {
        let source_row_id = match ids::source_id_by_uuid(db, source_id).await? {
            Some(id) => id,
            None => return Ok(None),
        };
        master_mapping::Entity::find()
            .select_only()
            .column(master_mapping::Column::InternalUserEmail)
            .filter(master_mapping::Column::SourceId.eq(source_row_id))
            .filter(master_mapping::Column::ExternalIdentityValue.eq(external_identity_value))
            .into_tuple()
            .one(db)
            .await
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = master_mapping::Entity::delete_many()
            .filter(master_mapping::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::ticket_source::{CreateTicketSource, TicketSource};

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn create_lookup_and_duplicate_rejection() {
        let db = setup_db().await;
        let source = TicketSource::create(
            &db,
            &CreateTicketSource {
                name: "remedy".to_string(),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let data = CreateMasterMapping {
            source_id: source.id,
            external_identity_value: "jdoe".to_string(),
            internal_user_email: "jdoe@example.com".to_string(),
        };
        MasterMapping::create(&db, &data).await.unwrap();

        assert_eq!(
            MasterMapping::lookup(&db, source.id, "jdoe").await.unwrap(),
            Some("jdoe@example.com".to_string())
        );
        assert_eq!(
            MasterMapping::lookup(&db, source.id, "nobody").await.unwrap(),
            None
        );

        let err = MasterMapping::create(&db, &data).await.unwrap_err();
        assert!(matches!(err, MasterMappingError::DuplicateMapping));
    }

    #[tokio::test]
    async fn delete_removes_the_mapping() {
        let db = setup_db().await;
        let source = TicketSource::create(
            &db,
            &CreateTicketSource {
                name: "remedy".to_string(),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        let mapping = MasterMapping::create(
            &db,
            &CreateMasterMapping {
                source_id: source.id,
                external_identity_value: "jdoe".to_string(),
                internal_user_email: "jdoe@example.com".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(MasterMapping::delete(&db, mapping.id).await.unwrap(), 1);
        assert_eq!(
            MasterMapping::lookup(&db, source.id, "jdoe").await.unwrap(),
            None
        );
    }
}
