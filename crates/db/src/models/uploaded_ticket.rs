use chrono::{DateTime, NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{entities::uploaded_ticket, models::ids};

#[derive(Debug, Error)]
pub enum UploadedTicketError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Ticket source not found")]
    SourceNotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedTicket {
    pub id: Uuid,
    pub source_id: Uuid,
    pub incident_id: String,
    pub priority: Option<String>,
    pub region: Option<String>,
    pub assigned_to: Option<String>,
    pub mapped_user_email: Option<String>,
    pub status: Option<String>,
    pub opened_at: Option<NaiveDateTime>,
    pub resolved_at: Option<NaiveDateTime>,
    pub closed_at: Option<NaiveDateTime>,
    pub reassignment_count: Option<i64>,
    pub reopen_count: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateUploadedTicket {
    pub incident_id: String,
    pub priority: Option<String>,
    pub region: Option<String>,
    pub assigned_to: Option<String>,
    pub mapped_user_email: Option<String>,
    pub status: Option<String>,
    pub opened_at: Option<NaiveDateTime>,
    pub resolved_at: Option<NaiveDateTime>,
    pub closed_at: Option<NaiveDateTime>,
    pub reassignment_count: Option<i64>,
    pub reopen_count: Option<i64>,
}

impl UploadedTicket {
    fn from_model(model: uploaded_ticket::Model, source_uuid: Uuid) -> Self {
        Self {
            id: model.uuid,
            source_id: source_uuid,
            incident_id: model.incident_id,
            priority: model.priority,
            region: model.region,
            assigned_to: model.assigned_to,
            mapped_user_email: model.mapped_user_email,
            status: model.status,
            opened_at: model.opened_at,
            resolved_at: model.resolved_at,
            closed_at: model.closed_at,
            reassignment_count: model.reassignment_count,
            reopen_count: model.reopen_count,
            created_at: model.created_at.into(),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        source_id: Uuid,
        data: &CreateUploadedTicket,
    ) -> Result<Self, UploadedTicketError> {
        let source_row_id = ids::source_id_by_uuid(db, source_id)
            .await?
            .ok_or(UploadedTicketError::SourceNotFound)?;
        let active = uploaded_ticket::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            source_id: Set(source_row_id),
            incident_id: Set(data.incident_id.clone()),
            priority: Set(data.priority.clone()),
            region: Set(data.region.clone()),
            assigned_to: Set(data.assigned_to.clone()),
            mapped_user_email: Set(data.mapped_user_email.clone()),
            status: Set(data.status.clone()),
            opened_at: Set(data.opened_at),
            resolved_at: Set(data.resolved_at),
            closed_at: Set(data.closed_at),
            reassignment_count: Set(data.reassignment_count),
            reopen_count: Set(data.reopen_count),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model, source_id))
    }

    pub async fn find_by_source_id<C: ConnectionTrait>(
        db: &C,
        source_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let source_row_id = match ids::source_id_by_uuid(db, source_id).await? {
            Some(id) => id,
            None => return Ok(Vec::new()),
        };
        let records = uploaded_ticket::Entity::find()
            .filter(uploaded_ticket::Column::SourceId.eq(source_row_id))
            .order_by_desc(uploaded_ticket::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(records
            .into_iter()
            .map(|model| Self::from_model(model, source_id))
            .collect())
    }

    /// True when the incident is already stored for this source. Used to
    /// reject duplicates during import.
    pub async fn exists_for_source<C: ConnectionTrait>(
        db: &C,
        source_id: Uuid,
        incident_id: &str,
    ) -> Result<bool, DbErr> {
        let source_row_id = match ids::source_id_by_uuid(db, source_id).await? {
            Some(id) => id,
            None => return Ok(false),
        };
        let count = uploaded_ticket::Entity::find()
            .filter(uploaded_ticket::Column::SourceId.eq(source_row_id))
            .filter(uploaded_ticket::Column::IncidentId.eq(incident_id))
            .count(db)
            .await?;
        Ok(count > 0)
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
    async fn create_and_list_tickets_for_source() {
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

        let ticket = UploadedTicket::create(
            &db,
            source.id,
            &CreateUploadedTicket {
                incident_id: "INC001".to_string(),
                priority: Some("P2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(ticket.source_id, source.id);

        let tickets = UploadedTicket::find_by_source_id(&db, source.id)
            .await
            .unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].incident_id, "INC001");

        assert!(
            UploadedTicket::exists_for_source(&db, source.id, "INC001")
                .await
                .unwrap()
        );
        assert!(
            !UploadedTicket::exists_for_source(&db, source.id, "INC002")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn unknown_source_rejects_insert() {
        let db = setup_db().await;
        let err = UploadedTicket::create(
            &db,
            Uuid::new_v4(),
            &CreateUploadedTicket {
                incident_id: "INC001".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UploadedTicketError::SourceNotFound));
    }
}
