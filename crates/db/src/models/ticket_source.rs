use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::ticket_source;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSource {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicketSource {
    pub name: String,
}

impl TicketSource {
    fn from_model(model: ticket_source::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            created_at: model.created_at.into(),
        }
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = ticket_source::Entity::find()
            .order_by_asc(ticket_source::Column::Name)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = ticket_source::Entity::find()
            .filter(ticket_source::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTicketSource,
        source_id: Uuid,
    ) -> Result<Self, DbErr> {
        let active = ticket_source::ActiveModel {
            uuid: Set(source_id),
            name: Set(data.name.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }
}
