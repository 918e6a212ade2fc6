use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{entities::kanban_column, models::ids};

#[derive(Debug, Error)]
pub enum KanbanColumnError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Column not found")]
    ColumnNotFound,
    #[error("Project not found")]
    ProjectNotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KanbanColumn {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateKanbanColumn {
    pub name: String,
    pub sort_order: Option<i32>,
}

impl KanbanColumn {
    fn from_model(model: kanban_column::Model, project_uuid: Uuid) -> Self {
        Self {
            id: model.uuid,
            project_id: project_uuid,
            name: model.name,
            sort_order: model.sort_order,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = kanban_column::Entity::find()
            .filter(kanban_column::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => {
                let project_uuid = ids::project_uuid_by_id(db, model.project_id)
                    .await?
                    .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
                Ok(Some(Self::from_model(model, project_uuid)))
            }
            None => Ok(None),
        }
    }

    pub async fn find_by_project_id<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let project_row_id = match ids::project_id_by_uuid(db, project_id).await? {
            Some(id) => id,
            None => return Ok(Vec::new()),
        };
        let records = kanban_column::Entity::find()
            .filter(kanban_column::Column::ProjectId.eq(project_row_id))
            .order_by_asc(kanban_column::Column::SortOrder)
            .all(db)
            .await?;
        Ok(records
            .into_iter()
            .map(|model| Self::from_model(model, project_id))
            .collect())
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
        data: &CreateKanbanColumn,
        column_id: Uuid,
    ) -> Result<Self, KanbanColumnError> {
        let project_row_id = ids::project_id_by_uuid(db, project_id)
            .await?
            .ok_or(KanbanColumnError::ProjectNotFound)?;
        let now = Utc::now();
        let active = kanban_column::ActiveModel {
            uuid: Set(column_id),
            project_id: Set(project_row_id),
            name: Set(data.name.clone()),
            sort_order: Set(data.sort_order.unwrap_or(0)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model, project_id))
    }

    pub async fn name_by_uuid<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<String>, DbErr> {
        kanban_column::Entity::find()
            .select_only()
            .column(kanban_column::Column::Name)
            .filter(kanban_column::Column::Uuid.eq(id))
            .into_tuple()
            .one(db)
            .await
    }
}
