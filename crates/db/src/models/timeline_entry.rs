use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    entities::timeline_entry,
    models::{ids, task::CategorySelection},
    types::TimelineAction,
};

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Task not found")]
    TaskNotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub action: TimelineAction,
    pub user_email: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Payload recorded when a task changes column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovedDetails {
    pub from_column: Uuid,
    pub to_column: Uuid,
    pub sort_order: i32,
}

/// Payload recorded when a task's category selections are replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesUpdatedDetails {
    pub selections: Vec<CategorySelection>,
}

/// Payload recorded for a free-form comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentDetails {
    pub body: String,
}

impl TimelineEntry {
    async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: timeline_entry::Model,
    ) -> Result<Self, DbErr> {
        let task_uuid = ids::task_uuid_by_id(db, model.task_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;
        Ok(Self {
            id: model.uuid,
            task_id: task_uuid,
            action: model.action,
            user_email: model.user_email,
            details: model.details,
            created_at: model.created_at.into(),
        })
    }

    /// Appends an entry to a task's timeline. Entries are never updated or
    /// deleted afterwards.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        task_id: Uuid,
        action: TimelineAction,
        user_email: &str,
        details: serde_json::Value,
    ) -> Result<Self, TimelineError> {
        let task_row_id = ids::task_id_by_uuid(db, task_id)
            .await?
            .ok_or(TimelineError::TaskNotFound)?;
        let active = timeline_entry::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            task_id: Set(task_row_id),
            action: Set(action),
            user_email: Set(user_email.to_string()),
            details: Set(details),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(db, model).await?)
    }

    /// Newest entries first.
    pub async fn find_by_task_id<C: ConnectionTrait>(
        db: &C,
        task_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let task_row_id = match ids::task_id_by_uuid(db, task_id).await? {
            Some(id) => id,
            None => return Ok(Vec::new()),
        };
        let models = timeline_entry::Entity::find()
            .filter(timeline_entry::Column::TaskId.eq(task_row_id))
            .order_by_desc(timeline_entry::Column::CreatedAt)
            .order_by_desc(timeline_entry::Column::Id)
            .all(db)
            .await?;
        let mut entries = Vec::with_capacity(models.len());
        for model in models {
            entries.push(Self::from_model(db, model).await?);
        }
        Ok(entries)
    }
}
