use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    entities::{kanban_column, task, task_category},
    models::ids,
};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Task not found")]
    TaskNotFound,
    #[error("Column not found")]
    ColumnNotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub column_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A (category, option) pair selected on a task. Stored and transported as
/// opaque uuids; display names are resolved at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategorySelection {
    pub category_id: Uuid,
    pub option_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub column_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub sort_order: Option<i32>,
    pub selections: Option<Vec<CategorySelection>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    async fn from_model<C: ConnectionTrait>(db: &C, model: task::Model) -> Result<Self, DbErr> {
        let column_uuid = ids::column_uuid_by_id(db, model.column_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Column not found".to_string()))?;
        Ok(Self {
            id: model.uuid,
            column_id: column_uuid,
            title: model.title,
            description: model.description,
            assigned_to: model.assigned_to,
            due_date: model.due_date.map(Into::into),
            sort_order: model.sort_order,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_column_id<C: ConnectionTrait>(
        db: &C,
        column_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let column_row_id = match ids::column_id_by_uuid(db, column_id).await? {
            Some(id) => id,
            None => return Ok(Vec::new()),
        };
        let models = task::Entity::find()
            .filter(task::Column::ColumnId.eq(column_row_id))
            .order_by_asc(task::Column::SortOrder)
            .all(db)
            .await?;
        let mut tasks = Vec::with_capacity(models.len());
        for model in models {
            tasks.push(Self::from_model(db, model).await?);
        }
        Ok(tasks)
    }

    pub async fn find_by_project_id<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let project_row_id = match ids::project_id_by_uuid(db, project_id).await? {
            Some(id) => id,
            None => return Ok(Vec::new()),
        };
        let column_row_ids: Vec<i64> = kanban_column::Entity::find()
            .select_only()
            .column(kanban_column::Column::Id)
            .filter(kanban_column::Column::ProjectId.eq(project_row_id))
            .into_tuple()
            .all(db)
            .await?;
        if column_row_ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = task::Entity::find()
            .filter(task::Column::ColumnId.is_in(column_row_ids))
            .order_by_asc(task::Column::SortOrder)
            .all(db)
            .await?;
        let mut tasks = Vec::with_capacity(models.len());
        for model in models {
            tasks.push(Self::from_model(db, model).await?);
        }
        Ok(tasks)
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTask,
        task_id: Uuid,
    ) -> Result<Self, TaskError> {
        let column_row_id = ids::column_id_by_uuid(db, data.column_id)
            .await?
            .ok_or(TaskError::ColumnNotFound)?;
        let now = Utc::now();
        let active = task::ActiveModel {
            uuid: Set(task_id),
            column_id: Set(column_row_id),
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            assigned_to: Set(data.assigned_to.clone()),
            due_date: Set(data.due_date),
            sort_order: Set(data.sort_order.unwrap_or(0)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        if let Some(selections) = &data.selections {
            Self::replace_selections_by_row_id(db, model.id, selections).await?;
        }
        Ok(Self::from_model(db, model).await.map_err(TaskError::from)?)
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateTask,
    ) -> Result<Self, TaskError> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(TaskError::TaskNotFound)?;
        let mut active: task::ActiveModel = record.clone().into();
        if let Some(title) = &data.title {
            active.title = Set(title.clone());
        }
        if data.description.is_some() {
            active.description = Set(data.description.clone());
        }
        if data.assigned_to.is_some() {
            active.assigned_to = Set(data.assigned_to.clone());
        }
        if data.due_date.is_some() {
            active.due_date = Set(data.due_date);
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;
        Ok(Self::from_model(db, updated).await.map_err(TaskError::from)?)
    }

    /// Column and sort position update used by the kanban move path. The
    /// write is unconditional; the caller decides whether a timeline entry
    /// follows.
    pub async fn update_column_and_sort<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        column_id: Uuid,
        sort_order: i32,
    ) -> Result<Self, TaskError> {
        let column_row_id = ids::column_id_by_uuid(db, column_id)
            .await?
            .ok_or(TaskError::ColumnNotFound)?;
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(TaskError::TaskNotFound)?;
        let mut active: task::ActiveModel = record.into();
        active.column_id = Set(column_row_id);
        active.sort_order = Set(sort_order);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;
        Ok(Self::from_model(db, updated).await.map_err(TaskError::from)?)
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = task::Entity::delete_many()
            .filter(task::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn selections<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Vec<CategorySelection>, DbErr> {
        let task_row_id = match ids::task_id_by_uuid(db, id).await? {
            Some(row_id) => row_id,
            None => return Ok(Vec::new()),
        };
        let records = task_category::Entity::find()
            .filter(task_category::Column::TaskId.eq(task_row_id))
            .all(db)
            .await?;
        Ok(records
            .into_iter()
            .map(|model| CategorySelection {
                category_id: model.category_id,
                option_id: model.option_id,
            })
            .collect())
    }

    pub async fn replace_selections<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        selections: &[CategorySelection],
    ) -> Result<(), TaskError> {
        let task_row_id = ids::task_id_by_uuid(db, id)
            .await?
            .ok_or(TaskError::TaskNotFound)?;
        Self::replace_selections_by_row_id(db, task_row_id, selections).await?;
        Ok(())
    }

    async fn replace_selections_by_row_id<C: ConnectionTrait>(
        db: &C,
        task_row_id: i64,
        selections: &[CategorySelection],
    ) -> Result<(), DbErr> {
        task_category::Entity::delete_many()
            .filter(task_category::Column::TaskId.eq(task_row_id))
            .exec(db)
            .await?;
        let now = Utc::now();
        for selection in selections {
            let active = task_category::ActiveModel {
                task_id: Set(task_row_id),
                category_id: Set(selection.category_id),
                option_id: Set(selection.option_id),
                created_at: Set(now),
                ..Default::default()
            };
            active.insert(db).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::{
        kanban_column::{CreateKanbanColumn, KanbanColumn},
        project::{CreateProject, Project},
    };

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn seed_column(db: &sea_orm::DatabaseConnection) -> KanbanColumn {
        let project = Project::create(
            db,
            &CreateProject {
                name: "Ops".to_string(),
                description: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        KanbanColumn::create(
            db,
            project.id,
            &CreateKanbanColumn {
                name: "To Do".to_string(),
                sort_order: Some(0),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_and_fetch_task_with_selections() {
        let db = setup_db().await;
        let column = seed_column(&db).await;

        let selection = CategorySelection {
            category_id: Uuid::new_v4(),
            option_id: Uuid::new_v4(),
        };
        let task_id = Uuid::new_v4();
        let task = Task::create(
            &db,
            &CreateTask {
                column_id: column.id,
                title: "Investigate outage".to_string(),
                description: None,
                assigned_to: Some("ops@example.com".to_string()),
                due_date: None,
                sort_order: Some(3),
                selections: Some(vec![selection]),
            },
            task_id,
        )
        .await
        .unwrap();
        assert_eq!(task.id, task_id);
        assert_eq!(task.column_id, column.id);
        assert_eq!(task.sort_order, 3);

        let selections = Task::selections(&db, task_id).await.unwrap();
        assert_eq!(selections, vec![selection]);
    }

    #[tokio::test]
    async fn replace_selections_overwrites_previous_pairs() {
        let db = setup_db().await;
        let column = seed_column(&db).await;
        let task = Task::create(
            &db,
            &CreateTask {
                column_id: column.id,
                title: "Tag me".to_string(),
                description: None,
                assigned_to: None,
                due_date: None,
                sort_order: None,
                selections: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let first = CategorySelection {
            category_id: Uuid::new_v4(),
            option_id: Uuid::new_v4(),
        };
        let second = CategorySelection {
            category_id: Uuid::new_v4(),
            option_id: Uuid::new_v4(),
        };
        Task::replace_selections(&db, task.id, &[first]).await.unwrap();
        Task::replace_selections(&db, task.id, &[second]).await.unwrap();

        let selections = Task::selections(&db, task.id).await.unwrap();
        assert_eq!(selections, vec![second]);
    }

    #[tokio::test]
    async fn update_column_and_sort_moves_the_row() {
        let db = setup_db().await;
        let column = seed_column(&db).await;
        let other = KanbanColumn::create(
            &db,
            column.project_id,
            &CreateKanbanColumn {
                name: "Done".to_string(),
                sort_order: Some(1),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let task = Task::create(
            &db,
            &CreateTask {
                column_id: column.id,
                title: "Move me".to_string(),
                description: None,
                assigned_to: None,
                due_date: None,
                sort_order: None,
                selections: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let moved = Task::update_column_and_sort(&db, task.id, other.id, 5)
            .await
            .unwrap();
        assert_eq!(moved.column_id, other.id);
        assert_eq!(moved.sort_order, 5);
    }

    #[tokio::test]
    async fn find_by_project_id_spans_all_columns() {
        let db = setup_db().await;
        let column = seed_column(&db).await;
        let other = KanbanColumn::create(
            &db,
            column.project_id,
            &CreateKanbanColumn {
                name: "Done".to_string(),
                sort_order: Some(1),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        for (column_id, title, sort_order) in [
            (column.id, "First", 0),
            (other.id, "Second", 1),
        ] {
            Task::create(
                &db,
                &CreateTask {
                    column_id,
                    title: title.to_string(),
                    description: None,
                    assigned_to: None,
                    due_date: None,
                    sort_order: Some(sort_order),
                    selections: None,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();
        }

        let tasks = Task::find_by_project_id(&db, column.project_id).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "First");
        assert_eq!(tasks[1].title, "Second");

        let none = Task::find_by_project_id(&db, Uuid::new_v4()).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn missing_task_is_task_not_found() {
        let db = setup_db().await;
        let column = seed_column(&db).await;
        let err = Task::update_column_and_sort(&db, Uuid::new_v4(), column.id, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::TaskNotFound));
    }
}
