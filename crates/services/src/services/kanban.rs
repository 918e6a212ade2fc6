use std::collections::HashSet;

use db::{
    models::{
        task::{CategorySelection, CreateTask, Task, TaskError, UpdateTask},
        timeline_entry::{
            CategoriesUpdatedDetails, CommentDetails, MovedDetails, TimelineEntry, TimelineError,
        },
    },
    types::TimelineAction,
    DBService,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum KanbanError {
    #[error(transparent)]
    Database(#[from] db::DbErr),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error("Task not found")]
    TaskNotFound,
}

/// Task mutations plus their timeline bookkeeping. The timeline append is
/// not transactional with the task write; when it fails the mutation stands
/// and the gap is logged.
#[derive(Clone)]
pub struct KanbanService {
    db: DBService,
}

impl KanbanService {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }

    async fn append_entry(
        &self,
        task_id: Uuid,
        action: TimelineAction,
        user_email: &str,
        details: serde_json::Value,
    ) {
        if let Err(err) =
            TimelineEntry::create(&self.db.conn, task_id, action, user_email, details).await
        {
            match err {
                TimelineError::TaskNotFound => {
                    tracing::warn!(%task_id, "timeline entry skipped, task vanished")
                }
                TimelineError::Database(err) => {
                    tracing::warn!(%task_id, "failed to append timeline entry: {err}")
                }
            }
        }
    }

    pub async fn create_task(
        &self,
        data: &CreateTask,
        user_email: &str,
    ) -> Result<Task, KanbanError> {
        let task = Task::create(&self.db.conn, data, Uuid::new_v4()).await?;
        self.append_entry(task.id, TimelineAction::Created, user_email, json!({}))
            .await;
        Ok(task)
    }

    pub async fn update_task(
        &self,
        task_id: Uuid,
        data: &UpdateTask,
        user_email: &str,
    ) -> Result<Task, KanbanError> {
        let task = Task::update(&self.db.conn, task_id, data).await?;
        self.append_entry(task.id, TimelineAction::Updated, user_email, json!({}))
            .await;
        Ok(task)
    }

    /// Moves a task to a column at a sort position. The write is
    /// unconditional; a `moved` entry is appended only when the column
    /// actually changed, so reordering within a column stays silent.
    pub async fn move_task(
        &self,
        task_id: Uuid,
        destination_column_id: Uuid,
        new_sort_order: i32,
        user_email: &str,
    ) -> Result<Task, KanbanError> {
        let before = Task::find_by_id(&self.db.conn, task_id)
            .await?
            .ok_or(KanbanError::TaskNotFound)?;
        let task = Task::update_column_and_sort(
            &self.db.conn,
            task_id,
            destination_column_id,
            new_sort_order,
        )
        .await?;

        if before.column_id != task.column_id {
            let details = MovedDetails {
                from_column: before.column_id,
                to_column: task.column_id,
                sort_order: task.sort_order,
            };
            self.append_entry(
                task.id,
                TimelineAction::Moved,
                user_email,
                serde_json::to_value(details).unwrap_or_else(|_| json!({})),
            )
            .await;
        }
        Ok(task)
    }

    /// Replaces the task's (category, option) pairs. A `categories_updated`
    /// entry is appended only when the selection set changed. Details carry
    /// raw uuids; names are resolved at display time.
    pub async fn update_categories(
        &self,
        task_id: Uuid,
        selections: Vec<CategorySelection>,
        user_email: &str,
    ) -> Result<Vec<CategorySelection>, KanbanError> {
        let before = Task::selections(&self.db.conn, task_id).await?;
        Task::replace_selections(&self.db.conn, task_id, &selections).await?;

        // Compared as sets in both directions so a duplicated pair in the
        // new list cannot mask a removal.
        let before_set: HashSet<CategorySelection> = before.iter().copied().collect();
        let after_set: HashSet<CategorySelection> = selections.iter().copied().collect();
        if before_set != after_set {
            let details = CategoriesUpdatedDetails {
                selections: selections.clone(),
            };
            self.append_entry(
                task_id,
                TimelineAction::CategoriesUpdated,
                user_email,
                serde_json::to_value(details).unwrap_or_else(|_| json!({})),
            )
            .await;
        }
        Ok(selections)
    }

    pub async fn comment(
        &self,
        task_id: Uuid,
        user_email: &str,
        body: String,
    ) -> Result<TimelineEntry, KanbanError> {
        if Task::find_by_id(&self.db.conn, task_id).await?.is_none() {
            return Err(KanbanError::TaskNotFound);
        }
        let entry = TimelineEntry::create(
            &self.db.conn,
            task_id,
            TimelineAction::Commented,
            user_email,
            serde_json::to_value(CommentDetails { body }).unwrap_or_else(|_| json!({})),
        )
        .await
        .map_err(|err| match err {
            TimelineError::TaskNotFound => KanbanError::TaskNotFound,
            TimelineError::Database(err) => KanbanError::Database(err),
        })?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use db::models::{
        kanban_column::{CreateKanbanColumn, KanbanColumn},
        project::{CreateProject, Project},
    };
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup() -> (DBService, KanbanColumn, KanbanColumn) {
        let db = DBService::new_with_url("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db.conn, None).await.unwrap();
        let project = Project::create(
            &db.conn,
            &CreateProject {
                name: "Ops".to_string(),
                description: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        let todo = KanbanColumn::create(
            &db.conn,
            project.id,
            &CreateKanbanColumn {
                name: "To Do".to_string(),
                sort_order: Some(0),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        let done = KanbanColumn::create(
            &db.conn,
            project.id,
            &CreateKanbanColumn {
                name: "Done".to_string(),
                sort_order: Some(1),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        (db, todo, done)
    }

    async fn seed_task(service: &KanbanService, column_id: Uuid) -> Task {
        service
            .create_task(
                &CreateTask {
                    column_id,
                    title: "Fix the pager".to_string(),
                    description: None,
                    assigned_to: None,
                    due_date: None,
                    sort_order: None,
                    selections: None,
                },
                "ops@example.com",
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn cross_column_move_appends_exactly_one_moved_entry() {
        let (db, todo, done) = setup().await;
        let service = KanbanService::new(db.clone());
        let task = seed_task(&service, todo.id).await;

        let moved = service
            .move_task(task.id, done.id, 2, "ops@example.com")
            .await
            .unwrap();
        assert_eq!(moved.column_id, done.id);

        let entries = TimelineEntry::find_by_task_id(&db.conn, task.id)
            .await
            .unwrap();
        let moved_entries: Vec<_> = entries
            .iter()
            .filter(|e| e.action == TimelineAction::Moved)
            .collect();
        assert_eq!(moved_entries.len(), 1);
        assert_eq!(
            moved_entries[0].details["from_column"],
            todo.id.to_string()
        );
        assert_eq!(moved_entries[0].details["to_column"], done.id.to_string());
    }

    #[tokio::test]
    async fn same_column_move_is_silent() {
        let (db, todo, _done) = setup().await;
        let service = KanbanService::new(db.clone());
        let task = seed_task(&service, todo.id).await;

        let moved = service
            .move_task(task.id, todo.id, 7, "ops@example.com")
            .await
            .unwrap();
        assert_eq!(moved.sort_order, 7);

        let entries = TimelineEntry::find_by_task_id(&db.conn, task.id)
            .await
            .unwrap();
        assert!(entries.iter().all(|e| e.action != TimelineAction::Moved));
    }

    #[tokio::test]
    async fn moving_a_missing_task_is_not_found() {
        let (db, todo, _done) = setup().await;
        let service = KanbanService::new(db);
        let err = service
            .move_task(Uuid::new_v4(), todo.id, 0, "ops@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::TaskNotFound));
    }

    #[tokio::test]
    async fn unchanged_selection_set_appends_nothing() {
        let (db, todo, _done) = setup().await;
        let service = KanbanService::new(db.clone());
        let task = seed_task(&service, todo.id).await;

        let selection = CategorySelection {
            category_id: Uuid::new_v4(),
            option_id: Uuid::new_v4(),
        };
        service
            .update_categories(task.id, vec![selection], "ops@example.com")
            .await
            .unwrap();
        service
            .update_categories(task.id, vec![selection], "ops@example.com")
            .await
            .unwrap();

        let entries = TimelineEntry::find_by_task_id(&db.conn, task.id)
            .await
            .unwrap();
        let updates: Vec<_> = entries
            .iter()
            .filter(|e| e.action == TimelineAction::CategoriesUpdated)
            .collect();
        assert_eq!(updates.len(), 1);
    }

    #[tokio::test]
    async fn duplicated_pair_does_not_mask_a_removal() {
        let (db, todo, _done) = setup().await;
        let service = KanbanService::new(db.clone());
        let task = seed_task(&service, todo.id).await;

        let kept = CategorySelection {
            category_id: Uuid::new_v4(),
            option_id: Uuid::new_v4(),
        };
        let removed = CategorySelection {
            category_id: Uuid::new_v4(),
            option_id: Uuid::new_v4(),
        };
        service
            .update_categories(task.id, vec![kept, removed], "ops@example.com")
            .await
            .unwrap();
        // Same length as before and every pair already stored, but the set
        // shrank.
        service
            .update_categories(task.id, vec![kept, kept], "ops@example.com")
            .await
            .unwrap();

        let entries = TimelineEntry::find_by_task_id(&db.conn, task.id)
            .await
            .unwrap();
        let updates: Vec<_> = entries
            .iter()
            .filter(|e| e.action == TimelineAction::CategoriesUpdated)
            .collect();
        assert_eq!(updates.len(), 2);
    }

    #[tokio::test]
    async fn comment_appends_a_commented_entry() {
        let (db, todo, _done) = setup().await;
        let service = KanbanService::new(db.clone());
        let task = seed_task(&service, todo.id).await;

        let entry = service
            .comment(task.id, "ops@example.com", "looking into it".to_string())
            .await
            .unwrap();
        assert_eq!(entry.action, TimelineAction::Commented);
        assert_eq!(entry.details["body"], "looking into it");
    }
}
