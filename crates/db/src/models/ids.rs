use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entities::{category, kanban_column, project, task, ticket_source};

pub async fn project_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    project::Entity::find()
        .select_only()
        .column(project::Column::Id)
        .filter(project::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn project_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    project::Entity::find()
        .select_only()
        .column(project::Column::Uuid)
        .filter(project::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn category_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    category::Entity::find()
        .select_only()
        .column(category::Column::Id)
        .filter(category::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn column_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    kanban_column::Entity::find()
        .select_only()
        .column(kanban_column::Column::Id)
        .filter(kanban_column::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn column_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    kanban_column::Entity::find()
        .select_only()
        .column(kanban_column::Column::Uuid)
        .filter(kanban_column::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn task_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    task::Entity::find()
        .select_only()
        .column(task::Column::Id)
        .filter(task::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn task_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    task::Entity::find()
        .select_only()
        .column(task::Column::Uuid)
        .filter(task::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn source_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    ticket_source::Entity::find()
        .select_only()
        .column(ticket_source::Column::Id)
        .filter(ticket_source::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn source_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    ticket_source::Entity::find()
        .select_only()
        .column(ticket_source::Column::Uuid)
        .filter(ticket_source::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::project::{CreateProject, Project};

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn project_ids_round_trip() {
        let db = setup_db().await;

        let project_id = Uuid::new_v4();
        let project = Project::create(
            &db,
            &CreateProject {
                name: "Operations".to_string(),
                description: None,
            },
            project_id,
        )
        .await
        .unwrap();
        assert_eq!(project.id, project_id);

        let row_id = project_id_by_uuid(&db, project_id)
            .await
            .unwrap()
            .expect("project row id");
        assert_eq!(
            project_uuid_by_id(&db, row_id).await.unwrap(),
            Some(project_id)
        );
    }

    #[tokio::test]
    async fn unknown_uuid_resolves_to_none() {
        let db = setup_db().await;
        assert_eq!(
            project_id_by_uuid(&db, Uuid::new_v4()).await.unwrap(),
            None
        );
        assert_eq!(task_id_by_uuid(&db, Uuid::new_v4()).await.unwrap(), None);
    }
}
