use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    entities::{category, category_option},
    models::ids,
};

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Category not found")]
    CategoryNotFound,
    #[error("Option not found")]
    OptionNotFound,
    #[error("Project not found")]
    ProjectNotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryOption {
    pub id: Uuid,
    pub category_id: Uuid,
    pub option_name: String,
    pub option_value: String,
    pub sort_order: i32,
    pub is_active: bool,
}

/// A category joined with its active options, ready for task forms and
/// timeline display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWithOptions {
    #[serde(flatten)]
    pub category: Category,
    pub options: Vec<CategoryOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryOption {
    pub option_name: String,
    pub option_value: String,
    pub sort_order: Option<i32>,
}

impl Category {
    fn from_model(model: category::Model, project_uuid: Uuid) -> Self {
        Self {
            id: model.uuid,
            project_id: project_uuid,
            name: model.name,
            is_active: model.is_active,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = category::Entity::find()
            .filter(category::Column::Uuid.eq(id))
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

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
        data: &CreateCategory,
        category_id: Uuid,
    ) -> Result<Self, CategoryError> {
        let project_row_id = ids::project_id_by_uuid(db, project_id)
            .await?
            .ok_or(CategoryError::ProjectNotFound)?;
        let now = Utc::now();
        let active = category::ActiveModel {
            uuid: Set(category_id),
            project_id: Set(project_row_id),
            name: Set(data.name.clone()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model, project_id))
    }

    /// Logical delete. Referenced categories are never physically removed.
    pub async fn deactivate<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), CategoryError> {
        let record = category::Entity::find()
            .filter(category::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(CategoryError::CategoryNotFound)?;
        let mut active: category::ActiveModel = record.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        active.update(db).await?;
        Ok(())
    }

    /// Active categories of a project, each with its active options sorted
    /// by sort_order. An unknown project yields an empty list.
    pub async fn find_active_with_options<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
    ) -> Result<Vec<CategoryWithOptions>, DbErr> {
        let project_row_id = match ids::project_id_by_uuid(db, project_id).await? {
            Some(id) => id,
            None => return Ok(Vec::new()),
        };

        let categories = category::Entity::find()
            .filter(category::Column::ProjectId.eq(project_row_id))
            .filter(category::Column::IsActive.eq(true))
            .order_by_asc(category::Column::Name)
            .all(db)
            .await?;

        let mut resolved = Vec::with_capacity(categories.len());
        for model in categories {
            let options = CategoryOption::find_active_by_category_row_id(db, model.id, model.uuid)
                .await?;
            resolved.push(CategoryWithOptions {
                category: Self::from_model(model, project_id),
                options,
            });
        }
        Ok(resolved)
    }

    /// Display-time reverse lookup. Unknown ids resolve to None so callers
    /// can fall back to the raw identifier.
    pub async fn name_by_uuid<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<String>, DbErr> {
        category::Entity::find()
            .select_only()
            .column(category::Column::Name)
            .filter(category::Column::Uuid.eq(id))
            .into_tuple()
            .one(db)
            .await
    }
}

impl CategoryOption {
    fn from_model(model: category_option::Model, category_uuid: Uuid) -> Self {
        Self {
            id: model.uuid,
            category_id: category_uuid,
            option_name: model.option_name,
            option_value: model.option_value,
            sort_order: model.sort_order,
            is_active: model.is_active,
        }
    }

    async fn find_active_by_category_row_id<C: ConnectionTrait>(
        db: &C,
        category_row_id: i64,
        category_uuid: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let records = category_option::Entity::find()
            .filter(category_option::Column::CategoryId.eq(category_row_id))
            .filter(category_option::Column::IsActive.eq(true))
            .order_by_asc(category_option::Column::SortOrder)
            .all(db)
            .await?;
        Ok(records
            .into_iter()
            .map(|model| Self::from_model(model, category_uuid))
            .collect())
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        category_id: Uuid,
        data: &CreateCategoryOption,
        option_id: Uuid,
    ) -> Result<Self, CategoryError> {
        let category_row_id = ids::category_id_by_uuid(db, category_id)
            .await?
            .ok_or(CategoryError::CategoryNotFound)?;
        let now = Utc::now();
        let active = category_option::ActiveModel {
            uuid: Set(option_id),
            category_id: Set(category_row_id),
            option_name: Set(data.option_name.clone()),
            option_value: Set(data.option_value.clone()),
            sort_order: Set(data.sort_order.unwrap_or(0)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model, category_id))
    }

    pub async fn deactivate<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), CategoryError> {
        let record = category_option::Entity::find()
            .filter(category_option::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(CategoryError::OptionNotFound)?;
        let mut active: category_option::ActiveModel = record.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        active.update(db).await?;
        Ok(())
    }

    /// Category uuid owning this option, used by routes to invalidate the
    /// right resolver cache entry.
    pub async fn category_uuid<C: ConnectionTrait>(
        db: &C,
        option_id: Uuid,
    ) -> Result<Option<Uuid>, DbErr> {
        let category_row_id: Option<i64> = category_option::Entity::find()
            .select_only()
            .column(category_option::Column::CategoryId)
            .filter(category_option::Column::Uuid.eq(option_id))
            .into_tuple()
            .one(db)
            .await?;
        let Some(category_row_id) = category_row_id else {
            return Ok(None);
        };
        category::Entity::find()
            .select_only()
            .column(category::Column::Uuid)
            .filter(category::Column::Id.eq(category_row_id))
            .into_tuple()
            .one(db)
            .await
    }

    pub async fn name_by_uuid<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<String>, DbErr> {
        category_option::Entity::find()
            .select_only()
            .column(category_option::Column::OptionName)
            .filter(category_option::Column::Uuid.eq(id))
            .into_tuple()
            .one(db)
            .await
    }
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

    async fn seed_project(db: &sea_orm::DatabaseConnection) -> Uuid {
        let project_id = Uuid::new_v4();
        Project::create(
            db,
            &CreateProject {
                name: "Ops".to_string(),
                description: None,
            },
            project_id,
        )
        .await
        .unwrap();
        project_id
    }

    #[tokio::test]
    async fn resolver_returns_only_active_rows_sorted() {
        let db = setup_db().await;
        let project_id = seed_project(&db).await;

        let category = Category::create(
            &db,
            project_id,
            &CreateCategory {
                name: "Severity".to_string(),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let low = CategoryOption::create(
            &db,
            category.id,
            &CreateCategoryOption {
                option_name: "Low".to_string(),
                option_value: "low".to_string(),
                sort_order: Some(2),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        let high = CategoryOption::create(
            &db,
            category.id,
            &CreateCategoryOption {
                option_name: "High".to_string(),
                option_value: "high".to_string(),
                sort_order: Some(1),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        let retired = CategoryOption::create(
            &db,
            category.id,
            &CreateCategoryOption {
                option_name: "Retired".to_string(),
                option_value: "retired".to_string(),
                sort_order: Some(0),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        CategoryOption::deactivate(&db, retired.id).await.unwrap();

        let resolved = Category::find_active_with_options(&db, project_id)
            .await
            .unwrap();
        assert_eq!(resolved.len(), 1);
        let options = &resolved[0].options;
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].id, high.id);
        assert_eq!(options[1].id, low.id);
        assert!(options.iter().all(|o| o.is_active));
    }

    #[tokio::test]
    async fn deactivated_category_disappears_from_resolution() {
        let db = setup_db().await;
        let project_id = seed_project(&db).await;

        let category = Category::create(
            &db,
            project_id,
            &CreateCategory {
                name: "Region".to_string(),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        Category::deactivate(&db, category.id).await.unwrap();

        let resolved = Category::find_active_with_options(&db, project_id)
            .await
            .unwrap();
        assert!(resolved.is_empty());

        // Reverse lookup still resolves the name for historical records.
        assert_eq!(
            Category::name_by_uuid(&db, category.id).await.unwrap(),
            Some("Region".to_string())
        );
    }

    #[tokio::test]
    async fn unknown_project_resolves_to_empty_list() {
        let db = setup_db().await;
        let resolved = Category::find_active_with_options(&db, Uuid::new_v4())
            .await
            .unwrap();
        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn category_with_zero_options_yields_empty_vec() {
        let db = setup_db().await;
        let project_id = seed_project(&db).await;
        Category::create(
            &db,
            project_id,
            &CreateCategory {
                name: "Module".to_string(),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let resolved = Category::find_active_with_options(&db, project_id)
            .await
            .unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].options.is_empty());
    }
}
