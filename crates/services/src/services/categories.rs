use std::{sync::Arc, time::Duration};

use db::{
    models::{
        category::{Category, CategoryOption, CategoryWithOptions},
        task::CategorySelection,
    },
    DBService, DbErr,
};
use moka::future::Cache;
use serde::Serialize;
use uuid::Uuid;

/// Human-readable form of a task's category selection.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionLabel {
    pub category: String,
    pub option: String,
}

/// Read-through cache over a project's active categories. Mutation routes
/// must call [`CategoryResolver::invalidate`] after any category or option
/// write, so reads within the TTL window stay coherent.
#[derive(Clone)]
pub struct CategoryResolver {
    db: DBService,
    cache: Cache<Uuid, Arc<Vec<CategoryWithOptions>>>,
}

impl CategoryResolver {
    pub fn new(db: DBService, ttl: Duration) -> Self {
        let cache = Cache::builder().time_to_live(ttl).build();
        Self { db, cache }
    }

    /// Active categories of the project with their active options, options
    /// sorted by sort_order. Unknown project resolves to an empty list.
    pub async fn resolve(
        &self,
        project_id: Uuid,
    ) -> Result<Arc<Vec<CategoryWithOptions>>, DbErr> {
        if let Some(cached) = self.cache.get(&project_id).await {
            return Ok(cached);
        }
        let categories =
            Arc::new(Category::find_active_with_options(&self.db.conn, project_id).await?);
        self.cache.insert(project_id, categories.clone()).await;
        Ok(categories)
    }

    pub async fn invalidate(&self, project_id: Uuid) {
        self.cache.invalidate(&project_id).await;
    }

    pub async fn category_name(&self, id: Uuid) -> Result<Option<String>, DbErr> {
        Category::name_by_uuid(&self.db.conn, id).await
    }

    pub async fn option_name(&self, id: Uuid) -> Result<Option<String>, DbErr> {
        CategoryOption::name_by_uuid(&self.db.conn, id).await
    }

    /// Maps selections to display names. A selection whose category or
    /// option no longer exists falls back to the raw uuid rather than being
    /// dropped.
    pub async fn selection_labels(
        &self,
        selections: &[CategorySelection],
    ) -> Result<Vec<SelectionLabel>, DbErr> {
        let mut labels = Vec::with_capacity(selections.len());
        for selection in selections {
            let category = self
                .category_name(selection.category_id)
                .await?
                .unwrap_or_else(|| selection.category_id.to_string());
            let option = self
                .option_name(selection.option_id)
                .await?
                .unwrap_or_else(|| selection.option_id.to_string());
            labels.push(SelectionLabel { category, option });
        }
        Ok(labels)
    }
}
