use std::{sync::Arc, time::Duration};

use db::DBService;
use services::services::{
    categories::CategoryResolver,
    config::{load_config_from_file, save_config_to_file, Config},
    ingest::TicketIngest,
    kanban::KanbanService,
    tracker::TrackerClient,
};
use tokio::sync::RwLock;
use utils::assets::config_path;

pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    db: DBService,
    config: Arc<RwLock<Config>>,
    resolver: CategoryResolver,
    tracker: TrackerClient,
    ingest: TicketIngest,
    kanban: KanbanService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let config_path = config_path();
        let config = load_config_from_file(&config_path).await;
        save_config_to_file(&config, &config_path).await?;
        let db = DBService::new().await?;
        Ok(Self::with_parts(db, config))
    }

    pub fn with_parts(db: DBService, config: Config) -> Self {
        let resolver = CategoryResolver::new(
            db.clone(),
            Duration::from_secs(config.category_cache_ttl_secs),
        );
        let tracker = TrackerClient::new(Duration::from_secs(
            config.tracker_request_timeout_secs,
        ));
        let ingest = TicketIngest::new(db.clone());
        let kanban = KanbanService::new(db.clone());
        Self {
            db,
            config: Arc::new(RwLock::new(config)),
            resolver,
            tracker,
            ingest,
            kanban,
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.config
    }

    pub fn resolver(&self) -> &CategoryResolver {
        &self.resolver
    }

    pub fn tracker(&self) -> &TrackerClient {
        &self.tracker
    }

    pub fn ingest(&self) -> &TicketIngest {
        &self.ingest
    }

    pub fn kanban(&self) -> &KanbanService {
        &self.kanban
    }
}
