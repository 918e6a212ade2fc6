use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use utils::assets::asset_dir;

pub mod entities;
pub mod models;
pub mod types;

pub use sea_orm::{ConnectionTrait, DbErr, TransactionTrait};

const DB_URL_ENV: &str = "ALIGNZO_DB_URL";

#[derive(Clone)]
pub struct DBService {
    pub conn: DatabaseConnection,
}

impl DBService {
    /// Connects to the configured database and brings the schema up to date.
    pub async fn new() -> Result<DBService, DbErr> {
        let database_url = match std::env::var(DB_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => url,
            _ => format!(
                "sqlite://{}?mode=rwc",
                asset_dir().join("db.sqlite").to_string_lossy()
            ),
        };
        Self::new_with_url(&database_url).await
    }

    pub async fn new_with_url(database_url: &str) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url);
        options.sqlx_logging(false);
        let conn = Database::connect(options).await?;
        db_migration::Migrator::up(&conn, None).await?;
        Ok(DBService { conn })
    }
}
