use sea_orm::entity::prelude::*;

// Date columns are naive timestamps: the CSV export format carries no
// offset, so values are stored exactly as parsed.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "uploaded_tickets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    pub source_id: i64,
    pub incident_id: String,
    pub priority: Option<String>,
    pub region: Option<String>,
    pub assigned_to: Option<String>,
    pub mapped_user_email: Option<String>,
    pub status: Option<String>,
    pub opened_at: Option<DateTime>,
    pub resolved_at: Option<DateTime>,
    pub closed_at: Option<DateTime>,
    pub reassignment_count: Option<i64>,
    pub reopen_count: Option<i64>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
