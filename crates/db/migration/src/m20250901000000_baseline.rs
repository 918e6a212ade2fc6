use sea_orm_migration::{prelude::*, sea_orm::DatabaseBackend};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Projects::Table)
                    .col(pk_id_col(manager, Projects::Id))
                    .col(uuid_col(Projects::Uuid))
                    .col(ColumnDef::new(Projects::Name).string().not_null())
                    .col(ColumnDef::new(Projects::Description).text())
                    .col(timestamp_col(Projects::CreatedAt))
                    .col(timestamp_col(Projects::UpdatedAt))
                    .to_owned(),
            )
            .await?;
        unique_uuid_index(manager, "idx_projects_uuid", Projects::Table, Projects::Uuid).await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Categories::Table)
                    .col(pk_id_col(manager, Categories::Id))
                    .col(uuid_col(Categories::Uuid))
                    .col(fk_id_col(manager, Categories::ProjectId))
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(
                        ColumnDef::new(Categories::IsActive)
                            .boolean()
                            .not_null()
                            .default(Expr::val(true)),
                    )
                    .col(timestamp_col(Categories::CreatedAt))
                    .col(timestamp_col(Categories::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_project_id")
                            .from(Categories::Table, Categories::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        unique_uuid_index(manager, "idx_categories_uuid", Categories::Table, Categories::Uuid)
            .await?;
        plain_index(
            manager,
            "idx_categories_project_id",
            Categories::Table,
            Categories::ProjectId,
        )
        .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(CategoryOptions::Table)
                    .col(pk_id_col(manager, CategoryOptions::Id))
                    .col(uuid_col(CategoryOptions::Uuid))
                    .col(fk_id_col(manager, CategoryOptions::CategoryId))
                    .col(
                        ColumnDef::new(CategoryOptions::OptionName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CategoryOptions::OptionValue)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CategoryOptions::SortOrder)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(
                        ColumnDef::new(CategoryOptions::IsActive)
                            .boolean()
                            .not_null()
                            .default(Expr::val(true)),
                    )
                    .col(timestamp_col(CategoryOptions::CreatedAt))
                    .col(timestamp_col(CategoryOptions::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_options_category_id")
                            .from(CategoryOptions::Table, CategoryOptions::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        unique_uuid_index(
            manager,
            "idx_category_options_uuid",
            CategoryOptions::Table,
            CategoryOptions::Uuid,
        )
        .await?;
        plain_index(
            manager,
            "idx_category_options_category_id",
            CategoryOptions::Table,
            CategoryOptions::CategoryId,
        )
        .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(KanbanColumns::Table)
                    .col(pk_id_col(manager, KanbanColumns::Id))
                    .col(uuid_col(KanbanColumns::Uuid))
                    .col(fk_id_col(manager, KanbanColumns::ProjectId))
                    .col(ColumnDef::new(KanbanColumns::Name).string().not_null())
                    .col(
                        ColumnDef::new(KanbanColumns::SortOrder)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(timestamp_col(KanbanColumns::CreatedAt))
                    .col(timestamp_col(KanbanColumns::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_kanban_columns_project_id")
                            .from(KanbanColumns::Table, KanbanColumns::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        unique_uuid_index(
            manager,
            "idx_kanban_columns_uuid",
            KanbanColumns::Table,
            KanbanColumns::Uuid,
        )
        .await?;
        plain_index(
            manager,
            "idx_kanban_columns_project_id",
            KanbanColumns::Table,
            KanbanColumns::ProjectId,
        )
        .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Tasks::Table)
                    .col(pk_id_col(manager, Tasks::Id))
                    .col(uuid_col(Tasks::Uuid))
                    .col(fk_id_col(manager, Tasks::ColumnId))
                    .col(ColumnDef::new(Tasks::Title).string().not_null())
                    .col(ColumnDef::new(Tasks::Description).text())
                    .col(ColumnDef::new(Tasks::AssignedTo).string())
                    .col(ColumnDef::new(Tasks::DueDate).timestamp())
                    .col(
                        ColumnDef::new(Tasks::SortOrder)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(timestamp_col(Tasks::CreatedAt))
                    .col(timestamp_col(Tasks::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_column_id")
                            .from(Tasks::Table, Tasks::ColumnId)
                            .to(KanbanColumns::Table, KanbanColumns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        unique_uuid_index(manager, "idx_tasks_uuid", Tasks::Table, Tasks::Uuid).await?;
        plain_index(manager, "idx_tasks_column_id", Tasks::Table, Tasks::ColumnId).await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(TaskCategories::Table)
                    .col(pk_id_col(manager, TaskCategories::Id))
                    .col(fk_id_col(manager, TaskCategories::TaskId))
                    .col(uuid_col(TaskCategories::CategoryId))
                    .col(uuid_col(TaskCategories::OptionId))
                    .col(timestamp_col(TaskCategories::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_categories_task_id")
                            .from(TaskCategories::Table, TaskCategories::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        plain_index(
            manager,
            "idx_task_categories_task_id",
            TaskCategories::Table,
            TaskCategories::TaskId,
        )
        .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(TimelineEntries::Table)
                    .col(pk_id_col(manager, TimelineEntries::Id))
                    .col(uuid_col(TimelineEntries::Uuid))
                    .col(fk_id_col(manager, TimelineEntries::TaskId))
                    .col(
                        ColumnDef::new(TimelineEntries::Action)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TimelineEntries::UserEmail).string().not_null())
                    .col(ColumnDef::new(TimelineEntries::Details).json().not_null())
                    .col(timestamp_col(TimelineEntries::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_timeline_entries_task_id")
                            .from(TimelineEntries::Table, TimelineEntries::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        unique_uuid_index(
            manager,
            "idx_timeline_entries_uuid",
            TimelineEntries::Table,
            TimelineEntries::Uuid,
        )
        .await?;
        plain_index(
            manager,
            "idx_timeline_entries_task_id",
            TimelineEntries::Table,
            TimelineEntries::TaskId,
        )
        .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(TicketSources::Table)
                    .col(pk_id_col(manager, TicketSources::Id))
                    .col(uuid_col(TicketSources::Uuid))
                    .col(ColumnDef::new(TicketSources::Name).string().not_null())
                    .col(timestamp_col(TicketSources::CreatedAt))
                    .to_owned(),
            )
            .await?;
        unique_uuid_index(
            manager,
            "idx_ticket_sources_uuid",
            TicketSources::Table,
            TicketSources::Uuid,
        )
        .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(UploadedTickets::Table)
                    .col(pk_id_col(manager, UploadedTickets::Id))
                    .col(uuid_col(UploadedTickets::Uuid))
                    .col(fk_id_col(manager, UploadedTickets::SourceId))
                    .col(
                        ColumnDef::new(UploadedTickets::IncidentId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UploadedTickets::Priority).string())
                    .col(ColumnDef::new(UploadedTickets::Region).string())
                    .col(ColumnDef::new(UploadedTickets::AssignedTo).string())
                    .col(ColumnDef::new(UploadedTickets::MappedUserEmail).string())
                    .col(ColumnDef::new(UploadedTickets::Status).string())
                    .col(ColumnDef::new(UploadedTickets::OpenedAt).timestamp())
                    .col(ColumnDef::new(UploadedTickets::ResolvedAt).timestamp())
                    .col(ColumnDef::new(UploadedTickets::ClosedAt).timestamp())
                    .col(ColumnDef::new(UploadedTickets::ReassignmentCount).big_integer())
                    .col(ColumnDef::new(UploadedTickets::ReopenCount).big_integer())
                    .col(timestamp_col(UploadedTickets::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_uploaded_tickets_source_id")
                            .from(UploadedTickets::Table, UploadedTickets::SourceId)
                            .to(TicketSources::Table, TicketSources::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        unique_uuid_index(
            manager,
            "idx_uploaded_tickets_uuid",
            UploadedTickets::Table,
            UploadedTickets::Uuid,
        )
        .await?;
        plain_index(
            manager,
            "idx_uploaded_tickets_source_id",
            UploadedTickets::Table,
            UploadedTickets::SourceId,
        )
        .await?;
        plain_index(
            manager,
            "idx_uploaded_tickets_incident_id",
            UploadedTickets::Table,
            UploadedTickets::IncidentId,
        )
        .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(MasterMappings::Table)
                    .col(pk_id_col(manager, MasterMappings::Id))
                    .col(uuid_col(MasterMappings::Uuid))
                    .col(fk_id_col(manager, MasterMappings::SourceId))
                    .col(
                        ColumnDef::new(MasterMappings::ExternalIdentityValue)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MasterMappings::InternalUserEmail)
                            .string()
                            .not_null(),
                    )
                    .col(timestamp_col(MasterMappings::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_master_mappings_source_id")
                            .from(MasterMappings::Table, MasterMappings::SourceId)
                            .to(TicketSources::Table, TicketSources::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        unique_uuid_index(
            manager,
            "idx_master_mappings_uuid",
            MasterMappings::Table,
            MasterMappings::Uuid,
        )
        .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_master_mappings_source_value_unique")
                    .table(MasterMappings::Table)
                    .col(MasterMappings::SourceId)
                    .col(MasterMappings::ExternalIdentityValue)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(TrackerConfigs::Table)
                    .col(pk_id_col(manager, TrackerConfigs::Id))
                    .col(uuid_col(TrackerConfigs::Uuid))
                    .col(
                        ColumnDef::new(TrackerConfigs::UserEmail)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TrackerConfigs::BaseUrl).string().not_null())
                    .col(
                        ColumnDef::new(TrackerConfigs::AccountEmail)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TrackerConfigs::ApiToken).string().not_null())
                    .col(timestamp_col(TrackerConfigs::CreatedAt))
                    .col(timestamp_col(TrackerConfigs::UpdatedAt))
                    .to_owned(),
            )
            .await?;
        unique_uuid_index(
            manager,
            "idx_tracker_configs_uuid",
            TrackerConfigs::Table,
            TrackerConfigs::Uuid,
        )
        .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tracker_configs_user_email_unique")
                    .table(TrackerConfigs::Table)
                    .col(TrackerConfigs::UserEmail)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TrackerConfigs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MasterMappings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UploadedTickets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TicketSources::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TimelineEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TaskCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(KanbanColumns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CategoryOptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn fk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().to_owned()
}

fn uuid_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

async fn unique_uuid_index<T: Iden + 'static, C: Iden + 'static>(
    manager: &SchemaManager<'_>,
    name: &str,
    table: T,
    col: C,
) -> Result<(), DbErr> {
    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name(name)
                .table(table)
                .col(col)
                .unique()
                .to_owned(),
        )
        .await
}

async fn plain_index<T: Iden + 'static, C: Iden + 'static>(
    manager: &SchemaManager<'_>,
    name: &str,
    table: T,
    col: C,
) -> Result<(), DbErr> {
    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name(name)
                .table(table)
                .col(col)
                .to_owned(),
        )
        .await
}

#[derive(Iden)]
enum Projects {
    Table,
    Id,
    Uuid,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Uuid,
    ProjectId,
    Name,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CategoryOptions {
    Table,
    Id,
    Uuid,
    CategoryId,
    OptionName,
    OptionValue,
    SortOrder,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum KanbanColumns {
    Table,
    Id,
    Uuid,
    ProjectId,
    Name,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Tasks {
    Table,
    Id,
    Uuid,
    ColumnId,
    Title,
    Description,
    AssignedTo,
    DueDate,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum TaskCategories {
    Table,
    Id,
    TaskId,
    CategoryId,
    OptionId,
    CreatedAt,
}

#[derive(Iden)]
enum TimelineEntries {
    Table,
    Id,
    Uuid,
    TaskId,
    Action,
    UserEmail,
    Details,
    CreatedAt,
}

#[derive(Iden)]
enum TicketSources {
    Table,
    Id,
    Uuid,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum UploadedTickets {
    Table,
    Id,
    Uuid,
    SourceId,
    IncidentId,
    Priority,
    Region,
    AssignedTo,
    MappedUserEmail,
    Status,
    OpenedAt,
    ResolvedAt,
    ClosedAt,
    ReassignmentCount,
    ReopenCount,
    CreatedAt,
}

#[derive(Iden)]
enum MasterMappings {
    Table,
    Id,
    Uuid,
    SourceId,
    ExternalIdentityValue,
    InternalUserEmail,
    CreatedAt,
}

#[derive(Iden)]
enum TrackerConfigs {
    Table,
    Id,
    Uuid,
    UserEmail,
    BaseUrl,
    AccountEmail,
    ApiToken,
    CreatedAt,
    UpdatedAt,
}
