pub mod category;
pub mod ids;
pub mod kanban_column;
pub mod master_mapping;
pub mod project;
pub mod task;
pub mod ticket_source;
pub mod timeline_entry;
pub mod tracker_config;
pub mod uploaded_ticket;
