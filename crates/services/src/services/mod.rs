pub mod categories;
pub mod config;
pub mod ingest;
pub mod kanban;
pub mod tracker;
