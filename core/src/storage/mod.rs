//! Storage layer for Mailweave

pub mod database;
pub mod migrations;

pub use database::Database;
pub use migrations::MigrationManager;
