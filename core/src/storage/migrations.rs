//! Database migrations for Mailweave

use crate::error::{MailweaveError, MailweaveResult};
use rusqlite::{Connection, Result as SqliteResult};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Migration manager for database schema updates
pub struct MigrationManager {
    connection: Arc<Mutex<Connection>>,
}

impl MigrationManager {
    /// Create a new migration manager
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    /// Run all pending migrations
    pub async fn run_migrations(&mut self) -> MailweaveResult<()> {
        self.create_migrations_table().await?;

        for migration in self.get_migrations() {
            if !self.is_migration_applied(migration.name()).await? {
                tracing::info!("Applying migration: {}", migration.name());
                let mut conn = self.connection.lock().await;
                let tx = conn.transaction()?;
                migration.apply(&tx).map_err(|e| {
                    MailweaveError::DatabaseMigration(format!("{}: {}", migration.name(), e))
                })?;
                tx.execute("INSERT INTO migrations (name) VALUES (?)", [migration.name()])?;
                tx.commit()?;
                tracing::info!("Migration applied successfully: {}", migration.name());
            }
        }

        Ok(())
    }

    /// Names of migrations already applied, in application order
    pub async fn applied_migrations(&self) -> MailweaveResult<Vec<String>> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare("SELECT name FROM migrations ORDER BY id")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<SqliteResult<Vec<String>>>()?;
        Ok(names)
    }

    /// Create the migrations tracking table
    async fn create_migrations_table(&mut self) -> SqliteResult<()> {
        let conn = self.connection.lock().await;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS migrations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(())
    }

    /// Check if a migration has been applied
    async fn is_migration_applied(&self, migration_name: &str) -> SqliteResult<bool> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare("SELECT COUNT(*) FROM migrations WHERE name = ?")?;
        let count: i64 = stmt.query_row([migration_name], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Get all available migrations
    fn get_migrations(&self) -> Vec<Box<dyn Migration>> {
        vec![
            Box::new(CreateEmailsTable),
            Box::new(CreateThreadsTable),
            Box::new(CreateUsersTable),
            Box::new(CreateMessagesTable),
            Box::new(AddIndexes),
        ]
    }
}

/// Trait for database migrations
trait Migration: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, connection: &Connection) -> SqliteResult<()>;
}

/// Migration: Create emails table
struct CreateEmailsTable;

impl Migration for CreateEmailsTable {
    fn name(&self) -> &str {
        "create_emails_table"
    }

    fn apply(&self, connection: &Connection) -> SqliteResult<()> {
        connection.execute(
            "CREATE TABLE emails (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                universal_message_id TEXT NOT NULL,
                in_reply_to TEXT,
                subject TEXT NOT NULL,
                from_email TEXT NOT NULL,
                from_name TEXT,
                body TEXT NOT NULL,
                date TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

/// Migration: Create threads table
struct CreateThreadsTable;

impl Migration for CreateThreadsTable {
    fn name(&self) -> &str {
        "create_threads_table"
    }

    fn apply(&self, connection: &Connection) -> SqliteResult<()> {
        connection.execute(
            "CREATE TABLE threads (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(())
    }
}

/// Migration: Create users table
struct CreateUsersTable;

impl Migration for CreateUsersTable {
    fn name(&self) -> &str {
        "create_users_table"
    }

    fn apply(&self, connection: &Connection) -> SqliteResult<()> {
        connection.execute(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                display_name TEXT,
                email TEXT NOT NULL UNIQUE
            )",
            [],
        )?;
        Ok(())
    }
}

/// Migration: Create messages table
struct CreateMessagesTable;

impl Migration for CreateMessagesTable {
    fn name(&self) -> &str {
        "create_messages_table"
    }

    fn apply(&self, connection: &Connection) -> SqliteResult<()> {
        connection.execute(
            "CREATE TABLE messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                thread_id INTEGER NOT NULL REFERENCES threads(id),
                sender_id INTEGER REFERENCES users(id),
                email_id INTEGER NOT NULL REFERENCES emails(id),
                date TEXT NOT NULL,
                body TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

/// Migration: Add lookup indexes
struct AddIndexes;

impl Migration for AddIndexes {
    fn name(&self) -> &str {
        "add_indexes"
    }

    fn apply(&self, connection: &Connection) -> SqliteResult<()> {
        connection.execute_batch(
            "CREATE INDEX idx_emails_universal_message_id ON emails(universal_message_id);
             CREATE INDEX idx_messages_thread_id ON messages(thread_id);
             CREATE INDEX idx_messages_email_id ON messages(email_id);",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_apply_once() {
        let connection = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let mut manager = MigrationManager::new(connection.clone());

        manager.run_migrations().await.unwrap();
        manager.run_migrations().await.unwrap();

        let applied = manager.applied_migrations().await.unwrap();
        assert_eq!(
            applied,
            vec![
                "create_emails_table",
                "create_threads_table",
                "create_users_table",
                "create_messages_table",
                "add_indexes",
            ]
        );

        let conn = connection.lock().await;
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('emails', 'threads', 'users', 'messages')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }
}
