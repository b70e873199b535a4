//! SQLite-backed repositories for Mailweave

use crate::email::{Email, EmailAddress, EmailId, MessageKey};
use crate::error::MailweaveResult;
use crate::message::{Message, MessageId};
use crate::repository::{EmailRepository, MessageRepository, ThreadRepository, UserRepository};
use crate::thread::{Thread, ThreadId};
use crate::user::{User, UserId};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::path::PathBuf;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::Mutex;

/// Database connection wrapper
///
/// Clones share one connection, which is closed when the last clone is dropped.
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) a database file
    pub async fn new(database_path: PathBuf) -> MailweaveResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let connection = Connection::open(database_path)?;

        // WAL keeps readers unblocked while an import writes
        connection.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        connection.pragma_update(None, "synchronous", "NORMAL")?;

        Self::from_connection(connection)
    }

    /// Open a private in-memory database
    pub async fn in_memory() -> MailweaveResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> MailweaveResult<Self> {
        connection.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Initialize the database (run migrations)
    pub async fn initialize(&self) -> MailweaveResult<()> {
        let mut migration_manager =
            crate::storage::migrations::MigrationManager::new(self.connection.clone());

        migration_manager.run_migrations().await?;
        Ok(())
    }

    fn row_to_email(row: &Row) -> SqliteResult<Email> {
        let in_reply_to: Option<String> = row.get(2)?;
        let from_email: String = row.get(4)?;
        let from_name: Option<String> = row.get(5)?;

        Ok(Email {
            id: Some(EmailId(row.get(0)?)),
            universal_message_id: MessageKey::new(row.get::<_, String>(1)?),
            in_reply_to: in_reply_to.map(MessageKey::new),
            subject: row.get(3)?,
            from: EmailAddress {
                name: from_name,
                email: from_email,
            },
            body: row.get(6)?,
            date: timestamp_column(row, 7)?,
        })
    }

    fn row_to_thread(row: &Row) -> SqliteResult<Thread> {
        let id: i64 = row.get(0)?;
        let name: String = row.get(1)?;
        Ok(Thread::from_parts(ThreadId(id), name))
    }

    fn row_to_message(row: &Row) -> SqliteResult<Message> {
        let sender_id: Option<i64> = row.get(2)?;

        Ok(Message {
            id: Some(MessageId(row.get(0)?)),
            thread_id: ThreadId(row.get(1)?),
            sender_id: sender_id.map(UserId),
            email_id: EmailId(row.get(3)?),
            date: timestamp_column(row, 4)?,
            body: row.get(5)?,
        })
    }

    fn row_to_user(row: &Row) -> SqliteResult<User> {
        Ok(User {
            id: Some(UserId(row.get(0)?)),
            display_name: row.get(1)?,
            email: row.get(2)?,
        })
    }
}

/// Dates are stored as RFC 3339 text, keeping the sender's offset and sub-second part
fn timestamp_text(date: &OffsetDateTime) -> MailweaveResult<String> {
    Ok(date.format(&Rfc3339)?)
}

fn timestamp_column(row: &Row, idx: usize) -> SqliteResult<OffsetDateTime> {
    let text: String = row.get(idx)?;
    OffsetDateTime::parse(&text, &Rfc3339)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[async_trait::async_trait]
impl EmailRepository for Database {
    async fn persist(&self, emails: &mut [Email]) -> MailweaveResult<()> {
        let mut conn = self.connection.lock().await;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO emails
                     (universal_message_id, in_reply_to, subject, from_email, from_name, body, date)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )?;
            for email in emails.iter_mut() {
                let date = timestamp_text(&email.date)?;
                stmt.execute(params![
                    email.universal_message_id.as_str(),
                    email.in_reply_to.as_ref().map(MessageKey::as_str),
                    email.subject,
                    email.from.email,
                    email.from.name,
                    email.body,
                    date,
                ])?;
                email.id = Some(EmailId(tx.last_insert_rowid()));
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn find_all(&self) -> MailweaveResult<Vec<Email>> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, universal_message_id, in_reply_to, subject, from_email, from_name,
                    body, date
             FROM emails ORDER BY id",
        )?;
        let emails = stmt
            .query_map([], Self::row_to_email)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(emails)
    }
}

#[async_trait::async_trait]
impl ThreadRepository for Database {
    async fn persist(&self, threads: &mut [Thread]) -> MailweaveResult<()> {
        let mut conn = self.connection.lock().await;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached("INSERT INTO threads (name) VALUES (?)")?;
            for thread in threads.iter_mut() {
                stmt.execute([thread.name()])?;
                thread.id = Some(ThreadId(tx.last_insert_rowid()));
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn find_all(&self) -> MailweaveResult<Vec<Thread>> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare("SELECT id, name FROM threads ORDER BY id")?;
        let threads = stmt
            .query_map([], Self::row_to_thread)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(threads)
    }
}

#[async_trait::async_trait]
impl MessageRepository for Database {
    async fn persist(&self, messages: &mut [Message]) -> MailweaveResult<()> {
        let mut conn = self.connection.lock().await;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO messages (thread_id, sender_id, email_id, date, body)
                 VALUES (?, ?, ?, ?, ?)",
            )?;
            for message in messages.iter_mut() {
                let date = timestamp_text(&message.date)?;
                stmt.execute(params![
                    message.thread_id.0,
                    message.sender_id.map(|id| id.0),
                    message.email_id.0,
                    date,
                    message.body,
                ])?;
                message.id = Some(MessageId(tx.last_insert_rowid()));
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn find_all(&self) -> MailweaveResult<Vec<Message>> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, thread_id, sender_id, email_id, date, body FROM messages ORDER BY id",
        )?;
        let messages = stmt
            .query_map([], Self::row_to_message)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(messages)
    }

    async fn find_thread_id_by_email_key(
        &self,
        key: &MessageKey,
    ) -> MailweaveResult<Option<ThreadId>> {
        let conn = self.connection.lock().await;
        let thread_id = conn
            .query_row(
                "SELECT m.thread_id FROM messages m
                 JOIN emails e ON e.id = m.email_id
                 WHERE e.universal_message_id = ?
                 ORDER BY m.id LIMIT 1",
                [key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(thread_id.map(ThreadId))
    }
}

#[async_trait::async_trait]
impl UserRepository for Database {
    async fn persist(&self, users: &mut [User]) -> MailweaveResult<()> {
        let mut conn = self.connection.lock().await;
        let tx = conn.transaction()?;
        {
            let mut stmt =
                tx.prepare_cached("INSERT INTO users (display_name, email) VALUES (?, ?)")?;
            for user in users.iter_mut() {
                stmt.execute(params![user.display_name, user.email])?;
                user.id = Some(UserId(tx.last_insert_rowid()));
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn find_all(&self) -> MailweaveResult<Vec<User>> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare("SELECT id, display_name, email FROM users ORDER BY id")?;
        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(users)
    }

    async fn find_by_email(&self, address: &str) -> MailweaveResult<Option<User>> {
        let conn = self.connection.lock().await;
        let user = conn
            .query_row(
                "SELECT id, display_name, email FROM users WHERE email = ?",
                [address],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn email(key: &str, parent: Option<&str>, seconds: i64) -> Email {
        let mut email = Email::new(
            key,
            format!("Subject {key}"),
            EmailAddress::new("alice@example.com").with_name("Alice"),
            OffsetDateTime::from_unix_timestamp(seconds).unwrap(),
        )
        .with_body("body");
        email.in_reply_to = parent.map(MessageKey::from);
        email
    }

    async fn database() -> Database {
        let database = Database::in_memory().await.unwrap();
        database.initialize().await.unwrap();
        database
    }

    #[tokio::test]
    async fn test_database_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");
        let database = Database::new(db_path.clone()).await.unwrap();
        database.initialize().await.unwrap();
        assert!(db_path.exists());
        drop(database);

        // Reopening an initialized file is a no-op migration run
        let database = Database::new(db_path).await.unwrap();
        database.initialize().await.unwrap();
    }

    #[tokio::test]
    async fn test_email_round_trip_assigns_ids() {
        let database = database().await;
        let mut emails = vec![email("<a>", None, 100), email("<b>", Some("<a>"), 200)];

        EmailRepository::persist(&database, &mut emails).await.unwrap();
        assert_eq!(emails[0].id, Some(EmailId(1)));
        assert_eq!(emails[1].id, Some(EmailId(2)));

        let stored = EmailRepository::find_all(&database).await.unwrap();
        assert_eq!(stored, emails);
    }

    #[tokio::test]
    async fn test_dates_keep_offset_and_fraction() {
        let database = database().await;
        let sent = OffsetDateTime::parse("2024-03-01T10:00:00.750+02:00", &Rfc3339).unwrap();
        let mut emails = vec![email("<a>", None, 0)];
        emails[0].date = sent;
        EmailRepository::persist(&database, &mut emails).await.unwrap();

        let stored = EmailRepository::find_all(&database).await.unwrap();
        assert_eq!(stored[0].date, sent);
        assert_eq!(stored[0].date.offset(), sent.offset());
        assert_eq!(stored[0].date.millisecond(), 750);
        assert_eq!(stored[0].date.hour(), 10);

        let mut threads = [Thread::from_top_level_email(&emails[0]).unwrap()];
        ThreadRepository::persist(&database, &mut threads).await.unwrap();
        let thread_id = threads[0].persisted_id().unwrap();
        let mut messages = vec![Message::from_email(None, thread_id, &emails[0]).unwrap()];
        MessageRepository::persist(&database, &mut messages).await.unwrap();

        let stored = MessageRepository::find_all(&database).await.unwrap();
        assert_eq!(stored[0].date.offset(), sent.offset());
        assert_eq!(stored[0].date.nanosecond(), 750_000_000);
    }

    #[tokio::test]
    async fn test_unrepresentable_offset_is_rejected() {
        let database = database().await;
        let offset = time::UtcOffset::from_hms(1, 0, 30).unwrap();
        let mut emails = vec![email("<a>", None, 100)];
        emails[0].date = emails[0].date.to_offset(offset);

        let err = EmailRepository::persist(&database, &mut emails).await.unwrap_err();
        assert!(matches!(err, crate::error::MailweaveError::Timestamp(_)));
        assert!(EmailRepository::find_all(&database).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_thread_and_message_persistence() {
        let database = database().await;
        let mut emails = vec![email("<a>", None, 100)];
        EmailRepository::persist(&database, &mut emails).await.unwrap();

        let mut threads = [Thread::from_top_level_email(&emails[0]).unwrap()];
        ThreadRepository::persist(&database, &mut threads).await.unwrap();
        let thread_id = threads[0].persisted_id().unwrap();

        let mut messages = vec![Message::from_email(None, thread_id, &emails[0]).unwrap()];
        MessageRepository::persist(&database, &mut messages).await.unwrap();
        assert!(messages[0].id.is_some());

        let stored = MessageRepository::find_all(&database).await.unwrap();
        assert_eq!(stored, messages);
        assert_eq!(ThreadRepository::find_all(&database).await.unwrap(), threads);
    }

    #[tokio::test]
    async fn test_message_requires_existing_thread() {
        let database = database().await;
        let mut emails = vec![email("<a>", None, 100)];
        EmailRepository::persist(&database, &mut emails).await.unwrap();

        let mut messages = vec![Message::from_email(None, ThreadId(99), &emails[0]).unwrap()];
        let result = MessageRepository::persist(&database, &mut messages).await;
        assert!(result.unwrap_err().is_storage_error());
        assert!(MessageRepository::find_all(&database).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_thread_id_by_email_key() {
        let database = database().await;
        let mut emails = vec![email("<a>", None, 100), email("<b>", Some("<a>"), 200)];
        EmailRepository::persist(&database, &mut emails).await.unwrap();

        let mut threads = [Thread::from_top_level_email(&emails[0]).unwrap()];
        ThreadRepository::persist(&database, &mut threads).await.unwrap();
        let thread_id = threads[0].persisted_id().unwrap();

        assert_eq!(
            database.find_thread_id_by_email_key(&MessageKey::from("<a>")).await.unwrap(),
            None
        );

        let mut messages = vec![
            Message::from_email(None, thread_id, &emails[0]).unwrap(),
            Message::from_email(None, thread_id, &emails[1]).unwrap(),
        ];
        MessageRepository::persist(&database, &mut messages).await.unwrap();

        assert_eq!(
            database.find_thread_id_by_email_key(&MessageKey::from("<b>")).await.unwrap(),
            Some(thread_id)
        );
        assert_eq!(
            database.find_thread_id_by_email_key(&MessageKey::from("<zzz>")).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_user_lookup_by_email() {
        let database = database().await;
        let mut users = vec![
            User::new("alice@example.com", Some("Alice".to_string())),
            User::new("bob@example.com", None),
        ];
        UserRepository::persist(&database, &mut users).await.unwrap();

        let alice = database.find_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(alice.id, users[0].id);
        assert_eq!(alice.display_name.as_deref(), Some("Alice"));
        assert!(database.find_by_email("carol@example.com").await.unwrap().is_none());
        assert_eq!(UserRepository::find_all(&database).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_user_batch_is_all_or_nothing() {
        let database = database().await;
        let mut users = vec![
            User::new("alice@example.com", None),
            User::new("alice@example.com", None),
        ];
        assert!(UserRepository::persist(&database, &mut users).await.is_err());
        assert!(UserRepository::find_all(&database).await.unwrap().is_empty());
    }
}
