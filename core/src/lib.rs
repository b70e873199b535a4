//! Mailweave Core Library
//!
//! This crate reconstructs conversations from flat batches of fetched email:
//! - Entity model (Email, Thread, Message, User)
//! - Thread association for imported batches
//! - Repository contracts and their SQLite implementation
//! - Line-oriented display of persisted threads

pub mod config;
pub mod display;
pub mod email;
pub mod error;
pub mod fetch;
pub mod import;
pub mod message;
pub mod repository;
pub mod storage;
pub mod text;
pub mod thread;
pub mod user;

// Re-export commonly used types
pub use config::{Config, DisplayConfig, ImportConfig};
pub use display::MessageDisplay;
pub use email::{Email, EmailAddress, EmailId, MessageKey};
pub use error::{MailweaveError, MailweaveResult};
pub use fetch::{EmailFetcher, JsonFileFetcher};
pub use import::{EmailImporter, ImportReport};
pub use message::{Message, MessageId};
pub use repository::{EmailRepository, MessageRepository, ThreadRepository, UserRepository};
pub use storage::Database;
pub use text::text_ellipsis;
pub use thread::{Thread, ThreadId, THREAD_NAME_WIDTH, UNTITLED_THREAD_NAME};
pub use user::{User, UserId};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "Mailweave";

/// Default data directory name
pub const DATA_DIR_NAME: &str = "mailweave";

/// Default database filename
pub const DB_FILENAME: &str = "mailweave.db";

/// Get the default data directory
pub fn get_data_dir() -> std::path::PathBuf {
    std::env::var("MAILWEAVE_DATA_DIR")
        .map(std::path::PathBuf::from)
        .or_else(|_| {
            directories::ProjectDirs::from("", "", DATA_DIR_NAME)
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or(std::env::VarError::NotPresent)
        })
        .unwrap_or_else(|_| std::path::PathBuf::from("~/.local/share/mailweave"))
}
