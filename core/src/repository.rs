//! Persistence contracts for the entities Mailweave derives.
//!
//! Each `persist` call is all-or-nothing and assigns row ids back onto the
//! entities it writes. `find_all` returns entities in insertion order.

use crate::email::{Email, MessageKey};
use crate::error::MailweaveResult;
use crate::message::Message;
use crate::thread::{Thread, ThreadId};
use crate::user::User;

/// Storage for raw fetched emails
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EmailRepository: Send + Sync {
    async fn persist(&self, emails: &mut [Email]) -> MailweaveResult<()>;

    async fn find_all(&self) -> MailweaveResult<Vec<Email>>;
}

/// Storage for threads
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ThreadRepository: Send + Sync {
    async fn persist(&self, threads: &mut [Thread]) -> MailweaveResult<()>;

    async fn find_all(&self) -> MailweaveResult<Vec<Thread>>;
}

/// Storage for thread-scoped messages
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MessageRepository: Send + Sync {
    async fn persist(&self, messages: &mut [Message]) -> MailweaveResult<()>;

    async fn find_all(&self) -> MailweaveResult<Vec<Message>>;

    /// Thread of the earliest persisted message whose originating email has `key`
    async fn find_thread_id_by_email_key(
        &self,
        key: &MessageKey,
    ) -> MailweaveResult<Option<ThreadId>>;
}

/// Storage for registered senders
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    async fn persist(&self, users: &mut [User]) -> MailweaveResult<()>;

    async fn find_all(&self) -> MailweaveResult<Vec<User>>;

    async fn find_by_email(&self, address: &str) -> MailweaveResult<Option<User>>;
}
