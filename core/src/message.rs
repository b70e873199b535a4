//! Thread-scoped messages

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::email::{Email, EmailId};
use crate::error::MailweaveResult;
use crate::thread::ThreadId;
use crate::user::UserId;

/// Row id assigned to a message when it is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An imported email attributed to a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Row id, `None` until persisted
    pub id: Option<MessageId>,
    /// Owning thread
    pub thread_id: ThreadId,
    /// Registered sender; `None` means display falls back to the email's address
    pub sender_id: Option<UserId>,
    /// Originating email
    pub email_id: EmailId,
    pub date: OffsetDateTime,
    pub body: String,
}

impl Message {
    /// Wrap a persisted email as a message of `thread_id`
    pub fn from_email(
        sender_id: Option<UserId>,
        thread_id: ThreadId,
        email: &Email,
    ) -> MailweaveResult<Self> {
        Ok(Self {
            id: None,
            thread_id,
            sender_id,
            email_id: email.persisted_id()?,
            date: email.date,
            body: email.body.clone(),
        })
    }
}
