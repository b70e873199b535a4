//! Conversation threads

use serde::{Deserialize, Serialize};

use crate::email::Email;
use crate::error::{MailweaveError, MailweaveResult};
use crate::text::text_ellipsis;

/// Width thread names are shaped to
pub const THREAD_NAME_WIDTH: usize = 20;

/// Name given to threads whose root email has no subject
pub const UNTITLED_THREAD_NAME: &str = "(Untitled thread)";

/// Row id assigned to a thread when it is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub i64);

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named grouping of messages descended from one root email.
///
/// The name is fixed when the thread is created and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Row id, `None` until persisted
    pub id: Option<ThreadId>,
    name: String,
}

impl Thread {
    pub(crate) fn with_name(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    /// Restore a persisted thread
    pub fn from_parts(id: ThreadId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }

    /// Start a thread from a top-level email.
    ///
    /// Fails with [`MailweaveError::NotTopLevel`] if the email is a reply.
    pub fn from_top_level_email(email: &Email) -> MailweaveResult<Self> {
        if let Some(parent) = &email.in_reply_to {
            return Err(MailweaveError::NotTopLevel {
                key: email.universal_message_id.clone(),
                in_reply_to: parent.clone(),
            });
        }

        let name = if email.subject.is_empty() {
            UNTITLED_THREAD_NAME.to_string()
        } else {
            text_ellipsis(&email.subject, THREAD_NAME_WIDTH)
        };

        Ok(Self::with_name(name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The persisted row id, or an error if the thread has not been stored yet
    pub fn persisted_id(&self) -> MailweaveResult<ThreadId> {
        self.id.ok_or_else(|| {
            MailweaveError::invalid_state(format!("thread '{}' has not been persisted", self.name))
        })
    }
}
