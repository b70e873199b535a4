//! Imported email facts
//!
//! An [`Email`] is the raw record produced by a fetch source. It is persisted
//! verbatim before any thread association happens and is never modified
//! afterwards.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Row id assigned to an email when it is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailId(pub i64);

impl std::fmt::Display for EmailId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External identity of an email (its universal Message-ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageKey(String);

impl MessageKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MessageKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for MessageKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl std::fmt::Display for MessageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress {
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Email address
    pub email: String,
}

impl EmailAddress {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.email),
            None => write!(f, "{}", self.email),
        }
    }
}

/// A fetched email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    /// Row id, `None` until persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EmailId>,
    pub universal_message_id: MessageKey,
    /// Key of the parent email; absent for top-level emails
    #[serde(default)]
    pub in_reply_to: Option<MessageKey>,
    #[serde(default)]
    pub subject: String,
    pub from: EmailAddress,
    #[serde(default)]
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

impl Email {
    /// Create a top-level email
    pub fn new(
        universal_message_id: impl Into<MessageKey>,
        subject: impl Into<String>,
        from: EmailAddress,
        date: OffsetDateTime,
    ) -> Self {
        Self {
            id: None,
            universal_message_id: universal_message_id.into(),
            in_reply_to: None,
            subject: subject.into(),
            from,
            body: String::new(),
            date,
        }
    }

    /// Mark this email as a reply to `parent`
    pub fn in_reply_to(mut self, parent: impl Into<MessageKey>) -> Self {
        self.in_reply_to = Some(parent.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Whether this email starts a new thread
    pub fn is_top_level(&self) -> bool {
        self.in_reply_to.is_none()
    }

    /// The persisted row id, or an error if the email has not been stored yet
    pub fn persisted_id(&self) -> crate::error::MailweaveResult<EmailId> {
        self.id.ok_or_else(|| {
            crate::error::MailweaveError::invalid_state(format!(
                "email {} has not been persisted",
                self.universal_message_id
            ))
        })
    }
}
