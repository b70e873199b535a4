//! Line-oriented rendering of persisted threads

use std::collections::HashMap;
use std::sync::Arc;

use time::OffsetDateTime;

use crate::config::DisplayConfig;
use crate::email::{Email, EmailId};
use crate::error::{MailweaveError, MailweaveResult};
use crate::message::Message;
use crate::repository::{EmailRepository, MessageRepository, ThreadRepository, UserRepository};
use crate::text::text_ellipsis;
use crate::user::{User, UserId};

/// Joins threads, messages, users and emails into display lines
pub struct MessageDisplay {
    messages: Arc<dyn MessageRepository>,
    threads: Arc<dyn ThreadRepository>,
    users: Arc<dyn UserRepository>,
    emails: Arc<dyn EmailRepository>,
    config: DisplayConfig,
}

impl MessageDisplay {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        threads: Arc<dyn ThreadRepository>,
        users: Arc<dyn UserRepository>,
        emails: Arc<dyn EmailRepository>,
    ) -> Self {
        Self {
            messages,
            threads,
            users,
            emails,
            config: DisplayConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DisplayConfig) -> Self {
        self.config = config;
        self
    }

    /// Render every thread followed by its messages.
    ///
    /// Each thread yields a blank separator line, a `Thread: <name>` header and
    /// one `   <date> <sender>: <body>` line per message. Threads and messages
    /// appear in repository order.
    pub async fn render(&self) -> MailweaveResult<Vec<String>> {
        let messages = self.messages.find_all().await?;
        let threads = self.threads.find_all().await?;
        let users: HashMap<UserId, User> = self
            .users
            .find_all()
            .await?
            .into_iter()
            .filter_map(|user| user.id.map(|id| (id, user)))
            .collect();
        let emails: HashMap<EmailId, Email> = self
            .emails
            .find_all()
            .await?
            .into_iter()
            .filter_map(|email| email.id.map(|id| (id, email)))
            .collect();

        let mut lines = Vec::new();
        for thread in &threads {
            lines.push(String::new());
            lines.push(format!(
                "Thread: {}",
                text_ellipsis(thread.name(), self.config.thread_name_width)
            ));

            for message in messages.iter().filter(|m| Some(m.thread_id) == thread.id) {
                lines.push(self.render_message(message, &users, &emails)?);
            }
        }

        Ok(lines)
    }

    fn render_message(
        &self,
        message: &Message,
        users: &HashMap<UserId, User>,
        emails: &HashMap<EmailId, Email>,
    ) -> MailweaveResult<String> {
        let display_name = message
            .sender_id
            .and_then(|id| users.get(&id))
            .and_then(|user| user.display_name.as_deref());

        let sender = match display_name {
            Some(name) => name,
            None => {
                let email = emails.get(&message.email_id).ok_or_else(|| {
                    MailweaveError::not_found(format!(
                        "email {} referenced by message {}",
                        message.email_id,
                        message.id.map(|id| id.to_string()).unwrap_or_default()
                    ))
                })?;
                email.from.email.as_str()
            }
        };

        Ok(format!(
            "   {} {}: {}",
            text_ellipsis(&format_date(message.date), self.config.date_width),
            text_ellipsis(sender, self.config.sender_width),
            text_ellipsis(&message.body, self.config.body_width)
        ))
    }
}

fn format_date(date: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
