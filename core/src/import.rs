//! Thread association for imported email batches
//!
//! A batch is processed in one sequential pass:
//!
//! 1. emails are sorted by date (stable, so equal timestamps keep fetch order);
//! 2. every top-level email starts a thread, which is persisted at once and
//!    remembered under the email's own key;
//! 3. every reply is attached to the thread remembered under its parent key,
//!    falling back to the persisted store when the parent came from an earlier
//!    run;
//! 4. the resulting messages are written in one bulk call at the end.
//!
//! Replies whose parent cannot be found are dropped from the run. They are
//! logged and listed in the [`ImportReport`] but do not fail the import.
//! Nothing here is transactional across the batch: if the final message write
//! fails, the emails and threads already written stay committed.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ImportConfig;
use crate::email::{Email, MessageKey};
use crate::error::MailweaveResult;
use crate::fetch::EmailFetcher;
use crate::message::Message;
use crate::repository::{EmailRepository, MessageRepository, ThreadRepository, UserRepository};
use crate::thread::{Thread, ThreadId};

/// Outcome of one import run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Emails in the batch
    pub emails: usize,
    /// Threads created for top-level emails
    pub threads_created: usize,
    /// Messages written
    pub messages_created: usize,
    /// Replies whose thread was found in the persisted store rather than the batch
    pub resolved_from_store: usize,
    /// Replies dropped because no thread could be found for their parent
    pub unresolved_replies: Vec<MessageKey>,
}

impl ImportReport {
    pub fn dropped(&self) -> usize {
        self.unresolved_replies.len()
    }
}

impl std::fmt::Display for ImportReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} emails, {} threads created, {} messages created \
             ({} replies resolved from store, {} unresolved)",
            self.emails,
            self.threads_created,
            self.messages_created,
            self.resolved_from_store,
            self.dropped()
        )
    }
}

/// Imports a fetched batch and derives its threads and messages
pub struct EmailImporter {
    fetcher: Arc<dyn EmailFetcher>,
    emails: Arc<dyn EmailRepository>,
    threads: Arc<dyn ThreadRepository>,
    messages: Arc<dyn MessageRepository>,
    users: Arc<dyn UserRepository>,
    config: ImportConfig,
}

impl EmailImporter {
    pub fn new(
        fetcher: Arc<dyn EmailFetcher>,
        emails: Arc<dyn EmailRepository>,
        threads: Arc<dyn ThreadRepository>,
        messages: Arc<dyn MessageRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            fetcher,
            emails,
            threads,
            messages,
            users,
            config: ImportConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ImportConfig) -> Self {
        self.config = config;
        self
    }

    /// Fetch a batch, persist the raw emails, then associate them into threads
    pub async fn import(&self) -> MailweaveResult<ImportReport> {
        let mut emails = self.fetcher.fetch().await?;
        self.emails.persist(&mut emails).await?;
        info!("Persisted {} fetched emails", emails.len());

        self.associate(emails).await
    }

    /// Derive threads and messages from emails that are already persisted
    pub async fn associate(&self, mut emails: Vec<Email>) -> MailweaveResult<ImportReport> {
        emails.sort_by_key(|email| email.date);

        let mut report = ImportReport {
            emails: emails.len(),
            ..ImportReport::default()
        };
        let mut threads_by_key: HashMap<MessageKey, ThreadId> = HashMap::new();
        let mut messages = Vec::with_capacity(emails.len());

        for email in &emails {
            let thread_id = match &email.in_reply_to {
                None => {
                    let thread_id = self.create_thread(email).await?;
                    threads_by_key.insert(email.universal_message_id.clone(), thread_id);
                    report.threads_created += 1;
                    thread_id
                }
                Some(parent) => {
                    let resolved = self.resolve_parent(parent, &threads_by_key, &mut report).await?;
                    let Some(thread_id) = resolved else {
                        warn!(
                            "Dropping reply {}: no thread found for parent {}",
                            email.universal_message_id, parent
                        );
                        report.unresolved_replies.push(email.universal_message_id.clone());
                        continue;
                    };

                    if self.config.resolve_reply_chains {
                        threads_by_key
                            .entry(email.universal_message_id.clone())
                            .or_insert(thread_id);
                    }
                    thread_id
                }
            };

            messages.push(self.create_message(email, thread_id).await?);
        }

        self.messages.persist(&mut messages).await?;
        report.messages_created = messages.len();

        info!("Import finished: {}", report);
        Ok(report)
    }

    async fn create_thread(&self, email: &Email) -> MailweaveResult<ThreadId> {
        let mut batch = [Thread::from_top_level_email(email)?];
        self.threads.persist(&mut batch).await?;

        let [thread] = batch;
        let thread_id = thread.persisted_id()?;
        debug!(
            "Created thread {} '{}' for {}",
            thread_id,
            thread.name(),
            email.universal_message_id
        );
        Ok(thread_id)
    }

    async fn resolve_parent(
        &self,
        parent: &MessageKey,
        threads_by_key: &HashMap<MessageKey, ThreadId>,
        report: &mut ImportReport,
    ) -> MailweaveResult<Option<ThreadId>> {
        if let Some(thread_id) = threads_by_key.get(parent) {
            return Ok(Some(*thread_id));
        }

        if !self.config.resolve_from_store {
            return Ok(None);
        }

        let found = self.messages.find_thread_id_by_email_key(parent).await?;
        if let Some(thread_id) = found {
            debug!("Resolved parent {} from store to thread {}", parent, thread_id);
            report.resolved_from_store += 1;
        }
        Ok(found)
    }

    async fn create_message(&self, email: &Email, thread_id: ThreadId) -> MailweaveResult<Message> {
        let sender_id = self
            .users
            .find_by_email(&email.from.email)
            .await?
            .and_then(|user| user.id);

        Message::from_email(sender_id, thread_id, email)
    }
}
