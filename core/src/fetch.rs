//! Sources of fetched email batches

use std::path::PathBuf;

use crate::email::Email;
use crate::error::{MailweaveError, MailweaveResult};

/// Produces one finite batch of emails per import run
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EmailFetcher: Send + Sync {
    async fn fetch(&self) -> MailweaveResult<Vec<Email>>;
}

/// Reads a JSON array of emails from a file
pub struct JsonFileFetcher {
    path: PathBuf,
}

impl JsonFileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait::async_trait]
impl EmailFetcher for JsonFileFetcher {
    async fn fetch(&self) -> MailweaveResult<Vec<Email>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            MailweaveError::fetch(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        let mut emails: Vec<Email> = serde_json::from_str(&content)?;
        // Row ids come from storage, never from the source
        for email in &mut emails {
            email.id = None;
        }

        tracing::debug!("Fetched {} emails from {}", emails.len(), self.path.display());
        Ok(emails)
    }
}
