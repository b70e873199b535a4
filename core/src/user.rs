//! Registered sender identities

use serde::{Deserialize, Serialize};

/// Row id assigned to a user when it is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A known sender, matched against imported emails by address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Row id, `None` until persisted
    pub id: Option<UserId>,
    pub display_name: Option<String>,
    pub email: String,
}

impl User {
    pub fn new(email: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            id: None,
            display_name,
            email: email.into(),
        }
    }
}
