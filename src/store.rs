//! Contact message store
//!
//! Messages submitted through the contact form and handled by an
//! administrator. The [`MessageStore`] trait is the seam; [`JsonFileStore`]
//! keeps every message in one JSON array on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

/// Number of entries in [`MessageStats::recent_activity`]
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

/// Handling state of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    New,
    Read,
    Replied,
    Closed,
}

/// A stored contact message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: MessageStatus,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub admin_notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_reply: Option<String>,
    #[serde(default)]
    pub replied_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub replied_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_category() -> String {
    "general".to_string()
}

fn default_priority() -> String {
    "normal".to_string()
}

/// Contact form input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl NewMessage {
    /// Check required fields and the email shape
    pub fn validate(&self) -> StoreResult<()> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("message", &self.message),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(StoreError::MissingField { field });
            }
        }

        if !self.email.contains('@') || !self.email.contains('.') {
            return Err(StoreError::InvalidEmail {
                email: self.email.clone(),
            });
        }

        Ok(())
    }
}

/// Administrator changes to a message; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageUpdate {
    pub status: Option<MessageStatus>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub admin_notes: Option<String>,
}

/// One line of recent activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: u64,
    pub subject: String,
    pub status: MessageStatus,
    pub timestamp: DateTime<Utc>,
}

/// Store-wide message statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageStats {
    pub total_messages: usize,
    pub status_breakdown: BTreeMap<MessageStatus, usize>,
    pub category_breakdown: BTreeMap<String, usize>,
    pub priority_breakdown: BTreeMap<String, usize>,
    /// Newest first
    pub recent_activity: Vec<ActivityEntry>,
}

impl MessageStats {
    pub fn from_messages(messages: &[ContactMessage]) -> Self {
        let mut stats = MessageStats {
            total_messages: messages.len(),
            ..MessageStats::default()
        };

        for message in messages {
            *stats.status_breakdown.entry(message.status).or_insert(0) += 1;
            *stats
                .category_breakdown
                .entry(message.category.clone())
                .or_insert(0) += 1;
            *stats
                .priority_breakdown
                .entry(message.priority.clone())
                .or_insert(0) += 1;
        }

        let mut recent: Vec<&ContactMessage> = messages.iter().collect();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        stats.recent_activity = recent
            .into_iter()
            .take(RECENT_ACTIVITY_LIMIT)
            .map(|message| ActivityEntry {
                id: message.id,
                subject: message.subject.clone(),
                status: message.status,
                timestamp: message.timestamp,
            })
            .collect();

        stats
    }
}

/// Persistence of contact messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Store a new message and return it with its assigned id
    async fn submit(&self, input: NewMessage) -> StoreResult<ContactMessage>;

    async fn list(&self) -> StoreResult<Vec<ContactMessage>>;

    async fn get(&self, id: u64) -> StoreResult<ContactMessage>;

    async fn update(&self, id: u64, update: MessageUpdate) -> StoreResult<ContactMessage>;

    /// Record an administrator reply and mark the message replied
    async fn reply(&self, id: u64, reply: &str, replied_by: &str) -> StoreResult<ContactMessage>;

    async fn delete(&self, id: u64) -> StoreResult<()>;

    async fn stats(&self) -> StoreResult<MessageStats>;
}

/// Message store backed by one JSON file
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable content reads as an empty store
    async fn load(&self) -> StoreResult<Vec<ContactMessage>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e)),
        };

        match serde_json::from_str(&content) {
            Ok(messages) => Ok(messages),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt message file, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, messages: &[ContactMessage]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(messages)?;
        tokio::fs::write(&self.path, content).await?;
        debug!(path = %self.path.display(), count = messages.len(), "Messages saved");
        Ok(())
    }

    async fn modify<F>(&self, id: u64, apply: F) -> StoreResult<ContactMessage>
    where
        F: FnOnce(&mut ContactMessage) + Send,
    {
        let _guard = self.lock.lock().await;
        let mut messages = self.load().await?;

        let message = messages
            .iter_mut()
            .find(|message| message.id == id)
            .ok_or(StoreError::NotFound { id })?;
        apply(message);
        let updated = message.clone();

        self.save(&messages).await?;
        Ok(updated)
    }
}

#[async_trait]
impl MessageStore for JsonFileStore {
    async fn submit(&self, input: NewMessage) -> StoreResult<ContactMessage> {
        input.validate()?;

        let _guard = self.lock.lock().await;
        let mut messages = self.load().await?;

        // Ids stay unique after deletions
        let id = messages.iter().map(|message| message.id).max().unwrap_or(0) + 1;
        let message = ContactMessage {
            id,
            name: input.name,
            email: input.email,
            subject: input.subject,
            message: input.message,
            timestamp: Utc::now(),
            status: MessageStatus::New,
            category: default_category(),
            priority: default_priority(),
            admin_notes: String::new(),
            admin_reply: None,
            replied_at: None,
            replied_by: None,
            updated_at: None,
        };
        messages.push(message.clone());
        self.save(&messages).await?;

        info!(id, "Contact message submitted");
        Ok(message)
    }

    async fn list(&self) -> StoreResult<Vec<ContactMessage>> {
        self.load().await
    }

    async fn get(&self, id: u64) -> StoreResult<ContactMessage> {
        self.load()
            .await?
            .into_iter()
            .find(|message| message.id == id)
            .ok_or(StoreError::NotFound { id })
    }

    async fn update(&self, id: u64, update: MessageUpdate) -> StoreResult<ContactMessage> {
        self.modify(id, move |message| {
            if let Some(status) = update.status {
                message.status = status;
                message.updated_at = Some(Utc::now());
            }
            if let Some(category) = update.category {
                message.category = category;
            }
            if let Some(priority) = update.priority {
                message.priority = priority;
            }
            if let Some(admin_notes) = update.admin_notes {
                message.admin_notes = admin_notes;
            }
        })
        .await
    }

    async fn reply(&self, id: u64, reply: &str, replied_by: &str) -> StoreResult<ContactMessage> {
        if reply.trim().is_empty() {
            return Err(StoreError::EmptyReply);
        }

        let reply = reply.to_string();
        let replied_by = replied_by.to_string();
        let message = self
            .modify(id, move |message| {
                let now = Utc::now();
                message.status = MessageStatus::Replied;
                message.admin_reply = Some(reply);
                message.replied_at = Some(now);
                message.replied_by = Some(replied_by);
                message.updated_at = Some(now);
            })
            .await?;

        info!(id, "Contact message replied");
        Ok(message)
    }

    async fn delete(&self, id: u64) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut messages = self.load().await?;

        let before = messages.len();
        messages.retain(|message| message.id != id);
        if messages.len() == before {
            return Err(StoreError::NotFound { id });
        }

        self.save(&messages).await?;
        info!(id, "Contact message deleted");
        Ok(())
    }

    async fn stats(&self) -> StoreResult<MessageStats> {
        Ok(MessageStats::from_messages(&self.load().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn input() -> NewMessage {
        NewMessage {
            name: "Ada".to_string(),
            email: "ada@example.org".to_string(),
            subject: "Schema question".to_string(),
            message: "Why is my order invalid?".to_string(),
        }
    }

    fn message(id: u64, minutes_ago: i64, status: MessageStatus) -> ContactMessage {
        ContactMessage {
            id,
            name: "n".to_string(),
            email: "n@example.org".to_string(),
            subject: format!("subject {}", id),
            message: "m".to_string(),
            timestamp: Utc::now() - Duration::minutes(minutes_ago),
            status,
            category: default_category(),
            priority: default_priority(),
            admin_notes: String::new(),
            admin_reply: None,
            replied_at: None,
            replied_by: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_new_message_validation() {
        assert!(input().validate().is_ok());

        let missing = NewMessage {
            subject: "  ".to_string(),
            ..input()
        };
        assert!(matches!(
            missing.validate(),
            Err(StoreError::MissingField { field: "subject" })
        ));

        let bad_email = NewMessage {
            email: "ada@localhost".to_string(),
            ..input()
        };
        assert!(matches!(
            bad_email.validate(),
            Err(StoreError::InvalidEmail { .. })
        ));
    }

    #[test]
    fn test_stats_breakdown_and_recent_order() {
        let mut messages: Vec<ContactMessage> = (1..=12)
            .map(|id| message(id, id as i64, MessageStatus::New))
            .collect();
        messages[0].status = MessageStatus::Closed;
        messages[1].priority = "high".to_string();

        let stats = MessageStats::from_messages(&messages);

        assert_eq!(stats.total_messages, 12);
        assert_eq!(stats.status_breakdown[&MessageStatus::New], 11);
        assert_eq!(stats.status_breakdown[&MessageStatus::Closed], 1);
        assert_eq!(stats.category_breakdown["general"], 12);
        assert_eq!(stats.priority_breakdown["high"], 1);
        assert_eq!(stats.recent_activity.len(), RECENT_ACTIVITY_LIMIT);
        // id 1 is the newest
        assert_eq!(stats.recent_activity[0].id, 1);
        assert_eq!(stats.recent_activity[9].id, 10);
    }

    #[test]
    fn test_legacy_record_defaults() {
        let json = r#"{
            "id": 3,
            "name": "n",
            "email": "n@example.org",
            "subject": "s",
            "message": "m",
            "timestamp": "2024-05-01T10:00:00Z"
        }"#;

        let message: ContactMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.status, MessageStatus::New);
        assert_eq!(message.category, "general");
        assert_eq!(message.priority, "normal");
        assert!(message.replied_at.is_none());
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_file_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();

        let store = JsonFileStore::new(dir.path().join("missing.json"));
        assert!(store.list().await.unwrap().is_empty());

        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, "{ not json").unwrap();
        let store = JsonFileStore::new(&corrupt);
        assert!(store.list().await.unwrap().is_empty());
        assert_eq!(store.stats().await.unwrap(), MessageStats::default());
    }
}
