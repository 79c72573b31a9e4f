//! Comments attached to a ticket

use crate::error::{Result, TicketboardError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A comment on a ticket. `links` and `attachments` are free-form JSON
/// (URLs, references to indexed documents) and are stored as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Comment {
    pub id: i64,
    pub lineage_id: Uuid,
    pub ticket_category: String,
    pub ticket_number: String,
    pub author: String,
    pub content: String,
    pub links: Option<Value>,
    pub attachments: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub links: Option<Value>,
    #[serde(default)]
    pub attachments: Option<Value>,
}

impl NewComment {
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
            links: None,
            attachments: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.author.trim().is_empty() {
            return Err(TicketboardError::validation("author is required"));
        }
        if self.content.trim().is_empty() {
            return Err(TicketboardError::validation("content is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentChanges {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub links: Option<Value>,
    #[serde(default)]
    pub attachments: Option<Value>,
}

impl CommentChanges {
    pub fn validate(&self) -> Result<()> {
        if self.content.is_none() && self.links.is_none() && self.attachments.is_none() {
            return Err(TicketboardError::validation(
                "at least one of content, links or attachments must be provided",
            ));
        }
        if self.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(TicketboardError::validation("content must not be empty"));
        }
        Ok(())
    }
}
