//! Todo items attached to a ticket
//!
//! Todo items are mutated in place. Their `position` values form a dense
//! `0..n-1` ordering within a ticket; see [`crate::core::positions`].

use crate::error::{Result, TicketboardError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct TodoItem {
    pub id: i64,
    pub lineage_id: Uuid,
    pub ticket_category: String,
    pub ticket_number: String,
    pub description: String,
    pub done: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to add a todo item; without a position it goes to the end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    pub description: String,
    #[serde(default)]
    pub position: Option<i32>,
}

impl NewTodo {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            position: None,
        }
    }

    #[must_use]
    pub const fn at(mut self, position: i32) -> Self {
        self.position = Some(position);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(TicketboardError::validation("description is required"));
        }
        validate_position(self.position)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoChanges {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub position: Option<i32>,
}

impl TodoChanges {
    pub fn validate(&self) -> Result<()> {
        if self.description.is_none() && self.done.is_none() && self.position.is_none() {
            return Err(TicketboardError::validation(
                "at least one of description, done or position must be provided",
            ));
        }
        if self.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(TicketboardError::validation("description must not be empty"));
        }
        validate_position(self.position)
    }
}

fn validate_position(position: Option<i32>) -> Result<()> {
    match position {
        Some(p) if p < 0 => Err(TicketboardError::validation(format!(
            "position must be non-negative (got {p})"
        ))),
        _ => Ok(()),
    }
}
