//! Ticket rows, keys and the requests that create or change them
//!
//! A ticket is identified by `(ticket_category, ticket_number)`. The table is
//! append-only: updates deactivate the current row and insert the next
//! version, so a single key owns a lineage of rows of which at most one is
//! active.

use crate::error::{Result, TicketboardError};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

static KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,63}$").expect("key pattern is a valid regex")
});

/// Workflow status of a ticket, independent of soft deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    Todo,
    Doing,
    Review,
    Blocked,
    Done,
}

impl TicketStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Doing => "doing",
            Self::Review => "review",
            Self::Blocked => "blocked",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = TicketboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "doing" => Ok(Self::Doing),
            "review" => Ok(Self::Review),
            "blocked" => Ok(Self::Blocked),
            "done" => Ok(Self::Done),
            other => Err(TicketboardError::validation(format!(
                "unknown ticket status '{other}' (expected todo, doing, review, blocked or done)"
            ))),
        }
    }
}

/// Fully qualified ticket key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketKey {
    pub category: String,
    pub number: String,
}

impl TicketKey {
    pub fn new(category: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            number: number.into(),
        }
    }
}

impl fmt::Display for TicketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.number)
    }
}

/// A ticket reference as it arrives from a caller: the number, and the
/// category when the caller knows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketLookup {
    pub number: String,
    pub category: Option<String>,
}

impl TicketLookup {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            category: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category.filter(|c| !c.trim().is_empty());
        self
    }

    /// Resolve the lookup to a full key.
    ///
    /// `active` holds the categories that have an active row for the number,
    /// `any` the categories that have any row at all.
    pub fn resolve(&self, active: &[String], any: &[String]) -> Result<TicketKey> {
        if let Some(category) = &self.category {
            return Ok(TicketKey::new(category.clone(), self.number.clone()));
        }

        let candidates = if active.is_empty() { any } else { active };
        match candidates {
            [] => Err(TicketboardError::ticket_not_found(&self.number)),
            [only] => Ok(TicketKey::new(only.clone(), self.number.clone())),
            many => Err(TicketboardError::validation(format!(
                "ticket number '{}' exists in several categories ({}); specify a category",
                self.number,
                many.join(", ")
            ))),
        }
    }
}

/// One version row of a ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub lineage_id: Uuid,
    pub ticket_category: String,
    pub ticket_number: String,
    pub description: String,
    pub completion_criteria: Option<String>,
    pub status: TicketStatus,
    pub version: i32,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn key(&self) -> TicketKey {
        TicketKey::new(self.ticket_category.clone(), self.ticket_number.clone())
    }
}

/// Request to create a new ticket lineage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    pub ticket_category: String,
    #[serde(default)]
    pub ticket_number: Option<String>,
    pub description: String,
    #[serde(default)]
    pub completion_criteria: Option<String>,
    #[serde(default)]
    pub status: Option<TicketStatus>,
}

impl NewTicket {
    /// Validate the request and produce the key the ticket will live under,
    /// generating a number when none was given.
    pub fn resolve_key(&self, now: DateTime<Utc>) -> Result<TicketKey> {
        validate_key_part("ticket_category", &self.ticket_category)?;
        if self.description.trim().is_empty() {
            return Err(TicketboardError::validation("description is required"));
        }

        let number = match self.ticket_number.as_deref().map(str::trim) {
            Some(number) if !number.is_empty() => {
                validate_key_part("ticket_number", number)?;
                number.to_string()
            },
            _ => generate_ticket_number(&self.ticket_category, now),
        };

        Ok(TicketKey::new(self.ticket_category.trim(), number))
    }
}

/// Field changes applied by an update; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketChanges {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completion_criteria: Option<String>,
    #[serde(default)]
    pub status: Option<TicketStatus>,
}

impl TicketChanges {
    pub fn validate(&self) -> Result<()> {
        if self.description.is_none() && self.completion_criteria.is_none() && self.status.is_none() {
            return Err(TicketboardError::validation(
                "at least one of description, completion_criteria or status must be provided",
            ));
        }
        if self.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(TicketboardError::validation("description must not be empty"));
        }
        Ok(())
    }

    /// Whether applying these changes to `current` would alter anything
    pub fn differs_from(&self, current: &Ticket) -> bool {
        self.description.as_ref().is_some_and(|d| *d != current.description)
            || self
                .completion_criteria
                .as_ref()
                .is_some_and(|c| current.completion_criteria.as_ref() != Some(c))
            || self.status.is_some_and(|s| s != current.status)
    }

    /// The field values of the version that follows `current`
    pub fn next_fields(&self, current: &Ticket) -> (String, Option<String>, TicketStatus) {
        (
            self.description.clone().unwrap_or_else(|| current.description.clone()),
            self.completion_criteria
                .clone()
                .or_else(|| current.completion_criteria.clone()),
            self.status.unwrap_or(current.status),
        )
    }
}

/// How `delete` treats a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Deactivate the current version, keep history and children
    #[default]
    Soft,
    /// Remove every version and all children
    Hard,
}

impl DeleteMode {
    pub const fn from_flag(hard_delete: bool) -> Self {
        if hard_delete { Self::Hard } else { Self::Soft }
    }
}

/// Filters and page window for listing tickets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub category: Option<String>,
    pub active_only: bool,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            category: None,
            active_only: true,
            limit: 100,
            offset: 0,
        }
    }
}

impl ListQuery {
    pub fn validate(&self, max_limit: i64) -> Result<()> {
        if self.limit < 1 || self.limit > max_limit {
            return Err(TicketboardError::validation(format!(
                "limit must be between 1 and {max_limit} (got {})",
                self.limit
            )));
        }
        if self.offset < 0 {
            return Err(TicketboardError::validation(format!(
                "offset must be non-negative (got {})",
                self.offset
            )));
        }
        Ok(())
    }
}

/// One page of tickets plus the total row count for the filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPage {
    pub tickets: Vec<Ticket>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

fn validate_key_part(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TicketboardError::validation(format!("{field} is required")));
    }
    if !KEY_PATTERN.is_match(value.trim()) {
        return Err(TicketboardError::validation(format!(
            "{field} '{value}' must start with a letter or digit and contain only letters, digits, '.', '_' or '-' (max 64 chars)"
        )));
    }
    Ok(())
}

/// Generate a ticket number of the form `BUG-1718000000-3f2a`
pub fn generate_ticket_number(category: &str, now: DateTime<Utc>) -> String {
    let prefix: String = category
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(3)
        .collect::<String>()
        .to_uppercase();
    let prefix = if prefix.is_empty() { "TKT".to_string() } else { prefix };
    let suffix = Uuid::new_v4().simple().to_string();

    format!("{prefix}-{}-{}", now.timestamp(), &suffix[..4])
}
