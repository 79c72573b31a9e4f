//! Error types for ticketboard
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! [`TicketboardError`] carries the taxonomy the HTTP layer maps onto status
//! codes: not-found, conflict, validation and storage failures.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, TicketboardError>;

/// Errors produced by the ticket store, the HTTP layer and the CLI
#[derive(Error, Debug)]
pub enum TicketboardError {
    /// No ticket row matches the requested key
    #[error("Ticket not found: {number}")]
    TicketNotFound { number: String },

    /// No todo item with the given id
    #[error("Todo item not found: {id}")]
    TodoNotFound { id: i64 },

    /// No comment with the given id
    #[error("Comment not found: {id}")]
    CommentNotFound { id: i64 },

    /// A uniqueness rule was violated or an update lost a race
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or malformed input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The backing store failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TicketboardError {
    /// Create a validation error from any displayable message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a storage error from any displayable message
    pub fn storage(message: impl std::fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }

    /// Shorthand for the not-found error of a ticket number
    pub fn ticket_not_found(number: impl Into<String>) -> Self {
        Self::TicketNotFound {
            number: number.into(),
        }
    }

    /// Stable machine-readable code used in API error bodies
    pub const fn code(&self) -> &'static str {
        match self {
            Self::TicketNotFound { .. } | Self::TodoNotFound { .. } | Self::CommentNotFound { .. } => {
                "not_found"
            },
            Self::Conflict(_) => "conflict",
            Self::Validation(_) => "validation_error",
            Self::Storage(_) => "storage_error",
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::Serialization(_) => "serialization_error",
        }
    }

    /// Whether the caller can fix the problem by changing the request
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TicketNotFound { .. }
                | Self::TodoNotFound { .. }
                | Self::CommentNotFound { .. }
                | Self::Conflict(_)
                | Self::Validation(_)
        )
    }

    /// Whether this error came from loading configuration
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Message suitable for showing to a person
    pub fn user_message(&self) -> String {
        match self {
            Self::Storage(_) => "The ticket database could not complete the request".to_string(),
            _ => self.to_string(),
        }
    }

    /// Hints printed by the CLI under the error message
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::TicketNotFound { .. } => vec![
                "Check the ticket number and category".to_string(),
                "Soft-deleted tickets are only visible with include_history=true".to_string(),
            ],
            Self::Conflict(_) => vec!["Re-read the ticket and retry the request".to_string()],
            Self::Storage(_) => vec![
                "Check that PostgreSQL is reachable at the configured database.url".to_string(),
                "Run `ticketboard migrate` if the schema has not been created".to_string(),
            ],
            Self::Config(_) => vec![
                "Run `ticketboard config show` to inspect the resolved configuration".to_string(),
                "Set DATABASE_URL or TICKETBOARD__DATABASE__URL".to_string(),
            ],
            _ => Vec::new(),
        }
    }
}

impl From<config::ConfigError> for TicketboardError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for TicketboardError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Self::Conflict(format!("conflicting concurrent write: {}", db.message()))
            },
            other => Self::Storage(other.to_string()),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::migrate::MigrateError> for TicketboardError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Storage(format!("migration failed: {err}"))
    }
}
