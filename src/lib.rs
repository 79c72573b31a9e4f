//! ticketboard - a versioned ticket store with an HTTP API
//!
//! Tickets are never edited in place. Every update closes the active row and
//! inserts a new version, so the full history of a ticket stays queryable.
//! Todo items and comments hang off the ticket's lineage and survive
//! updates; a hard delete removes the ticket together with its children.
//!
//! # Storage
//!
//! [`storage::PgStore`] keeps data in PostgreSQL and runs every mutation in a
//! single transaction. A partial unique index guarantees at most one active
//! version per `(category, number)`. [`storage::MemoryStore`] implements the
//! same contract in process memory for tests and local experiments.
//!
//! # Example
//!
//! ```rust,ignore
//! use ticketboard::core::{TicketBuilder, TicketChanges, TicketLookup};
//! use ticketboard::storage::{MemoryStore, TicketRepository};
//!
//! let store = MemoryStore::new();
//! let ticket = TicketBuilder::new()
//!     .category("bug")
//!     .number("BUG-123")
//!     .description("Fix login")
//!     .build();
//! store.create_ticket(ticket).await?;
//!
//! let lookup = TicketLookup::new("BUG-123");
//! let changes = TicketChanges { description: Some("Fix login auth".into()), ..Default::default() };
//! let v2 = store.update_ticket(&lookup, changes).await?;
//! assert_eq!(v2.version, 2);
//! ```

// Allow missing error documentation for internal implementations
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::indexing_slicing)]

#[cfg(feature = "api")]
pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{Result, TicketboardError};
