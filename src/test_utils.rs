//! Test utilities for ticketboard
//!
//! Common fixtures shared by the unit tests of the storage and API layers.

#![cfg(test)]

use crate::core::{Ticket, TicketBuilder, TicketStatus, TodoItem, positions};
use crate::storage::{MemoryStore, TicketRepository};

/// In-memory store preloaded with tickets
pub struct TestStore {
    pub store: MemoryStore,
    pub tickets: Vec<Ticket>,
}

impl TestStore {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            tickets: Vec::new(),
        }
    }

    /// Store holding a single active ticket
    pub async fn with_ticket(category: &str, number: &str) -> Self {
        let mut fixture = Self::new();
        fixture.create_ticket(category, number, "Fixture ticket").await;
        fixture
    }

    /// Store with a handful of tickets across categories and statuses
    pub async fn with_sample_tickets() -> Self {
        let mut fixture = Self::new();
        for (category, number, description, status) in [
            ("bug", "BUG-1", "Fix login redirect", TicketStatus::Todo),
            ("bug", "BUG-2", "Crash on empty search", TicketStatus::Doing),
            ("feature", "FEAT-1", "Saved filters", TicketStatus::Review),
        ] {
            let new = TicketBuilder::new()
                .category(category)
                .number(number)
                .description(description)
                .status(status)
                .build();
            let ticket = fixture
                .store
                .create_ticket(new)
                .await
                .expect("Failed to create sample ticket");
            fixture.tickets.push(ticket);
        }
        fixture
    }

    /// Create and record a ticket
    pub async fn create_ticket(&mut self, category: &str, number: &str, description: &str) -> Ticket {
        let new = TicketBuilder::new()
            .category(category)
            .number(number)
            .description(description)
            .build();
        let ticket = self
            .store
            .create_ticket(new)
            .await
            .expect("Failed to create ticket");
        self.tickets.push(ticket.clone());
        ticket
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert that todo positions form `0..n-1`
pub fn assert_dense(todos: &[TodoItem]) {
    let positions: Vec<i32> = todos.iter().map(|t| t.position).collect();
    assert!(positions::is_dense(&positions), "positions are not dense: {positions:?}");
}
