use super::{CommentChanges, NewComment, NewTicket, TicketChanges, TicketStatus};
use serde_json::Value;

/// Builder for ticket creation requests
#[derive(Default)]
pub struct TicketBuilder {
    category: Option<String>,
    number: Option<String>,
    description: Option<String>,
    completion_criteria: Option<String>,
    status: Option<TicketStatus>,
}

impl TicketBuilder {
    /// Create a new ticket builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the category
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the ticket number; left unset, the store generates one
    #[must_use]
    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the completion criteria
    #[must_use]
    pub fn completion_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.completion_criteria = Some(criteria.into());
        self
    }

    /// Set the initial status
    #[must_use]
    pub const fn status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Build the creation request
    pub fn build(self) -> NewTicket {
        NewTicket {
            ticket_category: self.category.unwrap_or_default(),
            ticket_number: self.number,
            description: self.description.unwrap_or_default(),
            completion_criteria: self.completion_criteria,
            status: self.status,
        }
    }
}

/// Builder for ticket updates
#[derive(Default)]
pub struct TicketChangesBuilder {
    changes: TicketChanges,
}

impl TicketChangesBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.changes.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn completion_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.changes.completion_criteria = Some(criteria.into());
        self
    }

    #[must_use]
    pub const fn status(mut self, status: TicketStatus) -> Self {
        self.changes.status = Some(status);
        self
    }

    pub fn build(self) -> TicketChanges {
        self.changes
    }
}

/// Builder for comments and comment updates
#[derive(Default)]
pub struct CommentBuilder {
    author: Option<String>,
    content: Option<String>,
    links: Option<Value>,
    attachments: Option<Value>,
}

impl CommentBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the links payload
    #[must_use]
    pub fn links(mut self, links: Value) -> Self {
        self.links = Some(links);
        self
    }

    /// Set the attached-document references
    #[must_use]
    pub fn attachments(mut self, attachments: Value) -> Self {
        self.attachments = Some(attachments);
        self
    }

    /// Build a new comment; author and content default to empty and are
    /// rejected by validation
    pub fn build(self) -> NewComment {
        NewComment {
            author: self.author.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            links: self.links,
            attachments: self.attachments,
        }
    }

    /// Build an update from the fields that were set; the author is ignored
    pub fn build_changes(self) -> CommentChanges {
        CommentChanges {
            content: self.content,
            links: self.links,
            attachments: self.attachments,
        }
    }
}
