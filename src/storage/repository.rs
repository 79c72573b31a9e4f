use crate::core::{
    Comment, CommentChanges, DeleteMode, ListQuery, NewComment, NewTicket, NewTodo, Ticket,
    TicketChanges, TicketLookup, TicketPage, TodoChanges, TodoItem,
};
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository trait for versioned ticket storage
///
/// Every mutating operation is atomic: it either commits completely or
/// leaves no trace. At most one version per `(category, number)` is active.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Creates version 1 of a new lineage.
    ///
    /// Fails with `Conflict` when an active ticket already exists for the key.
    async fn create_ticket(&self, new: NewTicket) -> Result<Ticket>;

    /// Returns the active version
    async fn get_ticket(&self, lookup: &TicketLookup) -> Result<Ticket>;

    /// Returns every version of the current lineage, oldest first. When the
    /// ticket is soft-deleted this is the most recent lineage.
    async fn ticket_history(&self, lookup: &TicketLookup) -> Result<Vec<Ticket>>;

    /// Lists tickets, most recently updated first
    async fn list_tickets(&self, query: &ListQuery) -> Result<TicketPage>;

    /// Supersedes the active version with a new one carrying `changes`
    async fn update_ticket(&self, lookup: &TicketLookup, changes: TicketChanges) -> Result<Ticket>;

    /// Soft- or hard-deletes a ticket
    async fn delete_ticket(&self, lookup: &TicketLookup, mode: DeleteMode) -> Result<()>;

    /// Checks that the backing store is reachable
    async fn ping(&self) -> Result<()>;
}

/// Repository trait for the todo items of a ticket
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Adds an item to an active ticket, shifting later items down
    async fn create_todo(&self, ticket: &TicketLookup, new: NewTodo) -> Result<TodoItem>;

    /// Lists the items of an active ticket by position
    async fn list_todos(&self, ticket: &TicketLookup) -> Result<Vec<TodoItem>>;

    /// Items of the given lineages, ordered by lineage then position. Works
    /// for inactive versions too, which is what ticket listings embed.
    async fn todos_for_lineages(&self, lineage_ids: &[Uuid]) -> Result<Vec<TodoItem>>;

    /// Updates an item, resequencing its siblings when the position changes
    async fn update_todo(&self, id: i64, changes: TodoChanges) -> Result<TodoItem>;

    /// Removes an item and closes the gap it leaves
    async fn delete_todo(&self, id: i64) -> Result<()>;
}

/// Repository trait for ticket comments
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create_comment(&self, ticket: &TicketLookup, new: NewComment) -> Result<Comment>;

    /// Lists the comments of an active ticket, oldest first
    async fn list_comments(&self, ticket: &TicketLookup) -> Result<Vec<Comment>>;

    async fn update_comment(&self, id: i64, changes: CommentChanges) -> Result<Comment>;

    async fn delete_comment(&self, id: i64) -> Result<()>;
}

/// Combined repository trait
pub trait Repository: TicketRepository + TodoRepository + CommentRepository {}

/// Implementation of Repository for types that implement all three traits
impl<T> Repository for T where T: TicketRepository + TodoRepository + CommentRepository {}
