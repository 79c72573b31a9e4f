//! Domain types of the ticket store

mod builders;
mod comment;
pub mod positions;
mod ticket;
mod todo;

pub use builders::{CommentBuilder, TicketBuilder, TicketChangesBuilder};
pub use comment::{Comment, CommentChanges, NewComment};
pub use ticket::{
    DeleteMode, ListQuery, NewTicket, Ticket, TicketChanges, TicketKey, TicketLookup, TicketPage,
    TicketStatus, generate_ticket_number,
};
pub use todo::{NewTodo, TodoChanges, TodoItem};
