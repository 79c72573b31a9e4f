//! Storage backends for tickets, todo items and comments

mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod repository;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;
pub use repository::{CommentRepository, Repository, TicketRepository, TodoRepository};
