//! In-process ticket store
//!
//! Holds every table in memory behind one async mutex. Each operation runs
//! with the lock held for its whole duration, which gives it the same
//! all-or-nothing behaviour a database transaction gives [`super::PgStore`].
//! Used by the test suites and by `serve --in-memory`.

use super::repository::{CommentRepository, TicketRepository, TodoRepository};
use crate::core::{
    Comment, CommentChanges, DeleteMode, ListQuery, NewComment, NewTicket, NewTodo, Ticket,
    TicketChanges, TicketKey, TicketLookup, TicketPage, TodoChanges, TodoItem, positions,
};
use crate::error::{Result, TicketboardError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeSet, HashSet};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    tickets: Vec<Ticket>,
    todos: Vec<TodoItem>,
    comments: Vec<Comment>,
    last_ticket_id: i64,
    last_todo_id: i64,
    last_comment_id: i64,
}

impl Tables {
    fn resolve(&self, lookup: &TicketLookup) -> Result<TicketKey> {
        if lookup.category.is_some() {
            return lookup.resolve(&[], &[]);
        }

        let mut active = BTreeSet::new();
        let mut any = BTreeSet::new();
        for ticket in self.tickets.iter().filter(|t| t.ticket_number == lookup.number) {
            any.insert(ticket.ticket_category.clone());
            if ticket.is_active {
                active.insert(ticket.ticket_category.clone());
            }
        }

        let active: Vec<String> = active.into_iter().collect();
        let any: Vec<String> = any.into_iter().collect();
        lookup.resolve(&active, &any)
    }

    fn rows_of<'a>(&'a self, key: &'a TicketKey) -> impl Iterator<Item = &'a Ticket> + 'a {
        self.tickets
            .iter()
            .filter(move |t| t.ticket_category == key.category && t.ticket_number == key.number)
    }

    fn active_index(&self, key: &TicketKey) -> Option<usize> {
        self.tickets.iter().position(|t| {
            t.is_active && t.ticket_category == key.category && t.ticket_number == key.number
        })
    }

    fn active_ticket(&self, lookup: &TicketLookup) -> Result<&Ticket> {
        let key = self.resolve(lookup)?;
        self.active_index(&key)
            .map(|index| &self.tickets[index])
            .ok_or_else(|| TicketboardError::ticket_not_found(&lookup.number))
    }

    fn sibling_order(&self, lineage_id: Uuid) -> Vec<i64> {
        let mut siblings: Vec<&TodoItem> =
            self.todos.iter().filter(|t| t.lineage_id == lineage_id).collect();
        siblings.sort_by_key(|t| (t.position, t.id));
        siblings.iter().map(|t| t.id).collect()
    }

    fn apply_order(&mut self, order: &[i64]) {
        for (id, position) in positions::resequence(order) {
            if let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) {
                todo.position = position;
            }
        }
    }
}

/// Ticket store that keeps everything in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn create_ticket(&self, new: NewTicket) -> Result<Ticket> {
        let now = Utc::now();
        let key = new.resolve_key(now)?;
        let mut tables = self.tables.lock().await;

        if tables.active_index(&key).is_some() {
            return Err(TicketboardError::Conflict(format!(
                "an active ticket {key} already exists"
            )));
        }

        tables.last_ticket_id += 1;
        let ticket = Ticket {
            id: tables.last_ticket_id,
            lineage_id: Uuid::new_v4(),
            ticket_category: key.category.clone(),
            ticket_number: key.number.clone(),
            description: new.description,
            completion_criteria: new.completion_criteria,
            status: new.status.unwrap_or_default(),
            version: 1,
            valid_from: now,
            valid_to: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.tickets.push(ticket.clone());

        info!(ticket = %key, lineage = %ticket.lineage_id, "ticket created");
        Ok(ticket)
    }

    async fn get_ticket(&self, lookup: &TicketLookup) -> Result<Ticket> {
        let tables = self.tables.lock().await;
        let ticket = tables.active_ticket(lookup)?;
        debug!(ticket = %ticket.key(), version = ticket.version, "ticket loaded");
        Ok(ticket.clone())
    }

    async fn ticket_history(&self, lookup: &TicketLookup) -> Result<Vec<Ticket>> {
        let tables = self.tables.lock().await;
        let key = tables.resolve(lookup)?;

        // The active row wins; otherwise the newest row marks the latest lineage.
        let lineage_id = tables
            .active_index(&key)
            .map(|index| tables.tickets[index].lineage_id)
            .or_else(|| tables.rows_of(&key).max_by_key(|t| t.id).map(|t| t.lineage_id))
            .ok_or_else(|| TicketboardError::ticket_not_found(&lookup.number))?;

        let mut versions: Vec<Ticket> = tables
            .tickets
            .iter()
            .filter(|t| t.lineage_id == lineage_id)
            .cloned()
            .collect();
        versions.sort_by_key(|t| t.version);
        Ok(versions)
    }

    async fn list_tickets(&self, query: &ListQuery) -> Result<TicketPage> {
        let tables = self.tables.lock().await;
        let mut matching: Vec<&Ticket> = tables
            .tickets
            .iter()
            .filter(|t| !query.active_only || t.is_active)
            .filter(|t| query.category.as_ref().is_none_or(|c| *c == t.ticket_category))
            .collect();
        matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));

        let offset = usize::try_from(query.offset).unwrap_or(0);
        let limit = usize::try_from(query.limit).unwrap_or(0);
        Ok(TicketPage {
            total: i64::try_from(matching.len()).unwrap_or(i64::MAX),
            tickets: matching.into_iter().skip(offset).take(limit).cloned().collect(),
            limit: query.limit,
            offset: query.offset,
        })
    }

    async fn update_ticket(&self, lookup: &TicketLookup, changes: TicketChanges) -> Result<Ticket> {
        changes.validate()?;
        let now = Utc::now();
        let mut tables = self.tables.lock().await;
        let key = tables.resolve(lookup)?;
        let index = tables
            .active_index(&key)
            .ok_or_else(|| TicketboardError::ticket_not_found(&lookup.number))?;

        let current = tables.tickets[index].clone();
        if !changes.differs_from(&current) {
            debug!(ticket = %key, "update carries no changes; keeping version {}", current.version);
            return Ok(current);
        }

        let (description, completion_criteria, status) = changes.next_fields(&current);
        {
            let superseded = &mut tables.tickets[index];
            superseded.is_active = false;
            superseded.valid_to = Some(now);
        }

        tables.last_ticket_id += 1;
        let next = Ticket {
            id: tables.last_ticket_id,
            description,
            completion_criteria,
            status,
            version: current.version + 1,
            valid_from: now,
            valid_to: None,
            is_active: true,
            updated_at: now,
            ..current
        };
        tables.tickets.push(next.clone());

        info!(ticket = %key, version = next.version, "ticket updated");
        Ok(next)
    }

    async fn delete_ticket(&self, lookup: &TicketLookup, mode: DeleteMode) -> Result<()> {
        let now = Utc::now();
        let mut tables = self.tables.lock().await;
        let key = tables.resolve(lookup)?;
        if tables.rows_of(&key).next().is_none() {
            return Err(TicketboardError::ticket_not_found(&lookup.number));
        }

        match mode {
            DeleteMode::Soft => {
                if let Some(index) = tables.active_index(&key) {
                    let ticket = &mut tables.tickets[index];
                    ticket.is_active = false;
                    ticket.valid_to = Some(now);
                    info!(ticket = %key, version = ticket.version, "ticket soft-deleted");
                } else {
                    debug!(ticket = %key, "ticket already inactive");
                }
            },
            DeleteMode::Hard => {
                let lineages: HashSet<Uuid> = tables.rows_of(&key).map(|t| t.lineage_id).collect();
                let before = tables.tickets.len();
                tables
                    .tickets
                    .retain(|t| !(t.ticket_category == key.category && t.ticket_number == key.number));
                let removed = before - tables.tickets.len();
                tables.todos.retain(|t| !lineages.contains(&t.lineage_id));
                tables.comments.retain(|c| !lineages.contains(&c.lineage_id));
                info!(ticket = %key, versions = removed, "ticket hard-deleted");
            },
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl TodoRepository for MemoryStore {
    async fn create_todo(&self, ticket: &TicketLookup, new: NewTodo) -> Result<TodoItem> {
        new.validate()?;
        let now = Utc::now();
        let mut tables = self.tables.lock().await;
        let owner = tables.active_ticket(ticket)?.clone();

        let mut order = tables.sibling_order(owner.lineage_id);
        let index = positions::insertion_index(order.len(), new.position);

        tables.last_todo_id += 1;
        let id = tables.last_todo_id;
        order.insert(index, id);
        tables.todos.push(TodoItem {
            id,
            lineage_id: owner.lineage_id,
            ticket_category: owner.ticket_category.clone(),
            ticket_number: owner.ticket_number.clone(),
            description: new.description,
            done: false,
            position: positions::as_position(index),
            created_at: now,
            updated_at: now,
        });
        tables.apply_order(&order);

        info!(ticket = %owner.key(), todo = id, position = index, "todo item created");
        let created = tables.todos.iter().find(|t| t.id == id).cloned();
        created.ok_or(TicketboardError::TodoNotFound { id })
    }

    async fn list_todos(&self, ticket: &TicketLookup) -> Result<Vec<TodoItem>> {
        let tables = self.tables.lock().await;
        let owner = tables.active_ticket(ticket)?;
        let mut todos: Vec<TodoItem> = tables
            .todos
            .iter()
            .filter(|t| t.lineage_id == owner.lineage_id)
            .cloned()
            .collect();
        todos.sort_by_key(|t| (t.position, t.id));
        Ok(todos)
    }

    async fn todos_for_lineages(&self, lineage_ids: &[Uuid]) -> Result<Vec<TodoItem>> {
        let tables = self.tables.lock().await;
        let mut todos: Vec<TodoItem> = tables
            .todos
            .iter()
            .filter(|t| lineage_ids.contains(&t.lineage_id))
            .cloned()
            .collect();
        todos.sort_by_key(|t| (t.lineage_id, t.position, t.id));
        Ok(todos)
    }

    async fn update_todo(&self, id: i64, changes: TodoChanges) -> Result<TodoItem> {
        changes.validate()?;
        let now = Utc::now();
        let mut tables = self.tables.lock().await;
        let todo = tables
            .todos
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TicketboardError::TodoNotFound { id })?;

        if let Some(description) = changes.description {
            todo.description = description;
        }
        if let Some(done) = changes.done {
            todo.done = done;
        }
        todo.updated_at = now;
        let lineage_id = todo.lineage_id;

        if let Some(position) = changes.position {
            let mut order = tables.sibling_order(lineage_id);
            positions::move_item(&mut order, id, position);
            tables.apply_order(&order);
        }

        info!(todo = id, "todo item updated");
        let updated = tables.todos.iter().find(|t| t.id == id).cloned();
        updated.ok_or(TicketboardError::TodoNotFound { id })
    }

    async fn delete_todo(&self, id: i64) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let index = tables
            .todos
            .iter()
            .position(|t| t.id == id)
            .ok_or(TicketboardError::TodoNotFound { id })?;
        let removed = tables.todos.remove(index);

        let order = tables.sibling_order(removed.lineage_id);
        tables.apply_order(&order);

        info!(todo = id, "todo item deleted");
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create_comment(&self, ticket: &TicketLookup, new: NewComment) -> Result<Comment> {
        new.validate()?;
        let now = Utc::now();
        let mut tables = self.tables.lock().await;
        let owner = tables.active_ticket(ticket)?.clone();

        tables.last_comment_id += 1;
        let comment = Comment {
            id: tables.last_comment_id,
            lineage_id: owner.lineage_id,
            ticket_category: owner.ticket_category.clone(),
            ticket_number: owner.ticket_number.clone(),
            author: new.author,
            content: new.content,
            links: new.links,
            attachments: new.attachments,
            created_at: now,
            updated_at: now,
        };
        tables.comments.push(comment.clone());

        info!(ticket = %owner.key(), comment = comment.id, "comment created");
        Ok(comment)
    }

    async fn list_comments(&self, ticket: &TicketLookup) -> Result<Vec<Comment>> {
        let tables = self.tables.lock().await;
        let owner = tables.active_ticket(ticket)?;
        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.lineage_id == owner.lineage_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.id));
        Ok(comments)
    }

    async fn update_comment(&self, id: i64, changes: CommentChanges) -> Result<Comment> {
        changes.validate()?;
        let mut tables = self.tables.lock().await;
        let comment = tables
            .comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(TicketboardError::CommentNotFound { id })?;

        if let Some(content) = changes.content {
            comment.content = content;
        }
        if changes.links.is_some() {
            comment.links = changes.links;
        }
        if changes.attachments.is_some() {
            comment.attachments = changes.attachments;
        }
        comment.updated_at = Utc::now();

        info!(comment = id, "comment updated");
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: i64) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        if tables.comments.len() == before {
            return Err(TicketboardError::CommentNotFound { id });
        }
        info!(comment = id, "comment deleted");
        Ok(())
    }
}
