//! PostgreSQL ticket store using sqlx.
//!
//! Every mutating operation runs in one transaction. The partial unique
//! index `uq_tickets_active_key` enforces the single active version per key;
//! a violation surfaces as `Conflict` and the transaction is rolled back
//! when it is dropped uncommitted.
//!
//! Each ticket lineage owns one `ticket_lineages` row. Versions, todo items
//! and comments reference it, and todo writers lock it before touching
//! positions so they run one at a time per ticket.

use super::repository::{CommentRepository, TicketRepository, TodoRepository};
use crate::config::DatabaseConfig;
use crate::core::{
    Comment, CommentChanges, DeleteMode, ListQuery, NewComment, NewTicket, NewTodo, Ticket,
    TicketChanges, TicketKey, TicketLookup, TicketPage, TodoChanges, TodoItem, positions,
};
use crate::error::{Result, TicketboardError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct TicketRow {
    id: i64,
    lineage_id: Uuid,
    ticket_category: String,
    ticket_number: String,
    description: String,
    completion_criteria: Option<String>,
    status: String,
    version: i32,
    valid_from: DateTime<Utc>,
    valid_to: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = TicketboardError;

    fn try_from(row: TicketRow) -> Result<Self> {
        let status = row.status.parse().map_err(|_| {
            TicketboardError::storage(format!("ticket {} has unknown status '{}'", row.id, row.status))
        })?;
        Ok(Self {
            id: row.id,
            lineage_id: row.lineage_id,
            ticket_category: row.ticket_category,
            ticket_number: row.ticket_number,
            description: row.description,
            completion_criteria: row.completion_criteria,
            status,
            version: row.version,
            valid_from: row.valid_from,
            valid_to: row.valid_to,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_tickets(rows: Vec<TicketRow>) -> Result<Vec<Ticket>> {
    rows.into_iter().map(Ticket::try_from).collect()
}

/// Ticket store backed by a PostgreSQL pool
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a pool against `database.url`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| TicketboardError::Config("database.url is not set".into()))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(url)
            .await?;
        info!(max_connections = config.max_connections, "PgStore connected");
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("database schema is up to date");
        Ok(())
    }

    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn resolve_key(conn: &mut PgConnection, lookup: &TicketLookup) -> Result<TicketKey> {
    if lookup.category.is_some() {
        return lookup.resolve(&[], &[]);
    }

    let rows: Vec<(String, Option<bool>)> = sqlx::query_as(
        "SELECT ticket_category, bool_or(is_active) FROM tickets
         WHERE ticket_number = $1
         GROUP BY ticket_category
         ORDER BY ticket_category",
    )
    .bind(&lookup.number)
    .fetch_all(&mut *conn)
    .await?;

    let active: Vec<String> = rows
        .iter()
        .filter(|(_, active)| active.unwrap_or(false))
        .map(|(category, _)| category.clone())
        .collect();
    let any: Vec<String> = rows.into_iter().map(|(category, _)| category).collect();
    lookup.resolve(&active, &any)
}

async fn fetch_active(conn: &mut PgConnection, key: &TicketKey) -> Result<Option<Ticket>> {
    let row: Option<TicketRow> = sqlx::query_as(
        "SELECT * FROM tickets
         WHERE ticket_category = $1 AND ticket_number = $2 AND is_active",
    )
    .bind(&key.category)
    .bind(&key.number)
    .fetch_optional(&mut *conn)
    .await?;
    row.map(Ticket::try_from).transpose()
}

/// The active version for a lookup; children may only be attached to it
async fn require_active(conn: &mut PgConnection, lookup: &TicketLookup) -> Result<Ticket> {
    let key = resolve_key(conn, lookup).await?;
    fetch_active(conn, &key)
        .await?
        .ok_or_else(|| TicketboardError::ticket_not_found(&lookup.number))
}

/// Lock the lineage row for the rest of the transaction; false when it is gone
async fn lock_lineage(conn: &mut PgConnection, lineage_id: Uuid) -> Result<bool> {
    // NO KEY UPDATE still admits the KEY SHARE locks taken by FK checks of
    // concurrent ticket versions.
    let locked: Option<Uuid> = sqlx::query_scalar(
        "SELECT lineage_id FROM ticket_lineages WHERE lineage_id = $1 FOR NO KEY UPDATE",
    )
    .bind(lineage_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(locked.is_some())
}

/// Lock the lineage that owns a todo item
async fn lock_todo_lineage(conn: &mut PgConnection, id: i64) -> Result<Uuid> {
    let lineage_id: Uuid = sqlx::query_scalar("SELECT lineage_id FROM todo_items WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(TicketboardError::TodoNotFound { id })?;
    if !lock_lineage(conn, lineage_id).await? {
        return Err(TicketboardError::TodoNotFound { id });
    }
    Ok(lineage_id)
}

fn push_list_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ListQuery) {
    if query.active_only {
        builder.push(" AND is_active");
    }
    if let Some(category) = &query.category {
        builder.push(" AND ticket_category = ").push_bind(category.clone());
    }
}

#[async_trait]
impl TicketRepository for PgStore {
    async fn create_ticket(&self, new: NewTicket) -> Result<Ticket> {
        let key = new.resolve_key(Utc::now())?;
        let mut tx = self.pool.begin().await?;

        if fetch_active(&mut tx, &key).await?.is_some() {
            return Err(TicketboardError::Conflict(format!(
                "an active ticket {key} already exists"
            )));
        }

        let lineage_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO ticket_lineages (lineage_id, ticket_category, ticket_number)
             VALUES ($1, $2, $3)",
        )
        .bind(lineage_id)
        .bind(&key.category)
        .bind(&key.number)
        .execute(&mut *tx)
        .await?;

        let row: TicketRow = sqlx::query_as(
            "INSERT INTO tickets (
                lineage_id, ticket_category, ticket_number, description,
                completion_criteria, status, version, valid_from
            ) VALUES ($1, $2, $3, $4, $5, $6, 1, now())
            RETURNING *",
        )
        .bind(lineage_id)
        .bind(&key.category)
        .bind(&key.number)
        .bind(&new.description)
        .bind(&new.completion_criteria)
        .bind(new.status.unwrap_or_default().as_str())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        let ticket = Ticket::try_from(row)?;
        info!(ticket = %key, lineage = %ticket.lineage_id, "ticket created");
        Ok(ticket)
    }

    async fn get_ticket(&self, lookup: &TicketLookup) -> Result<Ticket> {
        let mut conn = self.pool.acquire().await?;
        let ticket = require_active(&mut conn, lookup).await?;
        debug!(ticket = %ticket.key(), version = ticket.version, "ticket loaded");
        Ok(ticket)
    }

    async fn ticket_history(&self, lookup: &TicketLookup) -> Result<Vec<Ticket>> {
        let mut conn = self.pool.acquire().await?;
        let key = resolve_key(&mut conn, lookup).await?;

        // The active row wins; otherwise the newest row marks the latest lineage.
        let lineage_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT lineage_id FROM tickets
             WHERE ticket_category = $1 AND ticket_number = $2
             ORDER BY is_active DESC, id DESC
             LIMIT 1",
        )
        .bind(&key.category)
        .bind(&key.number)
        .fetch_optional(&mut *conn)
        .await?;
        let lineage_id = lineage_id.ok_or_else(|| TicketboardError::ticket_not_found(&lookup.number))?;

        let rows: Vec<TicketRow> =
            sqlx::query_as("SELECT * FROM tickets WHERE lineage_id = $1 ORDER BY version ASC")
                .bind(lineage_id)
                .fetch_all(&mut *conn)
                .await?;
        into_tickets(rows)
    }

    async fn list_tickets(&self, query: &ListQuery) -> Result<TicketPage> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tickets WHERE TRUE");
        push_list_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM tickets WHERE TRUE");
        push_list_filters(&mut select, query);
        select
            .push(" ORDER BY updated_at DESC, id DESC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);
        let rows: Vec<TicketRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok(TicketPage {
            tickets: into_tickets(rows)?,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }

    async fn update_ticket(&self, lookup: &TicketLookup, changes: TicketChanges) -> Result<Ticket> {
        changes.validate()?;
        let mut tx = self.pool.begin().await?;
        let key = resolve_key(&mut tx, lookup).await?;
        let current = fetch_active(&mut tx, &key)
            .await?
            .ok_or_else(|| TicketboardError::ticket_not_found(&lookup.number))?;

        if !changes.differs_from(&current) {
            debug!(ticket = %key, "update carries no changes; keeping version {}", current.version);
            return Ok(current);
        }

        // A concurrent update that committed first leaves nothing to close.
        let closed = sqlx::query(
            "UPDATE tickets SET is_active = FALSE, valid_to = now()
             WHERE id = $1 AND is_active",
        )
        .bind(current.id)
        .execute(&mut *tx)
        .await?;
        if closed.rows_affected() == 0 {
            return Err(TicketboardError::Conflict(format!(
                "ticket {key} was modified concurrently; re-read and retry"
            )));
        }

        let (description, completion_criteria, status) = changes.next_fields(&current);
        let row: TicketRow = sqlx::query_as(
            "INSERT INTO tickets (
                lineage_id, ticket_category, ticket_number, description,
                completion_criteria, status, version, valid_from, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, now(), $8)
            RETURNING *",
        )
        .bind(current.lineage_id)
        .bind(&key.category)
        .bind(&key.number)
        .bind(&description)
        .bind(&completion_criteria)
        .bind(status.as_str())
        .bind(current.version + 1)
        .bind(current.created_at)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        let ticket = Ticket::try_from(row)?;
        info!(ticket = %key, version = ticket.version, "ticket updated");
        Ok(ticket)
    }

    async fn delete_ticket(&self, lookup: &TicketLookup, mode: DeleteMode) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let key = resolve_key(&mut tx, lookup).await?;

        match mode {
            DeleteMode::Soft => {
                let closed = sqlx::query(
                    "UPDATE tickets SET is_active = FALSE, valid_to = now()
                     WHERE ticket_category = $1 AND ticket_number = $2 AND is_active",
                )
                .bind(&key.category)
                .bind(&key.number)
                .execute(&mut *tx)
                .await?;

                if closed.rows_affected() == 0 {
                    let exists: bool = sqlx::query_scalar(
                        "SELECT EXISTS (
                            SELECT 1 FROM tickets WHERE ticket_category = $1 AND ticket_number = $2
                        )",
                    )
                    .bind(&key.category)
                    .bind(&key.number)
                    .fetch_one(&mut *tx)
                    .await?;
                    if !exists {
                        return Err(TicketboardError::ticket_not_found(&lookup.number));
                    }
                    debug!(ticket = %key, "ticket already inactive");
                } else {
                    info!(ticket = %key, "ticket soft-deleted");
                }
            },
            DeleteMode::Hard => {
                // Versions, todo items and comments cascade from their lineage.
                let lineages: Vec<Uuid> = sqlx::query_scalar(
                    "DELETE FROM ticket_lineages WHERE ticket_category = $1 AND ticket_number = $2
                     RETURNING lineage_id",
                )
                .bind(&key.category)
                .bind(&key.number)
                .fetch_all(&mut *tx)
                .await?;
                if lineages.is_empty() {
                    return Err(TicketboardError::ticket_not_found(&lookup.number));
                }
                info!(ticket = %key, lineages = lineages.len(), "ticket hard-deleted");
            },
        }

        tx.commit().await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl TodoRepository for PgStore {
    async fn create_todo(&self, ticket: &TicketLookup, new: NewTodo) -> Result<TodoItem> {
        new.validate()?;
        let mut tx = self.pool.begin().await?;
        let owner = require_active(&mut tx, ticket).await?;
        if !lock_lineage(&mut tx, owner.lineage_id).await? {
            return Err(TicketboardError::ticket_not_found(&ticket.number));
        }

        let len: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todo_items WHERE lineage_id = $1")
            .bind(owner.lineage_id)
            .fetch_one(&mut *tx)
            .await?;
        let index = positions::insertion_index(usize::try_from(len).unwrap_or(0), new.position);
        let position = positions::as_position(index);

        sqlx::query(
            "UPDATE todo_items SET position = position + 1
             WHERE lineage_id = $1 AND position >= $2",
        )
        .bind(owner.lineage_id)
        .bind(position)
        .execute(&mut *tx)
        .await?;

        let todo: TodoItem = sqlx::query_as(
            "INSERT INTO todo_items (lineage_id, ticket_category, ticket_number, description, position)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(owner.lineage_id)
        .bind(&owner.ticket_category)
        .bind(&owner.ticket_number)
        .bind(&new.description)
        .bind(position)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(ticket = %owner.key(), todo = todo.id, position, "todo item created");
        Ok(todo)
    }

    async fn list_todos(&self, ticket: &TicketLookup) -> Result<Vec<TodoItem>> {
        let mut conn = self.pool.acquire().await?;
        let owner = require_active(&mut conn, ticket).await?;
        let todos = sqlx::query_as(
            "SELECT * FROM todo_items WHERE lineage_id = $1 ORDER BY position ASC, id ASC",
        )
        .bind(owner.lineage_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(todos)
    }

    async fn todos_for_lineages(&self, lineage_ids: &[Uuid]) -> Result<Vec<TodoItem>> {
        if lineage_ids.is_empty() {
            return Ok(Vec::new());
        }
        let todos = sqlx::query_as(
            "SELECT * FROM todo_items WHERE lineage_id = ANY($1)
             ORDER BY lineage_id, position ASC, id ASC",
        )
        .bind(lineage_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(todos)
    }

    async fn update_todo(&self, id: i64, changes: TodoChanges) -> Result<TodoItem> {
        changes.validate()?;
        let mut tx = self.pool.begin().await?;
        let lineage_id = lock_todo_lineage(&mut tx, id).await?;

        let updated = sqlx::query(
            "UPDATE todo_items
             SET description = COALESCE($2, description),
                 done = COALESCE($3, done),
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(&changes.description)
        .bind(changes.done)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(TicketboardError::TodoNotFound { id });
        }

        if let Some(position) = changes.position {
            let mut order: Vec<i64> = sqlx::query_scalar(
                "SELECT id FROM todo_items WHERE lineage_id = $1
                 ORDER BY position ASC, id ASC",
            )
            .bind(lineage_id)
            .fetch_all(&mut *tx)
            .await?;
            positions::move_item(&mut order, id, position);
            let (ids, new_positions): (Vec<i64>, Vec<i32>) =
                positions::resequence(&order).into_iter().unzip();

            sqlx::query(
                "UPDATE todo_items AS t SET position = v.position
                 FROM UNNEST($1::BIGINT[], $2::INTEGER[]) AS v(id, position)
                 WHERE t.id = v.id AND t.position <> v.position",
            )
            .bind(&ids)
            .bind(&new_positions)
            .execute(&mut *tx)
            .await?;
        }

        let todo: TodoItem = sqlx::query_as("SELECT * FROM todo_items WHERE id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(todo = id, "todo item updated");
        Ok(todo)
    }

    async fn delete_todo(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let lineage_id = lock_todo_lineage(&mut tx, id).await?;
        let position: i32 =
            sqlx::query_scalar("DELETE FROM todo_items WHERE id = $1 RETURNING position")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(TicketboardError::TodoNotFound { id })?;

        sqlx::query(
            "UPDATE todo_items SET position = position - 1
             WHERE lineage_id = $1 AND position > $2",
        )
        .bind(lineage_id)
        .bind(position)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(todo = id, "todo item deleted");
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn create_comment(&self, ticket: &TicketLookup, new: NewComment) -> Result<Comment> {
        new.validate()?;
        let mut tx = self.pool.begin().await?;
        let owner = require_active(&mut tx, ticket).await?;

        let comment: Comment = sqlx::query_as(
            "INSERT INTO ticket_comments (
                lineage_id, ticket_category, ticket_number, author, content, links, attachments
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *",
        )
        .bind(owner.lineage_id)
        .bind(&owner.ticket_category)
        .bind(&owner.ticket_number)
        .bind(&new.author)
        .bind(&new.content)
        .bind(&new.links)
        .bind(&new.attachments)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(ticket = %owner.key(), comment = comment.id, "comment created");
        Ok(comment)
    }

    async fn list_comments(&self, ticket: &TicketLookup) -> Result<Vec<Comment>> {
        let mut conn = self.pool.acquire().await?;
        let owner = require_active(&mut conn, ticket).await?;
        let comments = sqlx::query_as(
            "SELECT * FROM ticket_comments WHERE lineage_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(owner.lineage_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(comments)
    }

    async fn update_comment(&self, id: i64, changes: CommentChanges) -> Result<Comment> {
        changes.validate()?;
        let comment: Comment = sqlx::query_as(
            "UPDATE ticket_comments
             SET content = COALESCE($2, content),
                 links = COALESCE($3, links),
                 attachments = COALESCE($4, attachments),
                 updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&changes.content)
        .bind(&changes.links)
        .bind(&changes.attachments)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TicketboardError::CommentNotFound { id })?;

        info!(comment = id, "comment updated");
        Ok(comment)
    }

    async fn delete_comment(&self, id: i64) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM ticket_comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(TicketboardError::CommentNotFound { id });
        }
        info!(comment = id, "comment deleted");
        Ok(())
    }
}
