//! Ticket endpoints

use super::AppState;
use super::error::{ApiError, ApiResult};
use crate::core::{
    DeleteMode, ListQuery, NewTicket, Ticket, TicketChanges, TicketLookup, TicketPage, TodoItem,
};
use crate::error::TicketboardError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub active_only: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(default)]
    pub include_todos: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct GetParams {
    pub category: Option<String>,
    #[serde(default)]
    pub include_history: bool,
    /// Embed the todo items; on by default for a single ticket
    pub include_todos: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryParams {
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    pub category: Option<String>,
    #[serde(default)]
    pub hard_delete: bool,
}

/// Update body: the changed fields, optionally naming the category
#[derive(Debug, Deserialize)]
pub struct UpdateTicketBody {
    #[serde(default, alias = "category")]
    pub ticket_category: Option<String>,
    #[serde(flatten)]
    pub changes: TicketChanges,
}

/// A ticket as the API returns it, with its todo items ordered by position
#[derive(Debug, Serialize)]
pub struct TicketView {
    #[serde(flatten)]
    pub ticket: Ticket,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub todo_items: Option<Vec<TodoItem>>,
}

impl TicketView {
    fn bare(ticket: Ticket) -> Self {
        Self {
            ticket,
            todo_items: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketViewPage {
    pub tickets: Vec<TicketView>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Attach the todo items of each ticket's lineage, in one store round trip
async fn with_todos(state: &AppState, tickets: Vec<Ticket>) -> ApiResult<Vec<TicketView>> {
    let mut lineages: Vec<Uuid> = tickets.iter().map(|t| t.lineage_id).collect();
    lineages.sort_unstable();
    lineages.dedup();

    let mut by_lineage: HashMap<Uuid, Vec<TodoItem>> = HashMap::new();
    for todo in state.repo.todos_for_lineages(&lineages).await? {
        by_lineage.entry(todo.lineage_id).or_default().push(todo);
    }

    Ok(tickets
        .into_iter()
        .map(|ticket| {
            let todo_items = by_lineage.get(&ticket.lineage_id).cloned().unwrap_or_default();
            TicketView {
                ticket,
                todo_items: Some(todo_items),
            }
        })
        .collect())
}

async fn view_with_todos(state: &AppState, ticket: Ticket) -> ApiResult<TicketView> {
    let todo_items = state.repo.todos_for_lineages(&[ticket.lineage_id]).await?;
    Ok(TicketView {
        ticket,
        todo_items: Some(todo_items),
    })
}

pub async fn create_ticket(
    State(state): State<AppState>,
    payload: Result<Json<NewTicket>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TicketView>)> {
    let Json(new) = payload?;
    let ticket = state.repo.create_ticket(new).await?;
    // A fresh lineage owns no items yet.
    let view = TicketView {
        ticket,
        todo_items: Some(Vec::new()),
    };
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn list_tickets(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<TicketViewPage>> {
    let Query(params) = params?;
    let query = ListQuery {
        category: params.category.filter(|c| !c.trim().is_empty()),
        active_only: params.active_only.unwrap_or(true),
        limit: params.limit.unwrap_or(state.pagination.default_limit),
        offset: params.offset.unwrap_or(0),
    };
    query.validate(state.pagination.max_limit)?;

    let TicketPage {
        tickets,
        total,
        limit,
        offset,
    } = state.repo.list_tickets(&query).await?;
    debug!(returned = tickets.len(), total, "listed tickets");

    // Rows always carry `todo_items`; it stays empty unless asked for.
    let tickets = if params.include_todos {
        with_todos(&state, tickets).await?
    } else {
        tickets
            .into_iter()
            .map(|ticket| TicketView {
                ticket,
                todo_items: Some(Vec::new()),
            })
            .collect()
    };
    Ok(Json(TicketViewPage {
        tickets,
        total,
        limit,
        offset,
    }))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    Path(number): Path<String>,
    params: Result<Query<GetParams>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(params) = params?;
    let lookup = TicketLookup::new(number).with_category(params.category);

    if params.include_history {
        let history = state.repo.ticket_history(&lookup).await?;
        return Ok(Json(history).into_response());
    }

    let ticket = state.repo.get_ticket(&lookup).await?;
    let view = if params.include_todos.unwrap_or(true) {
        view_with_todos(&state, ticket).await?
    } else {
        TicketView::bare(ticket)
    };
    Ok(Json(view).into_response())
}

pub async fn update_ticket(
    State(state): State<AppState>,
    Path(number): Path<String>,
    params: Result<Query<CategoryParams>, QueryRejection>,
    payload: Result<Json<UpdateTicketBody>, JsonRejection>,
) -> ApiResult<Json<TicketView>> {
    let Query(params) = params?;
    let Json(body) = payload?;

    let category = match (params.category, body.ticket_category) {
        (Some(query), Some(body)) if query != body => {
            return Err(ApiError::from(TicketboardError::validation(format!(
                "category '{body}' in the body does not match '{query}' in the query; a ticket's category cannot change"
            ))));
        },
        (query, body) => query.or(body),
    };

    let lookup = TicketLookup::new(number).with_category(category);
    let ticket = state.repo.update_ticket(&lookup, body.changes).await?;
    Ok(Json(view_with_todos(&state, ticket).await?))
}

pub async fn delete_ticket(
    State(state): State<AppState>,
    Path(number): Path<String>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> ApiResult<StatusCode> {
    let Query(params) = params?;
    let lookup = TicketLookup::new(number).with_category(params.category);
    state
        .repo
        .delete_ticket(&lookup, DeleteMode::from_flag(params.hard_delete))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
