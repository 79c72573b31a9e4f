//! HTTP interface over the ticket store
//!
//! JSON bodies in and out. Errors use the envelope produced by
//! [`error::ApiError`].

pub mod comments;
pub mod error;
pub mod tickets;
pub mod todos;

use crate::config::{PaginationConfig, ServerConfig};
use crate::storage::Repository;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::{get, put};
use error::ApiResult;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub pagination: PaginationConfig,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, pagination: PaginationConfig) -> Self {
        Self { repo, pagination }
    }
}

/// Build the application router
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    let cors = if server.cors_permissive {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/tickets", get(tickets::list_tickets).post(tickets::create_ticket))
        .route(
            "/tickets/:number",
            get(tickets::get_ticket)
                .put(tickets::update_ticket)
                .delete(tickets::delete_ticket),
        )
        .route("/tickets/:number/todos", get(todos::list_todos).post(todos::create_todo))
        .route("/todos/:id", put(todos::update_todo).delete(todos::delete_todo))
        .route(
            "/tickets/:number/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/tickets/comments/:id",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "status": "API is running" }))
}

async fn health(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.repo.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}
