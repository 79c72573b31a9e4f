//! Error mapping of the HTTP layer, driven by a mocked repository

#![cfg(feature = "api")]

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use mockall::mock;
use serde_json::Value;
use std::sync::Arc;
use ticketboard::api::{AppState, router};
use ticketboard::config::{PaginationConfig, ServerConfig};
use ticketboard::core::{
    Comment, CommentChanges, DeleteMode, ListQuery, NewComment, NewTicket, NewTodo, Ticket,
    TicketChanges, TicketLookup, TicketPage, TodoChanges, TodoItem,
};
use ticketboard::storage::{CommentRepository, TicketRepository, TodoRepository};
use ticketboard::{Result, TicketboardError};
use tower::ServiceExt;
use uuid::Uuid;

mock! {
    pub Repo {}

    #[async_trait]
    impl TicketRepository for Repo {
        async fn create_ticket(&self, new: NewTicket) -> Result<Ticket>;
        async fn get_ticket(&self, lookup: &TicketLookup) -> Result<Ticket>;
        async fn ticket_history(&self, lookup: &TicketLookup) -> Result<Vec<Ticket>>;
        async fn list_tickets(&self, query: &ListQuery) -> Result<TicketPage>;
        async fn update_ticket(&self, lookup: &TicketLookup, changes: TicketChanges) -> Result<Ticket>;
        async fn delete_ticket(&self, lookup: &TicketLookup, mode: DeleteMode) -> Result<()>;
        async fn ping(&self) -> Result<()>;
    }

    #[async_trait]
    impl TodoRepository for Repo {
        async fn create_todo(&self, ticket: &TicketLookup, new: NewTodo) -> Result<TodoItem>;
        async fn list_todos(&self, ticket: &TicketLookup) -> Result<Vec<TodoItem>>;
        async fn todos_for_lineages(&self, lineage_ids: &[Uuid]) -> Result<Vec<TodoItem>>;
        async fn update_todo(&self, id: i64, changes: TodoChanges) -> Result<TodoItem>;
        async fn delete_todo(&self, id: i64) -> Result<()>;
    }

    #[async_trait]
    impl CommentRepository for Repo {
        async fn create_comment(&self, ticket: &TicketLookup, new: NewComment) -> Result<Comment>;
        async fn list_comments(&self, ticket: &TicketLookup) -> Result<Vec<Comment>>;
        async fn update_comment(&self, id: i64, changes: CommentChanges) -> Result<Comment>;
        async fn delete_comment(&self, id: i64) -> Result<()>;
    }
}

async fn call(repo: MockRepo, method: &str, uri: &str) -> (StatusCode, Value) {
    let app = router(
        AppState::new(Arc::new(repo), PaginationConfig::default()),
        &ServerConfig::default(),
    );
    let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn storage_failures_are_500_without_details() {
    let mut repo = MockRepo::new();
    repo.expect_get_ticket()
        .returning(|_| Err(TicketboardError::storage("FATAL: password authentication failed")));

    let (status, body) = call(repo, "GET", "/tickets/BUG-1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "storage_error");
    assert!(!body["error"]["message"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn health_reports_unreachable_store() {
    let mut repo = MockRepo::new();
    repo.expect_ping()
        .times(1)
        .returning(|| Err(TicketboardError::storage("connection refused")));

    let (status, _) = call(repo, "GET", "/health").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn lost_update_race_is_409() {
    let mut repo = MockRepo::new();
    repo.expect_delete_ticket()
        .withf(|lookup, mode| lookup.number == "BUG-7" && *mode == DeleteMode::Hard)
        .returning(|_, _| Err(TicketboardError::Conflict("modified concurrently".into())));

    let (status, body) = call(repo, "DELETE", "/tickets/BUG-7?hard_delete=true").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
async fn list_passes_configured_defaults() {
    let mut repo = MockRepo::new();
    repo.expect_list_tickets()
        .withf(|query| query.limit == 100 && query.offset == 0 && query.active_only)
        .returning(|query| {
            Ok(TicketPage {
                tickets: Vec::new(),
                total: 0,
                limit: query.limit,
                offset: query.offset,
            })
        });

    let (status, body) = call(repo, "GET", "/tickets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn category_in_query_reaches_the_store() {
    let mut repo = MockRepo::new();
    repo.expect_list_todos()
        .withf(|lookup| lookup.category.as_deref() == Some("bug"))
        .returning(|_| Ok(Vec::new()));

    let (status, body) = call(repo, "GET", "/tickets/BUG-1/todos?category=bug").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}
