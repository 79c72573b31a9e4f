//! Todo item endpoints

use super::AppState;
use super::error::ApiResult;
use super::tickets::CategoryParams;
use crate::core::{NewTodo, TicketLookup, TodoChanges, TodoItem};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

pub async fn create_todo(
    State(state): State<AppState>,
    Path(number): Path<String>,
    params: Result<Query<CategoryParams>, QueryRejection>,
    payload: Result<Json<NewTodo>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TodoItem>)> {
    let Query(params) = params?;
    let Json(new) = payload?;
    let lookup = TicketLookup::new(number).with_category(params.category);
    let todo = state.repo.create_todo(&lookup, new).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn list_todos(
    State(state): State<AppState>,
    Path(number): Path<String>,
    params: Result<Query<CategoryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<TodoItem>>> {
    let Query(params) = params?;
    let lookup = TicketLookup::new(number).with_category(params.category);
    Ok(Json(state.repo.list_todos(&lookup).await?))
}

pub async fn update_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TodoChanges>, JsonRejection>,
) -> ApiResult<Json<TodoItem>> {
    let Path(id) = id?;
    let Json(changes) = payload?;
    Ok(Json(state.repo.update_todo(id, changes).await?))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    state.repo.delete_todo(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
