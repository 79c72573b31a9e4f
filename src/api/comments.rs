//! Comment endpoints

use super::AppState;
use super::error::ApiResult;
use super::tickets::CategoryParams;
use crate::core::{Comment, CommentChanges, NewComment, TicketLookup};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

pub async fn create_comment(
    State(state): State<AppState>,
    Path(number): Path<String>,
    params: Result<Query<CategoryParams>, QueryRejection>,
    payload: Result<Json<NewComment>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let Query(params) = params?;
    let Json(new) = payload?;
    let lookup = TicketLookup::new(number).with_category(params.category);
    let comment = state.repo.create_comment(&lookup, new).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(number): Path<String>,
    params: Result<Query<CategoryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Comment>>> {
    let Query(params) = params?;
    let lookup = TicketLookup::new(number).with_category(params.category);
    Ok(Json(state.repo.list_comments(&lookup).await?))
}

pub async fn update_comment(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CommentChanges>, JsonRejection>,
) -> ApiResult<Json<Comment>> {
    let Path(id) = id?;
    let Json(changes) = payload?;
    Ok(Json(state.repo.update_comment(id, changes).await?))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    state.repo.delete_comment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
