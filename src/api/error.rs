//! Mapping of [`TicketboardError`] onto HTTP responses

use crate::error::TicketboardError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

/// Error returned by every handler; renders as
/// `{"error": {"code": "...", "message": "..."}}`
#[derive(Debug)]
pub struct ApiError(pub TicketboardError);

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match &self.0 {
            TicketboardError::TicketNotFound { .. }
            | TicketboardError::TodoNotFound { .. }
            | TicketboardError::CommentNotFound { .. } => StatusCode::NOT_FOUND,
            TicketboardError::Conflict(_) => StatusCode::CONFLICT,
            TicketboardError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TicketboardError> for ApiError {
    fn from(err: TicketboardError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(TicketboardError::validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(TicketboardError::validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(TicketboardError::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let body = json!({
            "error": {
                "code": self.0.code(),
                "message": self.0.user_message(),
            }
        });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (TicketboardError::ticket_not_found("BUG-1"), StatusCode::NOT_FOUND),
            (TicketboardError::TodoNotFound { id: 3 }, StatusCode::NOT_FOUND),
            (TicketboardError::CommentNotFound { id: 3 }, StatusCode::NOT_FOUND),
            (TicketboardError::Conflict("taken".into()), StatusCode::CONFLICT),
            (TicketboardError::validation("bad"), StatusCode::UNPROCESSABLE_ENTITY),
            (TicketboardError::storage("down"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[tokio::test]
    async fn test_storage_details_stay_out_of_the_body() {
        let response = ApiError(TicketboardError::storage("password authentication failed")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "storage_error");
        assert!(!body["error"]["message"].as_str().unwrap().contains("password"));
    }
}
