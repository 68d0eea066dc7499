//! Error kind to HTTP status mapping

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::domain::DomainError;

impl DomainError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::ConstraintViolation { .. } | DomainError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            DomainError::TransientStore { .. } | DomainError::Cancelled => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            DomainError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_transient() {
            tracing::warn!("Request failed, retryable: {}", self);
        } else if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("{what} not found") })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(
            DomainError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DomainError::Conflict("gone".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            DomainError::Cancelled.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            DomainError::from(DbErr::Custom("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            DomainError::not_inserted("department").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
