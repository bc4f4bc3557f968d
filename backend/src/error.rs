use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::db::StoreError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Request type not allowed")]
    MethodNotAllowed,

    #[error("Content type not allowed: {0}")]
    ContentType(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed | Self::ContentType(_) | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> String {
        match self {
            Self::ContentType(_) | Self::Validation(_) => format!("Error: {self}"),
            Self::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Store(err) => error!(error = %err, "Document store failure"),
            other => warn!(status = status.as_u16(), error = %other, "Request rejected"),
        }
        (status, self.body()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        assert_eq!(AppError::MethodNotAllowed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::ContentType("text/plain".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn content_type_body_names_rejected_type() {
        let err = AppError::ContentType("text/plain".into());
        assert_eq!(err.body(), "Error: Content type not allowed: text/plain");
    }

    #[test]
    fn store_failures_hide_details() {
        let err = AppError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body(), "Internal server error");
    }

    #[test]
    fn store_not_found_is_still_a_server_error_unless_mapped() {
        let err = AppError::from(StoreError::not_found("items", "bolt"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
