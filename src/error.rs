use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::presenters::Envelope;

pub type Result<T> = ::core::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error")]
    Validation(Vec<String>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Too many requests, please try again later")]
    TooManyRequests,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Picks 401 for anonymous callers and 403 for signed-in ones.
    pub fn denied(signed_in: bool, anonymous: &str, forbidden: &str) -> Self {
        match signed_in {
            true => AppError::Forbidden(forbidden.to_string()),
            false => AppError::Unauthorized(anonymous.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self { AppError::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self { AppError::BadRequest(rejection.body_text()) }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let envelope = match self {
            AppError::Validation(errors) => Envelope::failure("Validation error").errors(errors),
            AppError::Internal(e) => {
                tracing::error!("internal error: {:?}", e);
                Envelope::failure("Server Error")
            },
            e => Envelope::failure(e.to_string()),
        };

        (status, envelope).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(AppError::Validation(vec![]).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Forbidden(String::new()).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn denied_depends_on_caller() {
        assert!(matches!(
            AppError::denied(false, "login", "nope"),
            AppError::Unauthorized(m) if m == "login"
        ));
        assert!(matches!(
            AppError::denied(true, "login", "nope"),
            AppError::Forbidden(m) if m == "nope"
        ));
    }
}
