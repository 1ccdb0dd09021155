//! Service-level error type shared by every handler.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::db::StoreError;
use crate::export::RenderError;
use crate::generation::GenerationError;
use crate::validation::{ValidationError, ValidationErrors};
use crate::ErrorResponse;

pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate content. Please try again.";
pub const NOT_FOUND_MESSAGE: &str = "Record not found";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
    /// Absent and not-owned resources are reported identically.
    #[error("record not found")]
    NotFoundOrForbidden,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("store failed: {0}")]
    Store(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Single-field validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(ValidationErrors::single(ValidationError::new(field, message)))
    }
}

impl From<actix_web::error::BlockingError> for ServiceError {
    fn from(_: actix_web::error::BlockingError) -> Self {
        Self::Render(RenderError::Cancelled)
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Generation(_) => StatusCode::BAD_GATEWAY,
            Self::NotFoundOrForbidden => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Render(_) | Self::Store(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::Validation(errors) => ErrorResponse::bad_request(&errors.summary())
                .with_fields(errors.errors().to_vec()),
            Self::Generation(_) => ErrorResponse::new("GenerationFailed", GENERATION_FAILED_MESSAGE),
            Self::NotFoundOrForbidden => ErrorResponse::not_found(NOT_FOUND_MESSAGE),
            Self::Forbidden(message) => ErrorResponse::new("Forbidden", message),
            Self::Render(e) => {
                log::error!("Document rendering failed: {}", e);
                ErrorResponse::internal_error("Failed to render document")
            }
            Self::Store(e) => {
                log::error!("Store operation failed: {}", e);
                ErrorResponse::internal_error("Internal server error")
            }
            Self::Internal(message) => {
                log::error!("Internal error: {}", message);
                ErrorResponse::internal_error(message)
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
