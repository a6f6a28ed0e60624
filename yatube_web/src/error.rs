use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use yatube_core::{entity::prelude::DbErr, error::ViewError};

/// Failures that end a request with a 500.
#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    View(#[from] ViewError),

    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("failed to render page")]
    Render(#[from] serde_json::Error),
}

impl ResponseError for WebError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        tracing::error!(error = ?self, "request failed");
        HttpResponse::build(self.status_code()).finish()
    }
}
