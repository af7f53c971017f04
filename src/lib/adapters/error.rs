use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::core::TodoError;

pub const TODO_NOT_FOUND_BODY: &str = "404 - Todo nebylo nalezeno";
pub const PAGE_NOT_FOUND_BODY: &str = "404 - Stránka nenalezena";
pub const INTERNAL_ERROR_BODY: &str = "500 - Chyba na straně serveru";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Todo not found")]
    TodoNotFound,
    #[error("Page not found")]
    PageNotFound,
    #[error("Internal error: {0}")]
    Internal(#[from] TodoError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::TodoNotFound => (StatusCode::NOT_FOUND, TODO_NOT_FOUND_BODY).into_response(),
            AppError::PageNotFound => (StatusCode::NOT_FOUND, PAGE_NOT_FOUND_BODY).into_response(),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response()
            }
        }
    }
}
