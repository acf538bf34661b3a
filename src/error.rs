use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DispatchError>;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No matching function found")]
    NoMatch,

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Qdrant error: {0}")]
    Qdrant(#[from] qdrant_client::QdrantError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DispatchError {
    fn status(&self) -> StatusCode {
        match self {
            DispatchError::Validation(_) => StatusCode::BAD_REQUEST,
            DispatchError::NoMatch => StatusCode::NOT_FOUND,
            // An unknown name at codegen means the index returned a function
            // the registry does not know, e.g. a stale seeded collection
            DispatchError::UnknownFunction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
