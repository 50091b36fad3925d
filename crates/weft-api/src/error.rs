//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

impl From<weft_core::Error> for ApiError {
  fn from(err: weft_core::Error) -> Self {
    ApiError::BadRequest(err.to_string())
  }
}

impl From<weft_engine::Error> for ApiError {
  fn from(err: weft_engine::Error) -> Self {
    use weft_engine::Error as E;
    let message = err.to_string();
    match err {
      E::Core(_) | E::MissingOwner { .. } => ApiError::BadRequest(message),
      E::UnknownItem(_) | E::LinkNotFound { .. } | E::UnknownRelation(_) => {
        ApiError::NotFound(message)
      }
      E::ShadowConflict { .. } => ApiError::Conflict(message),
      E::Store(e) => ApiError::Store(e),
    }
  }
}
