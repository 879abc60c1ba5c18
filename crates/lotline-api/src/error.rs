//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use lotline_core::{Classify, ErrorKind};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
///
/// Rendered as `{"error": <message>, "kind": <kind>, "field": <field|null>}`.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("{message}")]
  Validation { field: Option<String>, message: String },

  #[error("{message}")]
  Conflict { field: Option<String>, message: String },

  #[error("service unavailable: {0}")]
  Unavailable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a store error onto a response by its [`ErrorKind`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    let field = e.field().map(str::to_owned);
    match e.kind() {
      ErrorKind::Validation => Self::Validation { field, message: e.to_string() },
      ErrorKind::ConstraintViolation => Self::Conflict { field, message: e.to_string() },
      ErrorKind::Connectivity => Self::Unavailable(e.to_string()),
      ErrorKind::Internal => Self::Store(Box::new(e)),
    }
  }

  fn kind(&self) -> &'static str {
    match self {
      Self::NotFound(_) => "not_found",
      Self::BadRequest(_) => "bad_request",
      Self::Validation { .. } => ErrorKind::Validation.as_str(),
      Self::Conflict { .. } => ErrorKind::ConstraintViolation.as_str(),
      Self::Unavailable(_) => ErrorKind::Connectivity.as_str(),
      Self::Store(_) => ErrorKind::Internal.as_str(),
    }
  }
}

impl From<lotline_core::Error> for ApiError {
  fn from(e: lotline_core::Error) -> Self { Self::store(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Conflict { .. } => StatusCode::CONFLICT,
      ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let field = match &self {
      ApiError::Validation { field, .. } | ApiError::Conflict { field, .. } => field.clone(),
      _ => None,
    };
    let body = json!({ "error": self.to_string(), "kind": self.kind(), "field": field });
    (status, Json(body)).into_response()
  }
}
