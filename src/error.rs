//! Error types for the activation server

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Store document error: {0}")]
  Document(#[from] json::Error),

  #[error("Key not found")]
  KeyNotFound,

  #[error("Key capacity exceeded")]
  CapacityExceeded,

  #[error("Ban list is not available in device mode")]
  BansDisabled,

  #[error("Unauthorized")]
  Unauthorized,

  #[error("{0}")]
  InvalidArgs(String),
}

impl Error {
  /// Infrastructure faults, as opposed to domain outcomes.
  pub fn is_storage(&self) -> bool {
    matches!(self, Error::Database(_) | Error::Io(_) | Error::Document(_))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      err if err.is_storage() => {
        tracing::error!("Storage failure: {err}");
        (StatusCode::INTERNAL_SERVER_ERROR, "Storage unavailable".to_string())
      }
      Error::KeyNotFound => (StatusCode::NOT_FOUND, self.to_string()),
      Error::CapacityExceeded => (StatusCode::CONFLICT, self.to_string()),
      Error::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      _ => (StatusCode::BAD_REQUEST, self.to_string()),
    };

    let body = json::json!({
      "success": false,
      "error": message
    });

    (status, axum::Json(body)).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
