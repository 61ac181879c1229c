use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("{0}")]
  Validation(String),

  #[error("{0} not found")]
  NotFound(&'static str),

  #[error("Only administrators can perform this action")]
  Forbidden,

  #[error("{0}")]
  Conflict(String),

  #[error("Insufficient credits")]
  InsufficientCredits,

  #[error("Missing or malformed authorization header")]
  Unauthorized,

  #[error("Invalid or expired token")]
  InvalidToken,

  #[error("Internal error: {0}")]
  Internal(String),
}

impl Error {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }

  pub fn conflict(message: impl Into<String>) -> Self {
    Self::Conflict(message.into())
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    // business failures keep the `200 + status:false` envelope
    let status = match &self {
      Error::Validation(_)
      | Error::NotFound(_)
      | Error::Forbidden
      | Error::Conflict(_)
      | Error::InsufficientCredits => StatusCode::OK,
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::InvalidToken => StatusCode::FORBIDDEN,
      Error::Database(_) | Error::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };

    let message = match &self {
      Error::Database(err) => {
        error!("Database error: {err}");
        "Internal server error".to_string()
      }
      Error::Internal(err) => {
        error!("Internal error: {err}");
        "Internal server error".to_string()
      }
      other => other.to_string(),
    };

    let body = json::json!({
      "status": false,
      "message": message,
    });

    (status, Json(body)).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
