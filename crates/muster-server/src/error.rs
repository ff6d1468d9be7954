//! API error type and axum `IntoResponse` implementation.
//!
//! Every error kind maps to its own status code and a message that tells the
//! operator what to do next. An attendee with a stale code is asked for a
//! fresh one; a closed session is reported as ended.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use muster_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Core(#[from] CoreError),
}

impl ApiError {
  fn status_and_message(&self) -> (StatusCode, &'static str, String) {
    match self {
      ApiError::Unauthorized => (
        StatusCode::UNAUTHORIZED,
        "unauthorized",
        "Sign in to continue.".to_string(),
      ),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m.clone()),
      ApiError::Core(e) => {
        let status = match e {
          CoreError::InvalidSubject(_) | CoreError::MalformedToken(_) => StatusCode::BAD_REQUEST,
          CoreError::ExpiredOrInvalidToken => StatusCode::UNPROCESSABLE_ENTITY,
          CoreError::SessionNotFound(_) => StatusCode::NOT_FOUND,
          CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
          CoreError::SessionClosed(_) => StatusCode::CONFLICT,
          CoreError::Configuration(_) | CoreError::Storage(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
          }
        };
        let message = match e {
          CoreError::MalformedToken(_) => {
            "This is not a check-in code. Ask the attendee to show their code again.".to_string()
          }
          CoreError::ExpiredOrInvalidToken => {
            "This check-in code has expired or is invalid. Ask the attendee to refresh and \
             present a fresh code."
              .to_string()
          }
          CoreError::SessionNotFound(_) => "Session not found.".to_string(),
          CoreError::Forbidden(_) => "You can only manage sessions you own.".to_string(),
          CoreError::SessionClosed(_) => {
            "This session has ended and is no longer accepting check-ins.".to_string()
          }
          CoreError::Storage(_) => "Storage is unavailable. Please retry.".to_string(),
          CoreError::Configuration(_) => "The server is misconfigured.".to_string(),
          CoreError::InvalidSubject(m) => m.clone(),
        };
        (status, e.kind(), message)
      }
    }
  }
}

/// Body rejections are answered in the same JSON envelope as every other
/// error rather than axum's plain-text default.
impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, kind, message) = self.status_and_message();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut res = (status, Json(json!({ "error": kind, "message": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer realm=\"muster\""));
    }
    res
  }
}
