//! Error types for `muster-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Fatal at startup: the service cannot run without a signing secret.
  #[error("configuration error: {0}")]
  Configuration(String),

  #[error("invalid subject id: {0}")]
  InvalidSubject(String),

  /// The presented token does not have the `subject:window:signature` shape.
  #[error("malformed token: {0}")]
  MalformedToken(String),

  /// Well-formed, but the signature does not match any window in the
  /// tolerance band around the current one.
  #[error("token expired or invalid")]
  ExpiredOrInvalidToken,

  #[error("session not found: {0}")]
  SessionNotFound(Uuid),

  #[error("session {0} belongs to another owner")]
  Forbidden(Uuid),

  #[error("session {0} is closed")]
  SessionClosed(Uuid),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box an arbitrary backend error as [`Error::Storage`].
  pub fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(e))
  }

  /// Stable, machine-readable discriminant used in API responses and logs.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Configuration(_) => "configuration",
      Self::InvalidSubject(_) => "invalid_subject",
      Self::MalformedToken(_) => "malformed_token",
      Self::ExpiredOrInvalidToken => "expired_or_invalid_token",
      Self::SessionNotFound(_) => "not_found",
      Self::Forbidden(_) => "forbidden",
      Self::SessionClosed(_) => "session_closed",
      Self::Storage(_) => "storage",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
