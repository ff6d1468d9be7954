//! Caller identity extractor.
//!
//! Authentication happens upstream: a reverse proxy validates the user's
//! session and forwards their id in [`IDENTITY_HEADER`]. This server trusts
//! that header and must not be exposed without such a proxy in front.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};

use crate::error::ApiError;

pub const IDENTITY_HEADER: &str = "x-authenticated-user";

/// The authenticated caller. Acts as staff when managing sessions and as the
/// subject when requesting a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub String);

impl Identity {
  pub fn id(&self) -> &str { &self.0 }
}

/// Read the caller's identity directly from headers.
pub fn identity_from_headers(headers: &HeaderMap) -> Result<Identity, ApiError> {
  let id = headers
    .get(IDENTITY_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .ok_or(ApiError::Unauthorized)?;
  Ok(Identity(id.to_owned()))
}

impl<St> FromRequestParts<St> for Identity
where
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
    identity_from_headers(&parts.headers)
  }
}
