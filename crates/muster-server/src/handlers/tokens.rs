//! Handler for `/tokens`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/tokens` | Issues a token for the caller; call again every window |

use axum::{Json, extract::State};
use muster_core::{
  clock::WINDOW_PERIOD_MS,
  identity::IdentityLookup,
  store::AttendanceStore,
};
use serde::Serialize;

use crate::{AppState, auth::Identity, error::ApiError};

#[derive(Debug, Serialize)]
pub struct TokenResponse {
  /// Wire form, ready to be rendered as a QR code.
  pub token:     String,
  pub window:    i64,
  pub period_ms: i64,
}

/// `POST /tokens`
pub async fn issue<S, D>(
  State(state): State<AppState<S, D>>,
  identity: Identity,
) -> Result<Json<TokenResponse>, ApiError>
where
  S: AttendanceStore + 'static,
  D: IdentityLookup + 'static,
{
  let token = state.service.issue_token(identity.id())?;
  Ok(Json(TokenResponse {
    window:    token.window,
    token:     token.to_string(),
    period_ms: WINDOW_PERIOD_MS,
  }))
}
