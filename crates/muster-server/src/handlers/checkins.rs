//! Handlers for `/sessions/{id}/checkins`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/sessions/{id}/checkins` | Oldest first; owner only |
//! | `POST` | `/sessions/{id}/checkins` | Body: `{"token":"<scanned code>"}` |
//!
//! A repeated check-in is not an error: the POST answers `200` with
//! `"duplicate": true` instead of `201`.

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
};
use muster_core::{
  checkin::{CheckIn, RecordOutcome},
  identity::IdentityLookup,
  store::AttendanceStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::Identity, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /sessions/{id}/checkins`
pub async fn list<S, D>(
  State(state): State<AppState<S, D>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<CheckIn>>, ApiError>
where
  S: AttendanceStore + 'static,
  D: IdentityLookup + 'static,
{
  Ok(Json(state.service.list_checkins(id, identity.id()).await?))
}

// ─── Submit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
  pub created:   bool,
  pub duplicate: bool,
  pub checkin:   Option<CheckIn>,
}

impl From<RecordOutcome> for SubmitResponse {
  fn from(outcome: RecordOutcome) -> Self {
    match outcome {
      RecordOutcome::Created(checkin) => Self {
        created:   true,
        duplicate: false,
        checkin:   Some(checkin),
      },
      RecordOutcome::Duplicate => Self { created: false, duplicate: true, checkin: None },
    }
  }
}

/// `POST /sessions/{id}/checkins`
pub async fn submit<S, D>(
  State(state): State<AppState<S, D>>,
  identity: Identity,
  Path(id): Path<Uuid>,
  body: Result<Json<SubmitBody>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError>
where
  S: AttendanceStore + 'static,
  D: IdentityLookup + 'static,
{
  let Json(body) = body?;
  // Scanners commonly append a newline to the decoded payload.
  let outcome = state
    .service
    .submit_checkin(body.token.trim(), id, identity.id())
    .await?;
  let status = if outcome.is_created() { StatusCode::CREATED } else { StatusCode::OK };
  Ok((status, Json(outcome.into())))
}
