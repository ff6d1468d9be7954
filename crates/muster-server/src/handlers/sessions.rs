//! Handlers for `/sessions` endpoints. All of them act on behalf of the
//! calling staff member and only ever expose that member's sessions.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/sessions` | Caller's sessions, newest first |
//! | `POST` | `/sessions` | Body: `{"label":"Lecture 3"}` (label optional) |
//! | `GET`  | `/sessions/{id}` | 404 if missing, 403 if not the owner |
//! | `POST` | `/sessions/{id}/close` | Idempotent |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use muster_core::{identity::IdentityLookup, session::Session, store::AttendanceStore};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Identity, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /sessions`
pub async fn list<S, D>(
  State(state): State<AppState<S, D>>,
  identity: Identity,
) -> Result<Json<Vec<Session>>, ApiError>
where
  S: AttendanceStore + 'static,
  D: IdentityLookup + 'static,
{
  Ok(Json(state.service.list_sessions(identity.id()).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub label: Option<String>,
}

/// `POST /sessions`
pub async fn create<S, D>(
  State(state): State<AppState<S, D>>,
  identity: Identity,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AttendanceStore + 'static,
  D: IdentityLookup + 'static,
{
  let Json(body) = body?;
  let label = body.label.map(|l| l.trim().to_owned()).filter(|l| !l.is_empty());
  let session = state.service.create_session(identity.id(), label).await?;
  Ok((StatusCode::CREATED, Json(session)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /sessions/{id}`
pub async fn get_one<S, D>(
  State(state): State<AppState<S, D>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Session>, ApiError>
where
  S: AttendanceStore + 'static,
  D: IdentityLookup + 'static,
{
  Ok(Json(state.service.get_owned_session(id, identity.id()).await?))
}

// ─── Close ────────────────────────────────────────────────────────────────────

/// `POST /sessions/{id}/close`
pub async fn close<S, D>(
  State(state): State<AppState<S, D>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Session>, ApiError>
where
  S: AttendanceStore + 'static,
  D: IdentityLookup + 'static,
{
  Ok(Json(state.service.close_session(id, identity.id()).await?))
}
