//! JSON HTTP API for Muster.
//!
//! Exposes an axum [`Router`] over an [`Attendance`] service backed by any
//! [`AttendanceStore`]. Caller identity is taken from a header set by an
//! upstream auth proxy (see [`auth`]).

pub mod auth;
pub mod directory;
pub mod error;
pub mod handlers;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, post},
};
use muster_core::{identity::IdentityLookup, service::Attendance, store::AttendanceStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{checkins, sessions, tokens};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `MUSTER_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
  pub store_path:        PathBuf,
  /// HMAC key for subject tokens. Empty is rejected at startup.
  #[serde(default)]
  pub token_secret:      String,
  /// Base URL of the identity directory; lookups are skipped when unset.
  #[serde(default)]
  pub directory_url:     Option<String>,
  #[serde(default = "default_lookup_timeout_ms")]
  pub lookup_timeout_ms: u64,
}

impl ServerConfig {
  pub fn lookup_timeout(&self) -> Duration { Duration::from_millis(self.lookup_timeout_ms) }
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_lookup_timeout_ms() -> u64 { 2_000 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, D> {
  pub service: Arc<Attendance<S, D>>,
}

impl<S, D> Clone for AppState<S, D> {
  fn clone(&self) -> Self { Self { service: self.service.clone() } }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router.
pub fn router<S, D>(state: AppState<S, D>) -> Router
where
  S: AttendanceStore + 'static,
  D: IdentityLookup + 'static,
{
  Router::new()
    .route("/tokens", post(tokens::issue::<S, D>))
    .route("/sessions", get(sessions::list::<S, D>).post(sessions::create::<S, D>))
    .route("/sessions/{id}", get(sessions::get_one::<S, D>))
    .route("/sessions/{id}/close", post(sessions::close::<S, D>))
    .route(
      "/sessions/{id}/checkins",
      get(checkins::list::<S, D>).post(checkins::submit::<S, D>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use muster_core::{identity::NoDirectory, token::TokenSigner};
  use muster_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use crate::auth::IDENTITY_HEADER;

  type TestState = AppState<SqliteStore, NoDirectory>;

  async fn make_state() -> TestState {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let signer = TokenSigner::new("s").unwrap();
    AppState {
      service: Arc::new(Attendance::new(Arc::new(store), Arc::new(NoDirectory), signer)),
    }
  }

  async fn call(
    state: TestState,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
      builder = builder.header(IDENTITY_HEADER, user);
    }
    let req = match body {
      Some(body) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
  }

  async fn call_raw(
    state: TestState,
    uri: &str,
    user: &str,
    content_type: &str,
    body: &'static str,
  ) -> (StatusCode, Value) {
    let req = Request::builder()
      .method("POST")
      .uri(uri)
      .header(IDENTITY_HEADER, user)
      .header(header::CONTENT_TYPE, content_type)
      .body(Body::from(body))
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  async fn create_session(state: &TestState, owner: &str) -> String {
    let (status, body) =
      call(state.clone(), "POST", "/sessions", Some(owner), Some(json!({ "label": "Lab" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["session_id"].as_str().unwrap().to_string()
  }

  async fn issue_token(state: &TestState, subject: &str) -> String {
    let (status, body) = call(state.clone(), "POST", "/tokens", Some(subject), None).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
  }

  // ── Auth ─────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn missing_identity_returns_401() {
    let state = make_state().await;
    let (status, body) = call(state, "GET", "/sessions", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
  }

  // ── Tokens ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn issued_token_names_the_caller() {
    let state = make_state().await;
    let (status, body) = call(state, "POST", "/tokens", Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();
    assert!(token.starts_with("u1:"), "{token}");
    assert_eq!(token.split(':').count(), 3);
    assert_eq!(body["period_ms"], 15_000);
  }

  #[tokio::test]
  async fn subject_with_separator_cannot_get_a_token() {
    let state = make_state().await;
    let (status, body) = call(state, "POST", "/tokens", Some("a:b"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_subject");
  }

  // ── Sessions ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_list_and_get_sessions() {
    let state = make_state().await;
    let id = create_session(&state, "staff-1").await;
    create_session(&state, "staff-2").await;

    let (status, body) = call(state.clone(), "GET", "/sessions", Some("staff-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    let sessions = body.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["session_id"], id.as_str());
    assert_eq!(sessions[0]["active"], true);
    assert_eq!(sessions[0]["label"], "Lab");

    let (status, _) = call(state.clone(), "GET", &format!("/sessions/{id}"), Some("staff-1"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(state, "GET", &format!("/sessions/{id}"), Some("staff-2"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
  }

  #[tokio::test]
  async fn unknown_session_returns_404() {
    let state = make_state().await;
    let uri = format!("/sessions/{}/close", Uuid::new_v4());
    let (status, body) = call(state, "POST", &uri, Some("staff-1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
  }

  #[tokio::test]
  async fn close_is_owner_only_and_idempotent() {
    let state = make_state().await;
    let id = create_session(&state, "staff-1").await;
    let uri = format!("/sessions/{id}/close");

    let (status, _) = call(state.clone(), "POST", &uri, Some("staff-2"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for _ in 0..2 {
      let (status, body) = call(state.clone(), "POST", &uri, Some("staff-1"), None).await;
      assert_eq!(status, StatusCode::OK);
      assert_eq!(body["active"], false);
    }
  }

  // ── Check-ins ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn submit_creates_then_reports_duplicate() {
    let state = make_state().await;
    let id = create_session(&state, "staff-1").await;
    let token = issue_token(&state, "u1").await;
    let uri = format!("/sessions/{id}/checkins");

    let (status, body) =
      call(state.clone(), "POST", &uri, Some("staff-1"), Some(json!({ "token": token }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], true);
    assert_eq!(body["duplicate"], false);
    assert_eq!(body["checkin"]["subject_id"], "u1");

    let (status, body) = call(
      state.clone(),
      "POST",
      &uri,
      Some("staff-1"),
      Some(json!({ "token": format!("{token}\n") })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], false);
    assert_eq!(body["duplicate"], true);

    let (status, body) = call(state, "GET", &uri, Some("staff-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn token_errors_are_distinct_from_closed_sessions() {
    let state = make_state().await;
    let id = create_session(&state, "staff-1").await;
    let uri = format!("/sessions/{id}/checkins");

    let (status, body) =
      call(state.clone(), "POST", &uri, Some("staff-1"), Some(json!({ "token": "u1:0" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "malformed_token");

    let bogus = format!("u1:0:{}", "0".repeat(64));
    let (status, body) =
      call(state.clone(), "POST", &uri, Some("staff-1"), Some(json!({ "token": bogus }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "expired_or_invalid_token");
    assert!(body["message"].as_str().unwrap().contains("fresh code"));

    call(state.clone(), "POST", &format!("/sessions/{id}/close"), Some("staff-1"), None).await;
    let token = issue_token(&state, "u1").await;
    let (status, body) =
      call(state, "POST", &uri, Some("staff-1"), Some(json!({ "token": token }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "session_closed");
    assert!(body["message"].as_str().unwrap().contains("ended"));
  }

  #[tokio::test]
  async fn unreadable_bodies_are_bad_requests() {
    let state = make_state().await;
    let id = create_session(&state, "staff-1").await;
    let uri = format!("/sessions/{id}/checkins");

    let cases = [
      (uri.as_str(), "application/json", "{\"token\":"),
      (uri.as_str(), "application/json", "{}"),
      (uri.as_str(), "application/json", "{\"token\":42}"),
      (uri.as_str(), "text/plain", "u1:0:abc"),
      ("/sessions", "application/json", "not json"),
      ("/sessions", "application/json", "{\"label\":7}"),
    ];
    for (uri, content_type, body) in cases {
      let (status, json) = call_raw(state.clone(), uri, "staff-1", content_type, body).await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {body}");
      assert_eq!(json["error"], "bad_request", "{uri} {body}");
      assert!(!json["message"].as_str().unwrap().is_empty());
    }

    let (status, body) = call(state, "GET", &uri, Some("staff-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn non_owner_cannot_check_in_or_list() {
    let state = make_state().await;
    let id = create_session(&state, "staff-1").await;
    let token = issue_token(&state, "u1").await;
    let uri = format!("/sessions/{id}/checkins");

    let (status, _) =
      call(state.clone(), "POST", &uri, Some("staff-2"), Some(json!({ "token": token }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(state, "GET", &uri, Some("staff-2"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }
}
