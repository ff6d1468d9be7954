//! The `AttendanceStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `muster-store-sqlite`).
//! [`Attendance`](crate::service::Attendance) depends on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  checkin::{CheckIn, NewCheckIn, RecordOutcome},
  session::{NewSession, Session},
};

/// Abstraction over the `sessions` and `checkins` collections.
///
/// Backends must provide two atomic primitives: a one-way deactivation of a
/// session and a conditional insert of a check-in guarded by a uniqueness
/// constraint on `(session_id, subject_id)`. Callers never query-then-insert.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait AttendanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Persist a new, open session. The id and `created_at` are assigned by
  /// the store.
  fn create_session(
    &self,
    input: NewSession,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Retrieve a session by id. Returns `None` if not found.
  fn get_session(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  /// All sessions owned by `owner_id`, newest first.
  fn list_sessions<'a>(
    &'a self,
    owner_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Session>, Self::Error>> + Send + 'a;

  /// Mark a session inactive in a single statement.
  ///
  /// Idempotent. Returns `false` only if no such session exists.
  fn deactivate_session(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Ledger ────────────────────────────────────────────────────────────

  /// Atomically insert a check-in unless one already exists for the same
  /// `(session_id, subject_id)`.
  ///
  /// A uniqueness conflict yields [`RecordOutcome::Duplicate`], never an
  /// error. The id and `created_at` are assigned by the store.
  fn record_checkin(
    &self,
    input: NewCheckIn,
  ) -> impl Future<Output = Result<RecordOutcome, Self::Error>> + Send + '_;

  /// All check-ins for a session, oldest first.
  fn list_checkins(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CheckIn>, Self::Error>> + Send + '_;
}
