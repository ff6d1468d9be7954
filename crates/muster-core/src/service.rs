//! [`Attendance`]: the session registry and check-in pipeline.
//!
//! Ownership is checked on every session read or mutation. Check-ins are
//! validated against the session's state at call time, and the final write
//! is a single conditional insert in the store, which alone decides whether
//! a check-in is new or a duplicate.

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{
  Error, Result,
  checkin::{CheckIn, NewCheckIn, RecordOutcome},
  clock::{Clock, SystemClock},
  identity::{IdentityLookup, SubjectProfile},
  session::{NewSession, Session},
  store::AttendanceStore,
  token::{SubjectToken, TokenSigner, TokenVerifier},
};

/// Default upper bound on a single identity-directory lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Attendance<S, D> {
  store:          Arc<S>,
  directory:      Arc<D>,
  clock:          Arc<dyn Clock>,
  signer:         TokenSigner,
  verifier:       TokenVerifier,
  lookup_timeout: Duration,
}

impl<S, D> Attendance<S, D>
where
  S: AttendanceStore,
  D: IdentityLookup,
{
  pub fn new(store: Arc<S>, directory: Arc<D>, signer: TokenSigner) -> Self {
    Self {
      store,
      directory,
      clock: Arc::new(SystemClock),
      verifier: TokenVerifier::new(signer.clone()),
      signer,
      lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
    }
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
    self.lookup_timeout = timeout;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  // ── Tokens ────────────────────────────────────────────────────────────

  /// Issue a token for `subject_id` in the current window.
  pub fn issue_token(&self, subject_id: &str) -> Result<SubjectToken> {
    let window = self.clock.current_window();
    let token = self.signer.issue(subject_id, window)?;
    tracing::debug!(subject_id, window, "issued subject token");
    Ok(token)
  }

  /// Parse and verify a presented token against the current window.
  pub fn verify_token(&self, raw: &str) -> Result<SubjectToken> {
    self.verifier.verify(raw, self.clock.current_window())
  }

  // ── Sessions ──────────────────────────────────────────────────────────

  pub async fn create_session(&self, owner_id: &str, label: Option<String>) -> Result<Session> {
    let session = self
      .store
      .create_session(NewSession { owner_id: owner_id.to_owned(), label })
      .await
      .map_err(Error::storage)?;
    tracing::info!(session_id = %session.session_id, owner_id, "session created");
    Ok(session)
  }

  /// Fetch a session regardless of owner.
  pub async fn get_session(&self, session_id: Uuid) -> Result<Session> {
    self
      .store
      .get_session(session_id)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::SessionNotFound(session_id))
  }

  /// Fetch a session, failing with [`Error::Forbidden`] unless `owner_id`
  /// owns it.
  pub async fn get_owned_session(&self, session_id: Uuid, owner_id: &str) -> Result<Session> {
    let session = self.get_session(session_id).await?;
    if !session.is_owned_by(owner_id) {
      return Err(Error::Forbidden(session_id));
    }
    Ok(session)
  }

  pub async fn list_sessions(&self, owner_id: &str) -> Result<Vec<Session>> {
    self.store.list_sessions(owner_id).await.map_err(Error::storage)
  }

  /// Close a session owned by `owner_id`. Closing a closed session is a
  /// no-op.
  pub async fn close_session(&self, session_id: Uuid, owner_id: &str) -> Result<Session> {
    let session = self.get_owned_session(session_id, owner_id).await?;
    if !session.active {
      tracing::debug!(%session_id, "session already closed");
      return Ok(session);
    }

    let existed = self
      .store
      .deactivate_session(session_id)
      .await
      .map_err(Error::storage)?;
    if !existed {
      return Err(Error::SessionNotFound(session_id));
    }

    tracing::info!(%session_id, owner_id, "session closed");
    Ok(Session { active: false, ..session })
  }

  pub async fn list_checkins(&self, session_id: Uuid, owner_id: &str) -> Result<Vec<CheckIn>> {
    self.get_owned_session(session_id, owner_id).await?;
    self.store.list_checkins(session_id).await.map_err(Error::storage)
  }

  // ── Pipeline ──────────────────────────────────────────────────────────

  /// Verify `raw_token` and record the subject as present in `session_id`
  /// on behalf of `staff_id`.
  ///
  /// A repeated check-in is reported as [`RecordOutcome::Duplicate`].
  pub async fn submit_checkin(
    &self,
    raw_token: &str,
    session_id: Uuid,
    staff_id: &str,
  ) -> Result<RecordOutcome> {
    let token = self.verify_token(raw_token).inspect_err(|e| {
      tracing::warn!(%session_id, staff_id, error = %e, "rejected check-in token");
    })?;

    let session = self.get_owned_session(session_id, staff_id).await?;
    if !session.active {
      return Err(Error::SessionClosed(session_id));
    }

    let profile = self.resolve_profile(&token.subject_id).await;
    let input = NewCheckIn::new(session_id, token.subject_id.as_str()).with_profile(profile);

    let outcome = self.store.record_checkin(input).await.map_err(Error::storage)?;
    match &outcome {
      RecordOutcome::Created(checkin) => tracing::info!(
        %session_id,
        subject_id = %checkin.subject_id,
        checkin_id = %checkin.checkin_id,
        "check-in recorded"
      ),
      RecordOutcome::Duplicate => tracing::debug!(
        %session_id,
        subject_id = %token.subject_id,
        "duplicate check-in"
      ),
    }
    Ok(outcome)
  }

  async fn resolve_profile(&self, subject_id: &str) -> SubjectProfile {
    match tokio::time::timeout(self.lookup_timeout, self.directory.lookup(subject_id)).await {
      Ok(Ok(Some(profile))) => profile,
      Ok(Ok(None)) => SubjectProfile::default(),
      Ok(Err(e)) => {
        tracing::warn!(subject_id, error = %e, "identity lookup failed");
        SubjectProfile::default()
      }
      Err(_) => {
        tracing::warn!(subject_id, timeout = ?self.lookup_timeout, "identity lookup timed out");
        SubjectProfile::default()
      }
    }
  }
}
