//! [`SqliteStore`]: the SQLite implementation of [`AttendanceStore`].

use std::path::Path;

use chrono::{SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use muster_core::{
  checkin::{CheckIn, NewCheckIn, RecordOutcome},
  session::{NewSession, Session},
  store::AttendanceStore,
};

use crate::{
  Result,
  encode::{CHECKIN_COLUMNS, RawCheckIn, RawSession, SESSION_COLUMNS, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An attendance store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(?path, "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── AttendanceStore impl ────────────────────────────────────────────────────

impl AttendanceStore for SqliteStore {
  type Error = crate::Error;

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(&self, input: NewSession) -> Result<Session> {
    let session = Session {
      session_id: Uuid::new_v4(),
      owner_id:   input.owner_id,
      label:      input.label,
      active:     true,
      created_at: Utc::now().trunc_subsecs(6),
    };

    let id_str    = encode_uuid(session.session_id);
    let owner     = session.owner_id.clone();
    let label     = session.label.clone();
    let at_str    = encode_dt(session.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (session_id, owner_id, label, active, created_at)
           VALUES (?1, ?2, ?3, 1, ?4)",
          rusqlite::params![id_str, owner, label, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(session)
  }

  async fn get_session(&self, session_id: Uuid) -> Result<Option<Session>> {
    let id_str = encode_uuid(session_id);

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = ?1"),
            rusqlite::params![id_str],
            RawSession::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn list_sessions(&self, owner_id: &str) -> Result<Vec<Session>> {
    let owner = owner_id.to_owned();

    let raws: Vec<RawSession> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SESSION_COLUMNS} FROM sessions
           WHERE owner_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner], RawSession::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSession::into_session).collect()
  }

  async fn deactivate_session(&self, session_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(session_id);

    // No `AND active = 1`: a repeat close still matches the row, which is
    // how an already-closed session is told apart from a missing one.
    let matched = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE sessions SET active = 0 WHERE session_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(matched > 0)
  }

  // ── Ledger ────────────────────────────────────────────────────────────────

  async fn record_checkin(&self, input: NewCheckIn) -> Result<RecordOutcome> {
    let checkin = CheckIn {
      checkin_id:      Uuid::new_v4(),
      session_id:      input.session_id,
      subject_id:      input.subject_id,
      subject_label:   input.subject_label,
      subject_contact: input.subject_contact,
      created_at:      Utc::now().trunc_subsecs(6),
    };

    let checkin_id_str = encode_uuid(checkin.checkin_id);
    let session_id_str = encode_uuid(checkin.session_id);
    let subject_id     = checkin.subject_id.clone();
    let label          = checkin.subject_label.clone();
    let contact        = checkin.subject_contact.clone();
    let at_str         = encode_dt(checkin.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO checkins (
             checkin_id, session_id, subject_id,
             subject_label, subject_contact, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (session_id, subject_id) DO NOTHING",
          rusqlite::params![checkin_id_str, session_id_str, subject_id, label, contact, at_str],
        )?)
      })
      .await?;

    if inserted == 0 {
      Ok(RecordOutcome::Duplicate)
    } else {
      Ok(RecordOutcome::Created(checkin))
    }
  }

  async fn list_checkins(&self, session_id: Uuid) -> Result<Vec<CheckIn>> {
    let id_str = encode_uuid(session_id);

    let raws: Vec<RawCheckIn> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CHECKIN_COLUMNS} FROM checkins
           WHERE session_id = ?1
           ORDER BY created_at ASC, rowid ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawCheckIn::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCheckIn::into_checkin).collect()
  }
}
