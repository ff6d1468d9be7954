//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings so that they sort
//! lexically. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use muster_core::{checkin::CheckIn, session::Session};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Raw row types ────────────────────────────────────────────────────────────

pub const SESSION_COLUMNS: &str = "session_id, owner_id, label, active, created_at";

pub const CHECKIN_COLUMNS: &str =
  "checkin_id, session_id, subject_id, subject_label, subject_contact, created_at";

/// A `sessions` row as read from SQLite, before decoding.
pub struct RawSession {
  pub session_id: String,
  pub owner_id:   String,
  pub label:      Option<String>,
  pub active:     bool,
  pub created_at: String,
}

impl RawSession {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      session_id: row.get(0)?,
      owner_id:   row.get(1)?,
      label:      row.get(2)?,
      active:     row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      session_id: decode_uuid(&self.session_id)?,
      owner_id:   self.owner_id,
      label:      self.label,
      active:     self.active,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A `checkins` row as read from SQLite, before decoding.
pub struct RawCheckIn {
  pub checkin_id:      String,
  pub session_id:      String,
  pub subject_id:      String,
  pub subject_label:   Option<String>,
  pub subject_contact: Option<String>,
  pub created_at:      String,
}

impl RawCheckIn {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      checkin_id:      row.get(0)?,
      session_id:      row.get(1)?,
      subject_id:      row.get(2)?,
      subject_label:   row.get(3)?,
      subject_contact: row.get(4)?,
      created_at:      row.get(5)?,
    })
  }

  pub fn into_checkin(self) -> Result<CheckIn> {
    Ok(CheckIn {
      checkin_id:      decode_uuid(&self.checkin_id)?,
      session_id:      decode_uuid(&self.session_id)?,
      subject_id:      self.subject_id,
      subject_label:   self.subject_label,
      subject_contact: self.subject_contact,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}
