//! Check-ins: the durable record that a subject was verified present.
//!
//! At most one check-in exists per `(session_id, subject_id)`. The store
//! enforces this with a uniqueness constraint; a second attempt yields
//! [`RecordOutcome::Duplicate`], which is a normal outcome rather than an
//! error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::SubjectProfile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckIn {
  pub checkin_id:      Uuid,
  pub session_id:      Uuid,
  pub subject_id:      String,
  pub subject_label:   Option<String>,
  pub subject_contact: Option<String>,
  pub created_at:      DateTime<Utc>,
}

/// Input for [`AttendanceStore::record_checkin`](crate::store::AttendanceStore::record_checkin).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCheckIn {
  pub session_id:      Uuid,
  pub subject_id:      String,
  pub subject_label:   Option<String>,
  pub subject_contact: Option<String>,
}

impl NewCheckIn {
  pub fn new(session_id: Uuid, subject_id: impl Into<String>) -> Self {
    Self {
      session_id,
      subject_id: subject_id.into(),
      subject_label: None,
      subject_contact: None,
    }
  }

  pub fn with_profile(mut self, profile: SubjectProfile) -> Self {
    self.subject_label = profile.label;
    self.subject_contact = profile.contact;
    self
  }
}

/// Result of an atomic conditional insert into the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
  Created(CheckIn),
  /// A check-in for this `(session_id, subject_id)` already existed.
  Duplicate,
}

impl RecordOutcome {
  pub fn is_created(&self) -> bool { matches!(self, Self::Created(_)) }

  pub fn checkin(&self) -> Option<&CheckIn> {
    match self {
      Self::Created(c) => Some(c),
      Self::Duplicate => None,
    }
  }
}
