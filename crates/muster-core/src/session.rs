//! Session: an organizer-owned period during which check-ins are accepted.
//!
//! Sessions are created open and can only ever be closed. There is no
//! reopening and no deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub session_id: Uuid,
  pub owner_id:   String,
  pub label:      Option<String>,
  pub active:     bool,
  pub created_at: DateTime<Utc>,
}

impl Session {
  pub fn is_owned_by(&self, owner_id: &str) -> bool { self.owner_id == owner_id }
}

/// Input for creating a session; id and timestamp are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
  pub owner_id: String,
  pub label:    Option<String>,
}
