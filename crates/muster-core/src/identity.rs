//! Subject display metadata, resolved from an external identity directory.
//!
//! Lookups are best effort: the check-in pipeline treats failures and
//! missing profiles alike and records the check-in without metadata.

use std::{convert::Infallible, future::Future};

use serde::{Deserialize, Serialize};

/// Human-readable details copied onto a check-in at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectProfile {
  pub label:   Option<String>,
  pub contact: Option<String>,
}

/// Resolves a subject id to its [`SubjectProfile`].
pub trait IdentityLookup: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Returns `None` if the directory does not know the subject.
  fn lookup<'a>(
    &'a self,
    subject_id: &'a str,
  ) -> impl Future<Output = Result<Option<SubjectProfile>, Self::Error>> + Send + 'a;
}

/// A directory that knows nobody. Used when no directory is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDirectory;

impl IdentityLookup for NoDirectory {
  type Error = Infallible;

  async fn lookup(&self, _subject_id: &str) -> Result<Option<SubjectProfile>, Infallible> {
    Ok(None)
  }
}
