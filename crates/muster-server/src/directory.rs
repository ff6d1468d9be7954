//! HTTP client for the external identity directory.
//!
//! The directory answers `GET {base}/subjects/{subject_id}` with a JSON
//! [`SubjectProfile`], or 404 if it does not know the subject.

use std::time::Duration;

use muster_core::identity::{IdentityLookup, SubjectProfile};
use reqwest::{StatusCode, Url};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
  #[error("invalid directory url {0:?}")]
  InvalidUrl(String),

  #[error("directory request failed: {0}")]
  Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct HttpDirectory {
  client: reqwest::Client,
  base:   Url,
}

impl HttpDirectory {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DirectoryError> {
    let base =
      Url::parse(base_url).map_err(|_| DirectoryError::InvalidUrl(base_url.to_owned()))?;
    if base.cannot_be_a_base() {
      return Err(DirectoryError::InvalidUrl(base_url.to_owned()));
    }
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client, base })
  }

  fn subject_url(&self, subject_id: &str) -> Url {
    let mut url = self.base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
      segments.pop_if_empty().push("subjects").push(subject_id);
    }
    url
  }
}

impl IdentityLookup for HttpDirectory {
  type Error = DirectoryError;

  async fn lookup(&self, subject_id: &str) -> Result<Option<SubjectProfile>, DirectoryError> {
    let res = self.client.get(self.subject_url(subject_id)).send().await?;
    if res.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let profile = res.error_for_status()?.json::<SubjectProfile>().await?;
    Ok(Some(profile))
  }
}

/// The directory selected by configuration.
#[derive(Debug, Clone)]
pub enum Directory {
  Disabled,
  Http(HttpDirectory),
}

impl Directory {
  pub fn from_config(url: Option<&str>, timeout: Duration) -> Result<Self, DirectoryError> {
    match url {
      Some(url) => Ok(Self::Http(HttpDirectory::new(url, timeout)?)),
      None => Ok(Self::Disabled),
    }
  }
}

impl IdentityLookup for Directory {
  type Error = DirectoryError;

  async fn lookup(&self, subject_id: &str) -> Result<Option<SubjectProfile>, DirectoryError> {
    match self {
      Self::Disabled => Ok(None),
      Self::Http(http) => http.lookup(subject_id).await,
    }
  }
}
