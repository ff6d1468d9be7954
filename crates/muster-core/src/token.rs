//! Rotating subject tokens.
//!
//! A token is the ASCII string `"<subject_id>:<window>:<signature>"`, where
//! `signature` is the lowercase hex HMAC-SHA-256 of `"<subject_id>:<window>"`
//! under the process-wide secret. Tokens are never stored; they are valid
//! only while their window lies within [`TOLERANCE_WINDOWS`] of the
//! verifier's current window.
//!
//! Within the tolerance band a token can be replayed by anyone who has seen
//! it. There is no single-use nonce.

use std::{fmt, str::FromStr};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::{Choice, ConstantTimeEq};

use crate::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Number of windows on either side of the current one that still accept a
/// token.
pub const TOLERANCE_WINDOWS: i64 = 1;

const SEPARATOR: char = ':';

// ─── Token value ─────────────────────────────────────────────────────────────

/// A parsed (not necessarily verified) subject token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectToken {
  pub subject_id: String,
  pub window:     i64,
  pub signature:  String,
}

impl SubjectToken {
  /// Split a presented token into its three fields.
  ///
  /// No cryptographic work happens here; any shape problem is reported as
  /// [`Error::MalformedToken`].
  pub fn parse(raw: &str) -> Result<Self> {
    let fields: Vec<&str> = raw.split(SEPARATOR).collect();
    let [subject_id, window, signature] = fields.as_slice() else {
      return Err(Error::MalformedToken(format!(
        "expected 3 fields, found {}",
        fields.len()
      )));
    };

    if subject_id.is_empty() {
      return Err(Error::MalformedToken("empty subject id".into()));
    }
    if signature.is_empty() {
      return Err(Error::MalformedToken("empty signature".into()));
    }
    let field = *window;
    let window = field
      .parse::<i64>()
      .map_err(|_| Error::MalformedToken(format!("window {field:?} is not an integer")))?;
    // One window has exactly one spelling, the one `Display` writes.
    if window.to_string() != field {
      return Err(Error::MalformedToken(format!("window {field:?} is not canonical")));
    }

    Ok(Self {
      subject_id: (*subject_id).to_owned(),
      window,
      signature: (*signature).to_owned(),
    })
  }
}

impl FromStr for SubjectToken {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl fmt::Display for SubjectToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}", self.subject_id, self.window, self.signature)
  }
}

/// Reject subject ids that cannot be carried in the wire format.
pub fn validate_subject_id(subject_id: &str) -> Result<()> {
  if subject_id.is_empty() {
    return Err(Error::InvalidSubject("subject id must not be empty".into()));
  }
  if subject_id.contains(SEPARATOR) {
    return Err(Error::InvalidSubject(format!(
      "subject id {subject_id:?} must not contain {SEPARATOR:?}"
    )));
  }
  Ok(())
}

// ─── Signer ──────────────────────────────────────────────────────────────────

/// Produces deterministic signatures for `(subject_id, window)` pairs.
///
/// The HMAC key schedule is computed once at construction and cloned per
/// signature.
#[derive(Clone)]
pub struct TokenSigner {
  mac: HmacSha256,
}

impl TokenSigner {
  /// Build a signer from the shared secret.
  ///
  /// An empty secret is a startup-fatal [`Error::Configuration`].
  pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
    let secret = secret.as_ref();
    if secret.is_empty() {
      return Err(Error::Configuration("token secret is not set".into()));
    }
    let mac = HmacSha256::new_from_slice(secret)
      .map_err(|e| Error::Configuration(format!("unusable token secret: {e}")))?;
    Ok(Self { mac })
  }

  /// Lowercase hex HMAC-SHA-256 over `"<subject_id>:<window>"`.
  pub fn sign(&self, subject_id: &str, window: i64) -> String {
    let mut mac = self.mac.clone();
    mac.update(format!("{subject_id}{SEPARATOR}{window}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
  }

  /// Issue a token for `subject_id` in `window`.
  pub fn issue(&self, subject_id: &str, window: i64) -> Result<SubjectToken> {
    validate_subject_id(subject_id)?;
    Ok(SubjectToken {
      subject_id: subject_id.to_owned(),
      window,
      signature: self.sign(subject_id, window),
    })
  }
}

impl fmt::Debug for TokenSigner {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TokenSigner").finish_non_exhaustive()
  }
}

// ─── Verifier ────────────────────────────────────────────────────────────────

/// Checks presented tokens against the tolerance band around the current
/// window.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
  signer: TokenSigner,
}

impl TokenVerifier {
  pub fn new(signer: TokenSigner) -> Self { Self { signer } }

  /// Parse and verify `raw` as seen at `current_window`.
  ///
  /// Every candidate window in the band is signed and compared, whether or
  /// not an earlier one already matched, and each comparison is constant
  /// time.
  pub fn verify(&self, raw: &str, current_window: i64) -> Result<SubjectToken> {
    let token = SubjectToken::parse(raw)?;
    let presented = token.signature.as_bytes();

    let mut matched = Choice::from(0u8);
    for offset in -TOLERANCE_WINDOWS..=TOLERANCE_WINDOWS {
      let Some(candidate) = current_window.checked_add(offset) else {
        continue;
      };
      let expected = self.signer.sign(&token.subject_id, candidate);
      let same_window = Choice::from(u8::from(candidate == token.window));
      matched |= expected.as_bytes().ct_eq(presented) & same_window;
    }

    if bool::from(matched) {
      Ok(token)
    } else {
      Err(Error::ExpiredOrInvalidToken)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clock::window_at_millis;

  fn signer() -> TokenSigner { TokenSigner::new("s").unwrap() }

  fn verifier() -> TokenVerifier { TokenVerifier::new(signer()) }

  #[test]
  fn empty_secret_is_a_configuration_error() {
    assert!(matches!(TokenSigner::new(""), Err(Error::Configuration(_))));
    assert!(matches!(TokenSigner::new(Vec::<u8>::new()), Err(Error::Configuration(_))));
  }

  #[test]
  fn signature_is_deterministic_hex() {
    let a = signer().sign("u1", 7);
    let b = signer().sign("u1", 7);
    assert_eq!(a, b);
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_ne!(a, signer().sign("u1", 8));
    assert_ne!(a, signer().sign("u2", 7));
    assert_ne!(a, TokenSigner::new("other").unwrap().sign("u1", 7));
  }

  #[test]
  fn issued_token_has_wire_shape() {
    let token = signer().issue("u1", 0).unwrap();
    let wire = token.to_string();
    assert!(wire.starts_with("u1:0:"), "{wire}");
    assert_eq!(SubjectToken::parse(&wire).unwrap(), token);
  }

  #[test]
  fn issue_rejects_unrepresentable_subjects() {
    assert!(matches!(signer().issue("", 0), Err(Error::InvalidSubject(_))));
    assert!(matches!(signer().issue("a:b", 0), Err(Error::InvalidSubject(_))));
  }

  #[test]
  fn verifies_in_the_issuing_window() {
    for subject in ["u1", "student-42", "9f1c0e7a-1111-4c4c-9999-000000000000"] {
      for now_ms in [0_i64, 14_999, 1_700_000_000_000] {
        let w = window_at_millis(now_ms);
        let token = signer().issue(subject, w).unwrap().to_string();
        let verified = verifier().verify(&token, w).unwrap();
        assert_eq!(verified.subject_id, subject);
        assert_eq!(verified.window, w);
      }
    }
  }

  #[test]
  fn tolerance_band_is_one_window_each_side() {
    let n = 1_000;
    let token = signer().issue("u1", n).unwrap().to_string();

    for now in [n - 1, n, n + 1] {
      assert!(verifier().verify(&token, now).is_ok(), "window {now} should accept");
    }
    for now in [n - 3, n - 2, n + 2, n + 3] {
      assert!(
        matches!(verifier().verify(&token, now), Err(Error::ExpiredOrInvalidToken)),
        "window {now} should reject"
      );
    }
  }

  #[test]
  fn scenario_secret_s_subject_u1() {
    let token = signer().issue("u1", window_at_millis(0)).unwrap().to_string();
    assert!(token.starts_with("u1:0:"));

    assert!(verifier().verify(&token, window_at_millis(20_000)).is_ok());
    assert!(matches!(
      verifier().verify(&token, window_at_millis(40_000)),
      Err(Error::ExpiredOrInvalidToken)
    ));
  }

  #[test]
  fn any_single_signature_tamper_is_rejected() {
    let token = signer().issue("u1", 5).unwrap();
    for i in 0..token.signature.len() {
      let mut sig: Vec<char> = token.signature.chars().collect();
      sig[i] = if sig[i] == 'a' { 'b' } else { 'a' };
      let tampered = SubjectToken { signature: sig.into_iter().collect(), ..token.clone() };
      assert!(
        matches!(
          verifier().verify(&tampered.to_string(), 5),
          Err(Error::ExpiredOrInvalidToken)
        ),
        "tamper at {i} accepted"
      );
    }
  }

  #[test]
  fn non_hex_tamper_is_still_an_invalid_token() {
    let mut token = signer().issue("u1", 5).unwrap();
    token.signature.replace_range(0..1, "z");
    assert!(matches!(
      verifier().verify(&token.to_string(), 5),
      Err(Error::ExpiredOrInvalidToken)
    ));
  }

  #[test]
  fn rewriting_the_window_field_is_rejected() {
    let mut token = signer().issue("u1", 5).unwrap();
    token.window = 6;
    assert!(matches!(
      verifier().verify(&token.to_string(), 6),
      Err(Error::ExpiredOrInvalidToken)
    ));
  }

  #[test]
  fn signature_for_another_subject_is_rejected() {
    let other = signer().issue("u2", 5).unwrap();
    let forged = format!("u1:5:{}", other.signature);
    assert!(matches!(verifier().verify(&forged, 5), Err(Error::ExpiredOrInvalidToken)));
  }

  #[test]
  fn wrong_field_count_is_malformed() {
    for raw in ["", "u1", "u1:5", "u1:5:abc:def", "a:b:c:d:e"] {
      assert!(
        matches!(verifier().verify(raw, 5), Err(Error::MalformedToken(_))),
        "{raw:?} should be malformed"
      );
    }
  }

  #[test]
  fn non_integer_window_is_malformed() {
    for raw in ["u1:five:abc", "u1::abc", "u1:1.5:abc", "u1:99999999999999999999:abc"] {
      assert!(
        matches!(verifier().verify(raw, 5), Err(Error::MalformedToken(_))),
        "{raw:?} should be malformed"
      );
    }
  }

  #[test]
  fn non_canonical_window_is_malformed_even_when_signed() {
    for field in ["+5", "05", "005", "-0"] {
      let raw = format!("u1:{field}:{}", signer().sign("u1", 5));
      assert!(
        matches!(verifier().verify(&raw, 5), Err(Error::MalformedToken(_))),
        "{raw:?} should be malformed"
      );
    }
    let raw = format!("u1:0:{}", signer().sign("u1", 0));
    assert!(verifier().verify(&raw, 0).is_ok());
    let raw = format!("u1:-1:{}", signer().sign("u1", -1));
    assert!(verifier().verify(&raw, 0).is_ok());
  }

  #[test]
  fn empty_subject_or_signature_is_malformed() {
    assert!(matches!(SubjectToken::parse(":5:abc"), Err(Error::MalformedToken(_))));
    assert!(matches!(SubjectToken::parse("u1:5:"), Err(Error::MalformedToken(_))));
  }

  #[test]
  fn extreme_windows_do_not_overflow() {
    let token = signer().issue("u1", i64::MAX).unwrap().to_string();
    assert!(verifier().verify(&token, i64::MAX).is_ok());
    assert!(verifier().verify(&token, i64::MAX - 1).is_ok());

    let token = signer().issue("u1", i64::MIN).unwrap().to_string();
    assert!(verifier().verify(&token, i64::MIN).is_ok());
  }
}
