//! Sensitive text values and the walker's action type.
//!
//! Older snapshots mark already-encrypted strings with a textual `enc:`
//! prefix. [`SealedText`] carries that distinction as a tag instead, so a
//! plaintext that happens to begin with the marker is never mistaken for
//! ciphertext once it has been loaded.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Marker prefix used by legacy snapshots for encrypted strings.
pub const LEGACY_MARKER: &str = "enc:";

/// Direction of a field crypto walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealAction {
    Encrypt,
    Decrypt,
}

/// A sensitive text field, either still plaintext or holding encoded ciphertext.
///
/// Serializes as `{"plain": ".."}` / `{"encrypted": ".."}`. Deserializes that
/// form or a bare legacy string, where an `enc:` prefix selects `Encrypted`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "SealedRepr")]
pub enum SealedText {
    Plain(String),
    /// Base64-encoded cipher envelope, without any marker.
    Encrypted(String),
}

impl SealedText {
    pub fn plain(value: impl Into<String>) -> Self {
        Self::Plain(value.into())
    }

    /// Interpret a legacy string, sniffing the marker prefix.
    pub fn from_legacy(raw: &str) -> Self {
        match raw.strip_prefix(LEGACY_MARKER) {
            Some(ciphertext) => Self::Encrypted(ciphertext.to_string()),
            None => Self::Plain(raw.to_string()),
        }
    }

    /// Render in the legacy string form (`enc:` + ciphertext, or the plaintext).
    pub fn to_legacy(&self) -> String {
        match self {
            Self::Plain(value) => value.clone(),
            Self::Encrypted(ciphertext) => format!("{LEGACY_MARKER}{ciphertext}"),
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted(_))
    }

    pub fn as_plain(&self) -> Option<&str> {
        match self {
            Self::Plain(value) => Some(value),
            Self::Encrypted(_) => None,
        }
    }
}

impl Default for SealedText {
    fn default() -> Self {
        Self::Plain(String::new())
    }
}

impl fmt::Debug for SealedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(value) => write!(f, "Plain(<{} bytes redacted>)", value.len()),
            Self::Encrypted(ciphertext) => write!(f, "Encrypted(<{} bytes>)", ciphertext.len()),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaggedText {
    Plain(String),
    Encrypted(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SealedRepr {
    Tagged(TaggedText),
    Legacy(String),
}

impl From<SealedRepr> for SealedText {
    fn from(repr: SealedRepr) -> Self {
        match repr {
            SealedRepr::Tagged(TaggedText::Plain(value)) => Self::Plain(value),
            SealedRepr::Tagged(TaggedText::Encrypted(value)) => Self::Encrypted(value),
            SealedRepr::Legacy(raw) => Self::from_legacy(&raw),
        }
    }
}
