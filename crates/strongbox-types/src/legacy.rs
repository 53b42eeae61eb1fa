//! Settings snapshot written by releases that predate the versioned store.
//!
//! The snapshot is a single JSON document. Sensitive strings are either plain
//! (very old exports) or `enc:`-prefixed ciphertext sealed with the field
//! profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::seal::SealedText;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySnapshot {
    pub chat: LegacyChatSettings,
    #[serde(default)]
    pub web: LegacyWebSettings,
    pub exported_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyChatSettings {
    pub username: String,
    pub oauth_token: SealedText,
    #[serde(default)]
    pub refresh_token: SealedText,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyWebSettings {
    #[serde(default)]
    pub signing_key: SealedText,
    #[serde(default)]
    pub session_secret: SealedText,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Keys written by a legacy import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub plain_keys: Vec<String>,
    pub encrypted_keys: Vec<String>,
    /// Sensitive fields that were empty in the snapshot and left unset.
    pub skipped_keys: Vec<String>,
}
