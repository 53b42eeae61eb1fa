//! Core metadata (key/value) types and well-known keys.

use serde::{Deserialize, Serialize};

/// Prefix of every migration watermark key.
pub const WATERMARK_PREFIX: &str = "migration_state-";

/// Chat account name imported from a legacy snapshot (plain).
pub const CHAT_USERNAME: &str = "chat.username";
/// Chat OAuth token (encrypted).
pub const CHAT_OAUTH_TOKEN: &str = "chat.oauth_token";
/// Chat OAuth refresh token (encrypted).
pub const CHAT_REFRESH_TOKEN: &str = "chat.refresh_token";
/// Web session signing key (encrypted).
pub const WEB_SIGNING_KEY: &str = "web.signing_key";
/// Web session secret (encrypted).
pub const WEB_SESSION_SECRET: &str = "web.session_secret";
/// When a legacy snapshot was imported; guards against importing twice.
pub const LEGACY_IMPORTED_AT: &str = "legacy_import.completed_at";

/// One row of the core metadata table.
///
/// `value` is the stored text: JSON for plain entries, a base64 envelope for
/// encrypted ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub key: String,
    pub value: String,
}

/// Watermark key for a module: `"migration_state-" + module`.
pub fn watermark_key(module: &str) -> String {
    format!("{WATERMARK_PREFIX}{module}")
}

/// Inverse of [`watermark_key`].
pub fn module_from_watermark_key(key: &str) -> Option<&str> {
    key.strip_prefix(WATERMARK_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watermark_key_format() {
        assert_eq!(watermark_key("counter"), "migration_state-counter");
        assert_eq!(watermark_key("core"), "migration_state-core");
    }

    #[test]
    fn test_module_from_watermark_key() {
        assert_eq!(module_from_watermark_key("migration_state-quotes"), Some("quotes"));
        assert_eq!(module_from_watermark_key("chat.username"), None);
    }
}
