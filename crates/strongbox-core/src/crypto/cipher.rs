//! SecretCipher trait for password-derived encryption.
//!
//! Defined in strongbox-core so services can encrypt without coupling to a
//! specific algorithm. The `PasswordCipher` adapter lives in strongbox-infra.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use secrecy::{ExposeSecret, SecretString};
use strongbox_types::crypto::CipherProfile;
use strongbox_types::error::CipherError;

/// Abstraction over passphrase-based symmetric encryption.
///
/// The envelope returned by `encrypt` must be self-describing: `decrypt`
/// needs nothing beyond the passphrase and the expected profile.
pub trait SecretCipher: Send + Sync {
    fn encrypt(
        &self,
        passphrase: &str,
        plaintext: &[u8],
        profile: CipherProfile,
    ) -> Result<Vec<u8>, CipherError>;

    fn decrypt(
        &self,
        passphrase: &str,
        envelope: &[u8],
        profile: CipherProfile,
    ) -> Result<Vec<u8>, CipherError>;
}

/// A cipher bound to the process-wide passphrase.
///
/// Produces and consumes base64 text so envelopes can live in text columns
/// and JSON strings.
#[derive(Clone)]
pub struct Sealer {
    cipher: Arc<dyn SecretCipher>,
    passphrase: SecretString,
}

impl Sealer {
    pub fn new(cipher: Arc<dyn SecretCipher>, passphrase: SecretString) -> Self {
        Self { cipher, passphrase }
    }

    /// Encrypt and base64-encode.
    pub fn seal(&self, plaintext: &[u8], profile: CipherProfile) -> Result<String, CipherError> {
        let envelope = self
            .cipher
            .encrypt(self.passphrase.expose_secret(), plaintext, profile)?;
        Ok(B64.encode(envelope))
    }

    /// Base64-decode and decrypt.
    pub fn open(&self, encoded: &str, profile: CipherProfile) -> Result<Vec<u8>, CipherError> {
        let envelope = B64
            .decode(encoded.trim())
            .map_err(|_| CipherError::Encoding)?;
        self.cipher
            .decrypt(self.passphrase.expose_secret(), &envelope, profile)
    }
}

impl std::fmt::Debug for Sealer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sealer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_sealer;

    #[test]
    fn test_seal_open_roundtrip() {
        let sealer = test_sealer("correct horse");
        let sealed = sealer.seal(b"token-123", CipherProfile::Field).unwrap();
        assert_ne!(sealed, "token-123");
        let opened = sealer.open(&sealed, CipherProfile::Field).unwrap();
        assert_eq!(opened, b"token-123");
    }

    #[test]
    fn test_open_rejects_non_base64() {
        let sealer = test_sealer("correct horse");
        let err = sealer.open("{\"not\": \"base64\"}", CipherProfile::Field).unwrap_err();
        assert!(matches!(err, CipherError::Encoding));
        assert!(err.is_decryption_error());
    }

    #[test]
    fn test_open_with_other_passphrase_fails() {
        let sealed = test_sealer("one").seal(b"x", CipherProfile::CoreSecret).unwrap();
        let err = test_sealer("two")
            .open(&sealed, CipherProfile::CoreSecret)
            .unwrap_err();
        assert!(err.is_decryption_error());
    }
}
