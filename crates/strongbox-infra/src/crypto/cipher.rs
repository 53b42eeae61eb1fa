//! Argon2id + AES-256-GCM password cipher.
//!
//! Every envelope carries its own salt, nonce and key-derivation parameters,
//! so decrypting needs only the passphrase:
//!
//! ```text
//! magic "SBXE" | version (1) | profile id | m_cost u32 LE | t_cost u32 LE
//!   | p_cost u8 | salt (16) | nonce (12) | ciphertext || tag (16)
//! ```
//!
//! SECURITY: errors never contain plaintext, key material or ciphertext.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use strongbox_core::crypto::cipher::SecretCipher;
use strongbox_types::crypto::{CipherProfile, KdfParams, KdfTable};
use strongbox_types::error::CipherError;

const MAGIC: &[u8; 4] = b"SBXE";
const VERSION: u8 = 1;
const SALT_SIZE: usize = 16;
/// Nonce size for AES-256-GCM (96 bits / 12 bytes).
const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;
const KEY_SIZE: usize = 32;
const HEADER_SIZE: usize = MAGIC.len() + 1 + 1 + 4 + 4 + 1 + SALT_SIZE + NONCE_SIZE;

/// Envelopes asking for more than 1 GiB of Argon2 memory are rejected.
const MAX_MEMORY_KIB: u32 = 1024 * 1024;
const MAX_ITERATIONS: u32 = 64;

/// Password-derived envelope cipher with one Argon2 profile per [`CipherProfile`].
#[derive(Debug, Clone, Default)]
pub struct PasswordCipher {
    kdf: KdfTable,
}

impl PasswordCipher {
    pub fn new(kdf: KdfTable) -> Self {
        Self { kdf }
    }
}

impl SecretCipher for PasswordCipher {
    fn encrypt(
        &self,
        passphrase: &str,
        plaintext: &[u8],
        profile: CipherProfile,
    ) -> Result<Vec<u8>, CipherError> {
        let params = self.kdf.params(profile);
        if !params_are_sane(&params) {
            return Err(CipherError::InvalidParameters);
        }

        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);
        let key = derive_key(passphrase, &salt, &params)?;

        let cipher = Aes256Gcm::new((&key).into());
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut out = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
        out.extend_from_slice(MAGIC);
        out.push(VERSION);
        out.push(profile.id());
        out.extend_from_slice(&params.memory_kib.to_le_bytes());
        out.extend_from_slice(&params.iterations.to_le_bytes());
        out.push(params.parallelism);
        out.extend_from_slice(&salt);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(
        &self,
        passphrase: &str,
        envelope: &[u8],
        profile: CipherProfile,
    ) -> Result<Vec<u8>, CipherError> {
        let header = Header::parse(envelope)?;

        if header.profile_id != profile.id() {
            return Err(CipherError::ProfileMismatch {
                expected: profile,
                found: CipherProfile::from_id(header.profile_id)
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| format!("unknown ({})", header.profile_id)),
            });
        }
        if !params_are_sane(&header.params) {
            tracing::debug!(
                memory_kib = header.params.memory_kib,
                iterations = header.params.iterations,
                "rejecting envelope with out-of-range kdf parameters"
            );
            return Err(CipherError::DecryptionFailed);
        }

        let key = derive_key(passphrase, header.salt, &header.params)
            .map_err(|_| CipherError::DecryptionFailed)?;
        let cipher = Aes256Gcm::new((&key).into());
        cipher
            .decrypt(Nonce::from_slice(header.nonce), header.ciphertext)
            .map_err(|_| CipherError::DecryptionFailed)
    }
}

struct Header<'a> {
    profile_id: u8,
    params: KdfParams,
    salt: &'a [u8],
    nonce: &'a [u8],
    ciphertext: &'a [u8],
}

impl<'a> Header<'a> {
    fn parse(envelope: &'a [u8]) -> Result<Self, CipherError> {
        if envelope.len() < MAGIC.len() {
            return Err(CipherError::Truncated);
        }
        if &envelope[..MAGIC.len()] != MAGIC {
            return Err(CipherError::BadMagic);
        }
        if envelope.len() < HEADER_SIZE + TAG_SIZE {
            return Err(CipherError::Truncated);
        }

        let version = envelope[4];
        if version != VERSION {
            return Err(CipherError::UnsupportedVersion(version));
        }

        let (memory, rest) = envelope[6..].split_at(4);
        let (iterations, rest) = rest.split_at(4);
        let (parallelism, rest) = rest.split_at(1);
        let (salt, rest) = rest.split_at(SALT_SIZE);
        let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

        Ok(Self {
            profile_id: envelope[5],
            params: KdfParams {
                memory_kib: u32::from_le_bytes(le_bytes(memory)),
                iterations: u32::from_le_bytes(le_bytes(iterations)),
                parallelism: parallelism[0],
            },
            salt,
            nonce,
            ciphertext,
        })
    }
}

fn le_bytes(slice: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(slice);
    out
}

fn params_are_sane(params: &KdfParams) -> bool {
    params.parallelism >= 1
        && params.iterations >= 1
        && params.iterations <= MAX_ITERATIONS
        && params.memory_kib <= MAX_MEMORY_KIB
        && params.memory_kib >= 8 * u32::from(params.parallelism)
}

fn derive_key(
    passphrase: &str,
    salt: &[u8],
    params: &KdfParams,
) -> Result<[u8; KEY_SIZE], CipherError> {
    let argon_params = Params::new(
        params.memory_kib,
        params.iterations,
        u32::from(params.parallelism),
        Some(KEY_SIZE),
    )
    .map_err(|_| CipherError::InvalidParameters)?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);
    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|_| CipherError::KeyDerivationFailed)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Cheap parameters so tests don't spend seconds in Argon2.
    fn fast_cipher() -> PasswordCipher {
        let fast = KdfParams {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        };
        PasswordCipher::new(KdfTable {
            field: fast,
            core_secret: KdfParams {
                memory_kib: 128,
                ..fast
            },
        })
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let cipher = fast_cipher();
        let plaintext = b"oauth:this-is-a-secret-token";

        let envelope = cipher
            .encrypt("passphrase", plaintext, CipherProfile::CoreSecret)
            .unwrap();
        let decrypted = cipher
            .decrypt("passphrase", &envelope, CipherProfile::CoreSecret)
            .unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_envelope_is_self_describing() {
        let envelope = fast_cipher()
            .encrypt("passphrase", b"x", CipherProfile::CoreSecret)
            .unwrap();
        assert_eq!(&envelope[..4], b"SBXE");
        assert_eq!(envelope[4], 1);
        assert_eq!(envelope[5], CipherProfile::CoreSecret.id());
        assert_eq!(u32::from_le_bytes(le_bytes(&envelope[6..10])), 128);

        // A cipher configured differently still opens it from the header alone.
        let other = PasswordCipher::default();
        let decrypted = other
            .decrypt("passphrase", &envelope, CipherProfile::CoreSecret)
            .unwrap();
        assert_eq!(decrypted, b"x");
    }

    #[test]
    fn test_random_salt_and_nonce_produce_different_envelopes() {
        let cipher = fast_cipher();
        let a = cipher.encrypt("p", b"same", CipherProfile::Field).unwrap();
        let b = cipher.encrypt("p", b"same", CipherProfile::Field).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_plaintext() {
        let cipher = fast_cipher();
        let envelope = cipher.encrypt("p", b"", CipherProfile::Field).unwrap();
        assert!(cipher.decrypt("p", &envelope, CipherProfile::Field).unwrap().is_empty());
    }

    #[test]
    fn test_profile_mismatch() {
        let cipher = fast_cipher();
        let envelope = cipher.encrypt("p", b"x", CipherProfile::Field).unwrap();
        let err = cipher
            .decrypt("p", &envelope, CipherProfile::CoreSecret)
            .unwrap_err();
        assert!(matches!(err, CipherError::ProfileMismatch { .. }));
        assert!(err.is_decryption_error());
    }

    #[test]
    fn test_framing_errors() {
        let cipher = fast_cipher();
        let envelope = cipher.encrypt("p", b"secret", CipherProfile::Field).unwrap();

        let err = cipher.decrypt("p", &envelope[..20], CipherProfile::Field).unwrap_err();
        assert!(matches!(err, CipherError::Truncated));

        let mut bad_magic = envelope.clone();
        bad_magic[0] = b'X';
        let err = cipher.decrypt("p", &bad_magic, CipherProfile::Field).unwrap_err();
        assert!(matches!(err, CipherError::BadMagic));

        let mut bad_version = envelope.clone();
        bad_version[4] = 9;
        let err = cipher.decrypt("p", &bad_version, CipherProfile::Field).unwrap_err();
        assert!(matches!(err, CipherError::UnsupportedVersion(9)));

        let mut tampered = envelope.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;
        let err = cipher.decrypt("p", &tampered, CipherProfile::Field).unwrap_err();
        assert!(matches!(err, CipherError::DecryptionFailed));
    }

    #[test]
    fn test_oversized_memory_cost_is_rejected() {
        let cipher = fast_cipher();
        let mut envelope = cipher.encrypt("p", b"x", CipherProfile::Field).unwrap();
        envelope[6..10].copy_from_slice(&(MAX_MEMORY_KIB + 1).to_le_bytes());
        let err = cipher.decrypt("p", &envelope, CipherProfile::Field).unwrap_err();
        assert!(matches!(err, CipherError::DecryptionFailed));
    }

    #[test]
    fn test_invalid_configured_params_fail_encrypt() {
        let cipher = PasswordCipher::new(KdfTable {
            field: KdfParams {
                memory_kib: MAX_MEMORY_KIB * 2,
                iterations: 1,
                parallelism: 1,
            },
            ..KdfTable::default()
        });
        let err = cipher.encrypt("p", b"x", CipherProfile::Field).unwrap_err();
        assert!(matches!(err, CipherError::InvalidParameters));
    }

    #[test]
    fn test_errors_never_contain_secrets() {
        let cipher = fast_cipher();
        let envelope = cipher
            .encrypt("right", b"sk-super-secret", CipherProfile::Field)
            .unwrap();
        let err = cipher
            .decrypt("wrong", &envelope, CipherProfile::Field)
            .unwrap_err();
        let msg = format!("{err} {err:?}");
        assert!(!msg.contains("sk-super-secret"));
        assert!(!msg.contains("right"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn roundtrip_arbitrary_bytes(
            passphrase in "\\PC{0,24}",
            plaintext in prop::collection::vec(any::<u8>(), 0..256),
        ) {
            let cipher = fast_cipher();
            let envelope = cipher.encrypt(&passphrase, &plaintext, CipherProfile::Field).unwrap();
            let decrypted = cipher.decrypt(&passphrase, &envelope, CipherProfile::Field).unwrap();
            prop_assert_eq!(decrypted, plaintext);
        }

        #[test]
        fn wrong_passphrase_is_rejected(
            passphrase in "[a-z]{1,16}",
            suffix in "[A-Z0-9]{1,4}",
            plaintext in prop::collection::vec(any::<u8>(), 0..64),
        ) {
            let cipher = fast_cipher();
            let envelope = cipher.encrypt(&passphrase, &plaintext, CipherProfile::Field).unwrap();
            let wrong = format!("{passphrase}{suffix}");
            let err = cipher.decrypt(&wrong, &envelope, CipherProfile::Field).unwrap_err();
            prop_assert!(err.is_decryption_error());
        }
    }
}
