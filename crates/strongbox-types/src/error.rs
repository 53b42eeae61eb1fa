use thiserror::Error;

use crate::crypto::CipherProfile;

/// Errors from repository operations (used by trait definitions in strongbox-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    /// Lock contention or a busy database. Safe to retry.
    #[error("database busy: {0}")]
    Busy(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("{operation} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last: String,
    },
}

impl RepositoryError {
    /// Whether the error is a transient storage condition worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection | Self::Busy(_))
    }
}

/// Errors from the password-derived cipher.
///
/// IMPORTANT: These errors never include plaintext, key material, or ciphertext
/// in their Display/Debug output to prevent accidental logging of secrets.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("encryption failed")]
    EncryptionFailed,

    #[error("key derivation failed")]
    KeyDerivationFailed,

    #[error("invalid key derivation parameters")]
    InvalidParameters,

    #[error("invalid ciphertext: not base64")]
    Encoding,

    #[error("invalid ciphertext: truncated envelope")]
    Truncated,

    #[error("invalid ciphertext: bad magic header")]
    BadMagic,

    #[error("invalid ciphertext: unsupported envelope version {0}")]
    UnsupportedVersion(u8),

    #[error("ciphertext was sealed for the {found} profile, expected {expected}")]
    ProfileMismatch {
        expected: CipherProfile,
        found: String,
    },

    #[error("decryption failed")]
    DecryptionFailed,
}

impl CipherError {
    /// Whether this is a decrypt-side failure (wrong passphrase, tampered or
    /// malformed envelope) rather than an encryption or setup failure.
    pub fn is_decryption_error(&self) -> bool {
        matches!(
            self,
            Self::Encoding
                | Self::Truncated
                | Self::BadMagic
                | Self::UnsupportedVersion(_)
                | Self::ProfileMismatch { .. }
                | Self::DecryptionFailed
        )
    }
}

/// Errors from the core metadata store.
#[derive(Debug, Error)]
pub enum MetaError {
    #[error("meta key '{key}' not found")]
    NotFound { key: String },

    #[error("meta key '{key}' holds an undecodable value: {reason}")]
    Decode { key: String, reason: String },

    #[error("meta key '{key}' is encrypted but the store is locked (no passphrase)")]
    Locked { key: String },

    #[error("failed to encode value for meta key '{key}': {reason}")]
    Encode { key: String, reason: String },

    #[error("meta key '{key}' could not be decrypted: {source}")]
    Decryption {
        key: String,
        #[source]
        source: CipherError,
    },

    #[error("meta key '{key}' could not be encrypted: {source}")]
    Encryption {
        key: String,
        #[source]
        source: CipherError,
    },

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl MetaError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors from migration discovery and application.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration {sequence} is defined twice: '{first}' and '{second}'")]
    DuplicateSequence {
        sequence: u64,
        first: String,
        second: String,
    },

    #[error("'{path}' is not a valid migration number (must be a positive integer)")]
    InvalidSequence { path: String },

    #[error(
        "module '{module}' has no migration {missing} but defines later ones: {stranded:?}"
    )]
    Gap {
        module: String,
        missing: u64,
        stranded: Vec<u64>,
    },

    #[error("migration {sequence} ('{path}') of module '{module}' failed: {reason}")]
    Script {
        module: String,
        sequence: u64,
        path: String,
        reason: String,
    },

    #[error("watermark error: {0}")]
    Watermark(#[from] MetaError),
}

impl MigrationError {
    /// Packaging defects detected at discovery time, before any script runs.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateSequence { .. } | Self::InvalidSequence { .. } | Self::Gap { .. }
        )
    }
}

/// Errors from opening the store and bootstrapping its core schema.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("core bootstrap failed: {0}")]
    Bootstrap(#[from] MigrationError),
}

/// Errors from the field crypto walker.
#[derive(Debug, Error)]
pub enum SealError {
    #[error("expected a composite value at '{path}', found {found}")]
    NotComposite { path: String, found: &'static str },

    #[error("field '{path}' is declared sensitive but holds {found}, not text")]
    UnsupportedSensitiveField { path: String, found: &'static str },

    #[error("field '{path}': {source}")]
    Cipher {
        path: String,
        #[source]
        source: CipherError,
    },
}

/// Errors from importing a legacy settings snapshot.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("a legacy snapshot was already imported at {0}")]
    AlreadyImported(String),

    #[error("failed to decrypt snapshot: {0}")]
    Seal(#[from] SealError),

    #[error("failed to persist snapshot: {0}")]
    Meta(#[from] MetaError),
}
