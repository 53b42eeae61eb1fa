//! Cryptographic adapters for Strongbox.
//!
//! - `cipher`: Argon2id + AES-256-GCM password cipher implementing `SecretCipher`

pub mod cipher;
