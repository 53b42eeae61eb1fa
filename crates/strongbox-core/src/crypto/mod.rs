//! Cipher port and field-level encryption.
//!
//! - `cipher`: `SecretCipher` trait and the passphrase-holding `Sealer`
//! - `walker`: typed recursive walker over `FieldCrypto` values
//! - `json`: schema-driven walker over untyped JSON snapshots

pub mod cipher;
pub mod json;
pub mod walker;
