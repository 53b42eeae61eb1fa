//! Core metadata repository trait.
//!
//! Raw text rows keyed by a unique string. Encoding, encryption and retries
//! are layered on top by [`crate::service::meta::MetaStore`].

use strongbox_types::error::RepositoryError;
use strongbox_types::meta::MetaEntry;

/// Trait for the process-wide key/value metadata table.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait MetaRepository: Send + Sync {
    /// Get the stored text for a key. Returns None if the key does not exist.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, RepositoryError>> + Send;

    /// Insert or replace the stored text for a key.
    fn upsert(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a key. No-op if the key does not exist.
    fn delete(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List entries whose key starts with `prefix`, ordered by key.
    fn list(
        &self,
        prefix: &str,
    ) -> impl std::future::Future<Output = Result<Vec<MetaEntry>, RepositoryError>> + Send;
}
