//! Typed access to the core metadata table.
//!
//! Plain accessors store `serde_json` text. Encrypted accessors pass the same
//! JSON through the [`Sealer`] with the core-secret profile and store the
//! base64 envelope instead. The two families deliberately cannot read each
//! other's values: reading a secret with `read_meta` is a decode error and
//! reading plain JSON with `read_encrypted_meta` is a decryption error.

use serde::Serialize;
use serde::de::DeserializeOwned;
use strongbox_types::crypto::CipherProfile;
use strongbox_types::error::MetaError;
use strongbox_types::meta::{self, MetaEntry};

use crate::crypto::cipher::Sealer;
use crate::repository::meta::MetaRepository;
use crate::retry::{RetryPolicy, retry_transient};

/// Service over a [`MetaRepository`].
///
/// Built locked (plain accessors only); [`MetaStore::unlocked`] attaches the
/// process-wide passphrase for the encrypted accessors.
pub struct MetaStore<R> {
    repo: R,
    retry: RetryPolicy,
    sealer: Option<Sealer>,
}

impl<R: MetaRepository> MetaStore<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            retry: RetryPolicy::default(),
            sealer: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn unlocked(mut self, sealer: Sealer) -> Self {
        self.sealer = Some(sealer);
        self
    }

    pub fn sealer(&self) -> Option<&Sealer> {
        self.sealer.as_ref()
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Read and JSON-decode a value.
    ///
    /// Fails with [`MetaError::NotFound`] when the key is absent and
    /// [`MetaError::Decode`] when the stored text is not the expected JSON.
    pub async fn read_meta<T: DeserializeOwned>(&self, key: &str) -> Result<T, MetaError> {
        let raw = self.read_raw(key).await?;
        decode(key, raw.as_bytes())
    }

    /// Like [`read_meta`](Self::read_meta) but an absent key yields `T::default()`.
    pub async fn read_meta_or_default<T: DeserializeOwned + Default>(
        &self,
        key: &str,
    ) -> Result<T, MetaError> {
        match self.read_meta(key).await {
            Err(MetaError::NotFound { .. }) => Ok(T::default()),
            other => other,
        }
    }

    /// JSON-encode and upsert a value (last writer wins).
    pub async fn store_meta<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), MetaError> {
        let raw = serde_json::to_string(value).map_err(|e| MetaError::Encode {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.write_raw(key, &raw).await
    }

    /// Read, decrypt (core-secret profile) and JSON-decode a value.
    pub async fn read_encrypted_meta<T: DeserializeOwned>(&self, key: &str) -> Result<T, MetaError> {
        let sealer = self.require_sealer(key)?;
        let raw = self.read_raw(key).await?;
        let plaintext = sealer
            .open(&raw, CipherProfile::CoreSecret)
            .map_err(|source| MetaError::Decryption {
                key: key.to_string(),
                source,
            })?;
        decode(key, &plaintext)
    }

    /// JSON-encode, encrypt (core-secret profile) and upsert a value.
    pub async fn store_encrypted_meta<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), MetaError> {
        let sealer = self.require_sealer(key)?;
        let plaintext = serde_json::to_vec(value).map_err(|e| MetaError::Encode {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let sealed = sealer
            .seal(&plaintext, CipherProfile::CoreSecret)
            .map_err(|source| MetaError::Encryption {
                key: key.to_string(),
                source,
            })?;
        self.write_raw(key, &sealed).await
    }

    /// Delete a key. Deleting an absent key is not an error.
    pub async fn delete_meta(&self, key: &str) -> Result<(), MetaError> {
        retry_transient(&format!("delete meta '{key}'"), &self.retry, || {
            self.repo.delete(key)
        })
        .await?;
        tracing::debug!(key, "deleted meta key");
        Ok(())
    }

    /// Keys starting with `prefix`, ordered.
    pub async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, MetaError> {
        let entries = self.list_entries(prefix).await?;
        Ok(entries.into_iter().map(|e| e.key).collect())
    }

    /// Every module watermark, ordered by module name.
    pub async fn list_watermarks(&self) -> Result<Vec<(String, u64)>, MetaError> {
        let entries = self.list_entries(meta::WATERMARK_PREFIX).await?;
        let mut watermarks = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(module) = meta::module_from_watermark_key(&entry.key) else {
                continue;
            };
            let sequence: u64 = decode(&entry.key, entry.value.as_bytes())?;
            watermarks.push((module.to_string(), sequence));
        }
        Ok(watermarks)
    }

    async fn list_entries(&self, prefix: &str) -> Result<Vec<MetaEntry>, MetaError> {
        let entries = retry_transient(&format!("list meta '{prefix}*'"), &self.retry, || {
            self.repo.list(prefix)
        })
        .await?;
        Ok(entries)
    }

    async fn read_raw(&self, key: &str) -> Result<String, MetaError> {
        retry_transient(&format!("read meta '{key}'"), &self.retry, || self.repo.get(key))
            .await?
            .ok_or_else(|| MetaError::NotFound {
                key: key.to_string(),
            })
    }

    async fn write_raw(&self, key: &str, raw: &str) -> Result<(), MetaError> {
        retry_transient(&format!("store meta '{key}'"), &self.retry, || {
            self.repo.upsert(key, raw)
        })
        .await?;
        tracing::debug!(key, "stored meta key");
        Ok(())
    }

    fn require_sealer(&self, key: &str) -> Result<&Sealer, MetaError> {
        self.sealer.as_ref().ok_or_else(|| MetaError::Locked {
            key: key.to_string(),
        })
    }
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, MetaError> {
    serde_json::from_slice(bytes).map_err(|e| MetaError::Decode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
