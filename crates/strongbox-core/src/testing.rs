//! In-memory fakes for unit tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use secrecy::SecretString;
use strongbox_types::crypto::CipherProfile;
use strongbox_types::error::{CipherError, RepositoryError};
use strongbox_types::meta::MetaEntry;
use strongbox_types::migration::MigrationScript;

use crate::crypto::cipher::{SecretCipher, Sealer};
use crate::migration::MigrationTarget;
use crate::repository::meta::MetaRepository;

const MAGIC: &[u8; 4] = b"TEST";
const HEADER_LEN: usize = MAGIC.len() + 1 + 8;

/// Fast reversible stand-in for the Argon2/AES cipher.
///
/// Envelope: magic, profile id, an 8-byte passphrase check, then the
/// plaintext XORed with the check.
pub struct TestCipher;

fn passphrase_check(passphrase: &str) -> [u8; 8] {
    // FNV-1a
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in passphrase.bytes() {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash.to_le_bytes()
}

fn xor(data: &[u8], key: &[u8; 8]) -> Vec<u8> {
    data.iter().enumerate().map(|(i, b)| b ^ key[i % 8]).collect()
}

impl SecretCipher for TestCipher {
    fn encrypt(
        &self,
        passphrase: &str,
        plaintext: &[u8],
        profile: CipherProfile,
    ) -> Result<Vec<u8>, CipherError> {
        let check = passphrase_check(passphrase);
        let mut out = Vec::with_capacity(HEADER_LEN + plaintext.len());
        out.extend_from_slice(MAGIC);
        out.push(profile.id());
        out.extend_from_slice(&check);
        out.extend(xor(plaintext, &check));
        Ok(out)
    }

    fn decrypt(
        &self,
        passphrase: &str,
        envelope: &[u8],
        profile: CipherProfile,
    ) -> Result<Vec<u8>, CipherError> {
        if envelope.len() < HEADER_LEN {
            return Err(CipherError::Truncated);
        }
        if &envelope[..4] != MAGIC {
            return Err(CipherError::BadMagic);
        }
        if envelope[4] != profile.id() {
            return Err(CipherError::ProfileMismatch {
                expected: profile,
                found: CipherProfile::from_id(envelope[4])
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| format!("unknown profile {}", envelope[4])),
            });
        }
        let check = passphrase_check(passphrase);
        if envelope[5..HEADER_LEN] != check {
            return Err(CipherError::DecryptionFailed);
        }
        Ok(xor(&envelope[HEADER_LEN..], &check))
    }
}

pub fn test_sealer(passphrase: &str) -> Sealer {
    Sealer::new(Arc::new(TestCipher), SecretString::from(passphrase))
}

/// Metadata table backed by a `BTreeMap`, with injectable busy failures.
#[derive(Default)]
pub struct InMemoryMetaRepository {
    rows: Mutex<BTreeMap<String, String>>,
    busy_failures: AtomicU32,
}

impl InMemoryMetaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored text for `key`, bypassing decoding.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.rows.lock().unwrap().get(key).cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.rows.lock().unwrap().clone()
    }

    /// Make the next `n` calls (of any kind) fail with `Busy`.
    pub fn fail_next_with_busy(&self, n: u32) {
        self.busy_failures.store(n, Ordering::SeqCst);
    }

    fn check_busy(&self) -> Result<(), RepositoryError> {
        let took = self
            .busy_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match took {
            Ok(_) => Err(RepositoryError::Busy("database is locked".to_string())),
            Err(_) => Ok(()),
        }
    }
}

impl MetaRepository for InMemoryMetaRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        self.check_busy()?;
        Ok(self.raw(key))
    }

    async fn upsert(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        self.check_busy()?;
        self.rows
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), RepositoryError> {
        self.check_busy()?;
        self.rows.lock().unwrap().remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<MetaEntry>, RepositoryError> {
        self.check_busy()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| MetaEntry {
                key: k.clone(),
                value: v.clone(),
            })
            .collect())
    }
}

/// Migration target that records executed sequences.
///
/// Running the same sequence twice is an error, mirroring a non-idempotent
/// `CREATE TABLE`.
#[derive(Default)]
pub struct RecordingTarget {
    executed: Mutex<Vec<u64>>,
    fail_on: Option<u64>,
    busy_remaining: AtomicU32,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, sequence: u64) -> Self {
        self.fail_on = Some(sequence);
        self
    }

    pub fn busy_times(self, n: u32) -> Self {
        self.busy_remaining.store(n, Ordering::SeqCst);
        self
    }

    pub fn executed(&self) -> Vec<u64> {
        self.executed.lock().unwrap().clone()
    }
}

impl MigrationTarget for RecordingTarget {
    async fn execute_script(&self, script: &MigrationScript) -> Result<(), RepositoryError> {
        let busy = self
            .busy_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if busy.is_ok() {
            return Err(RepositoryError::Busy("database is locked".to_string()));
        }
        if self.fail_on == Some(script.sequence) {
            return Err(RepositoryError::Query(format!(
                "syntax error in {}",
                script.path
            )));
        }
        let mut executed = self.executed.lock().unwrap();
        if executed.contains(&script.sequence) {
            return Err(RepositoryError::Query(format!(
                "migration {} already applied",
                script.sequence
            )));
        }
        executed.push(script.sequence);
        Ok(())
    }
}
