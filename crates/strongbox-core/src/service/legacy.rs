//! One-shot import of a pre-versioned-store settings snapshot.
//!
//! The whole snapshot is decrypted in memory with the field walker, then
//! each setting is re-persisted individually: the username as plain meta,
//! every secret through the encrypted accessors. A completion timestamp
//! guards against importing twice.

use chrono::Utc;
use strongbox_types::error::{ImportError, MetaError, SealError};
use strongbox_types::legacy::{
    ImportSummary, LegacyChatSettings, LegacySnapshot, LegacyWebSettings,
};
use strongbox_types::meta;
use strongbox_types::seal::{SealAction, SealedText};

use crate::crypto::walker::{FieldCrypto, FieldWalker, process};
use crate::repository::meta::MetaRepository;
use crate::service::meta::MetaStore;

impl FieldCrypto for LegacySnapshot {
    fn visit_fields(&mut self, walker: &mut FieldWalker<'_>) -> Result<(), SealError> {
        walker.nested("chat", &mut self.chat)?;
        walker.nested("web", &mut self.web)
    }
}

impl FieldCrypto for LegacyChatSettings {
    fn visit_fields(&mut self, walker: &mut FieldWalker<'_>) -> Result<(), SealError> {
        walker.sensitive("oauth_token", &mut self.oauth_token)?;
        walker.sensitive("refresh_token", &mut self.refresh_token)
    }
}

impl FieldCrypto for LegacyWebSettings {
    fn visit_fields(&mut self, walker: &mut FieldWalker<'_>) -> Result<(), SealError> {
        walker.sensitive("signing_key", &mut self.signing_key)?;
        walker.sensitive("session_secret", &mut self.session_secret)
    }
}

/// Import `snapshot` into the core metadata store.
///
/// Requires an unlocked store. Fails with [`ImportError::AlreadyImported`]
/// when a previous import completed, unless `force` is set. Empty secrets
/// are skipped rather than stored; a forced import also deletes any value a
/// previous import stored for them.
pub async fn import_legacy_snapshot<R: MetaRepository>(
    store: &MetaStore<R>,
    mut snapshot: LegacySnapshot,
    force: bool,
) -> Result<ImportSummary, ImportError> {
    if !force {
        match store.read_meta::<String>(meta::LEGACY_IMPORTED_AT).await {
            Ok(at) => return Err(ImportError::AlreadyImported(at)),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
    }

    let sealer = store.sealer().ok_or_else(|| MetaError::Locked {
        key: meta::LEGACY_IMPORTED_AT.to_string(),
    })?;
    let decrypted = process(&mut snapshot, sealer, SealAction::Decrypt)?;
    tracing::debug!(decrypted, "decrypted legacy snapshot");

    let mut summary = ImportSummary::default();

    store
        .store_meta(meta::CHAT_USERNAME, &snapshot.chat.username)
        .await?;
    summary.plain_keys.push(meta::CHAT_USERNAME.to_string());

    let secrets = [
        (meta::CHAT_OAUTH_TOKEN, &snapshot.chat.oauth_token),
        (meta::CHAT_REFRESH_TOKEN, &snapshot.chat.refresh_token),
        (meta::WEB_SIGNING_KEY, &snapshot.web.signing_key),
        (meta::WEB_SESSION_SECRET, &snapshot.web.session_secret),
    ];
    for (key, value) in secrets {
        match plaintext(value) {
            Some(secret) => {
                store.store_encrypted_meta(key, secret).await?;
                summary.encrypted_keys.push(key.to_string());
            }
            None => {
                // A forced re-import must not leave an earlier secret behind.
                if force {
                    store.delete_meta(key).await?;
                }
                summary.skipped_keys.push(key.to_string());
            }
        }
    }

    store
        .store_meta(meta::LEGACY_IMPORTED_AT, &Utc::now().to_rfc3339())
        .await?;
    summary.plain_keys.push(meta::LEGACY_IMPORTED_AT.to_string());

    tracing::info!(
        encrypted = summary.encrypted_keys.len(),
        skipped = summary.skipped_keys.len(),
        "imported legacy snapshot"
    );
    Ok(summary)
}

fn plaintext(value: &SealedText) -> Option<&str> {
    value.as_plain().filter(|s| !s.is_empty())
}
