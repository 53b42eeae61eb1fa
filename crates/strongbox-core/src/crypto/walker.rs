//! Recursive field encryption over typed values.
//!
//! A type opts in by implementing [`FieldCrypto`] and listing its sensitive
//! text fields and nested composites to the [`FieldWalker`]. Fields it does
//! not list (timestamps, numbers, non-secret strings) are never touched, so
//! the set of secrets is fixed at compile time.
//!
//! Encrypting is idempotent: values already `Encrypted` are left alone.
//! Decrypting leaves `Plain` values alone, which keeps snapshots written
//! before field encryption existed importable.

use strongbox_types::crypto::CipherProfile;
use strongbox_types::error::{CipherError, SealError};
use strongbox_types::seal::{SealAction, SealedText};

use super::cipher::Sealer;

/// Implemented by every composite that carries sensitive fields.
pub trait FieldCrypto {
    /// Report each sensitive field and nested composite to the walker.
    fn visit_fields(&mut self, walker: &mut FieldWalker<'_>) -> Result<(), SealError>;
}

/// Visitor state for one walk.
pub struct FieldWalker<'a> {
    sealer: &'a Sealer,
    action: SealAction,
    path: Vec<String>,
    transformed: usize,
}

impl<'a> FieldWalker<'a> {
    fn new(sealer: &'a Sealer, action: SealAction) -> Self {
        Self {
            sealer,
            action,
            path: Vec::new(),
            transformed: 0,
        }
    }

    /// Transform a sensitive text field in place.
    pub fn sensitive(&mut self, name: &str, value: &mut SealedText) -> Result<(), SealError> {
        let path = self.child_path(name);
        if transform(self.sealer, self.action, &path, value)? {
            self.transformed += 1;
        }
        Ok(())
    }

    /// Transform an optional sensitive text field; `None` is skipped.
    pub fn sensitive_opt(
        &mut self,
        name: &str,
        value: &mut Option<SealedText>,
    ) -> Result<(), SealError> {
        match value {
            Some(inner) => self.sensitive(name, inner),
            None => Ok(()),
        }
    }

    /// Recurse into a nested composite.
    pub fn nested(&mut self, name: &str, value: &mut dyn FieldCrypto) -> Result<(), SealError> {
        self.path.push(name.to_string());
        let result = value.visit_fields(self);
        self.path.pop();
        result
    }

    fn child_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", self.path.join("."))
        }
    }
}

/// Encrypt or decrypt every sensitive field of `value`, recursively.
///
/// Returns how many fields changed. There is no partial-failure recovery: on
/// error some fields may already be transformed, so callers should discard
/// the value and start again from the source snapshot.
pub fn process(
    value: &mut dyn FieldCrypto,
    sealer: &Sealer,
    action: SealAction,
) -> Result<usize, SealError> {
    let mut walker = FieldWalker::new(sealer, action);
    value.visit_fields(&mut walker)?;
    tracing::debug!(?action, transformed = walker.transformed, "field crypto walk complete");
    Ok(walker.transformed)
}

/// Apply one action to one value. Returns whether the value changed.
pub(crate) fn transform(
    sealer: &Sealer,
    action: SealAction,
    path: &str,
    value: &mut SealedText,
) -> Result<bool, SealError> {
    let next = match (action, &*value) {
        (SealAction::Encrypt, SealedText::Plain(plaintext)) => {
            let sealed = sealer
                .seal(plaintext.as_bytes(), CipherProfile::Field)
                .map_err(|source| cipher_error(path, source))?;
            SealedText::Encrypted(sealed)
        }
        (SealAction::Decrypt, SealedText::Encrypted(ciphertext)) => {
            let bytes = sealer
                .open(ciphertext, CipherProfile::Field)
                .map_err(|source| cipher_error(path, source))?;
            let plaintext = String::from_utf8(bytes)
                .map_err(|_| cipher_error(path, CipherError::DecryptionFailed))?;
            SealedText::Plain(plaintext)
        }
        _ => return Ok(false),
    };
    *value = next;
    Ok(true)
}

fn cipher_error(path: &str, source: CipherError) -> SealError {
    SealError::Cipher {
        path: path.to_string(),
        source,
    }
}
