//! Field encryption over untyped JSON snapshots.
//!
//! Used for snapshot files whose layout is only known at runtime. A
//! [`FieldSchema`] declares which object members are sensitive strings and
//! which are nested objects; everything else is left untouched. Sensitive
//! strings use the legacy `enc:` marker form on disk.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use strongbox_types::error::SealError;
use strongbox_types::seal::{SealAction, SealedText};

use super::cipher::Sealer;
use super::walker::transform;

#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldKind {
    Sensitive,
    Nested(FieldSchema),
}

/// Declares the sensitive members of a JSON object, recursively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSchema {
    fields: BTreeMap<String, FieldKind>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sensitive(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), FieldKind::Sensitive);
        self
    }

    pub fn nested(mut self, name: impl Into<String>, schema: FieldSchema) -> Self {
        self.fields.insert(name.into(), FieldKind::Nested(schema));
        self
    }

    /// Build a schema from dotted paths such as `chat.oauth_token`.
    ///
    /// Intermediate segments become nested objects, the last segment a
    /// sensitive field.
    pub fn from_paths<S: AsRef<str>>(paths: &[S]) -> Self {
        let mut schema = Self::new();
        for path in paths {
            let segments: Vec<&str> = path.as_ref().split('.').filter(|s| !s.is_empty()).collect();
            schema.insert_path(&segments);
        }
        schema
    }

    fn insert_path(&mut self, segments: &[&str]) {
        match segments {
            [] => {}
            [leaf] => {
                self.fields.insert(leaf.to_string(), FieldKind::Sensitive);
            }
            [head, rest @ ..] => {
                let entry = self
                    .fields
                    .entry(head.to_string())
                    .or_insert_with(|| FieldKind::Nested(FieldSchema::new()));
                if let FieldKind::Sensitive = entry {
                    *entry = FieldKind::Nested(FieldSchema::new());
                }
                if let FieldKind::Nested(child) = entry {
                    child.insert_path(rest);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Encrypt or decrypt the declared fields of a JSON object in place.
///
/// Fails with [`SealError::NotComposite`] when `value` (or a member declared
/// nested) is not an object, and with [`SealError::UnsupportedSensitiveField`]
/// when a member declared sensitive holds anything but a string. Absent and
/// null members are skipped.
pub fn process_json(
    value: &mut Value,
    schema: &FieldSchema,
    sealer: &Sealer,
    action: SealAction,
) -> Result<usize, SealError> {
    match value {
        Value::Object(map) => walk_object(map, schema, sealer, action, ""),
        other => Err(SealError::NotComposite {
            path: "$".to_string(),
            found: kind_of(other),
        }),
    }
}

fn walk_object(
    map: &mut Map<String, Value>,
    schema: &FieldSchema,
    sealer: &Sealer,
    action: SealAction,
    prefix: &str,
) -> Result<usize, SealError> {
    let mut transformed = 0;

    for (name, kind) in &schema.fields {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };

        let Some(member) = map.get_mut(name) else {
            continue;
        };

        match (kind, member) {
            (_, Value::Null) => {}
            (FieldKind::Sensitive, Value::String(raw)) => {
                let mut text = SealedText::from_legacy(raw);
                if transform(sealer, action, &path, &mut text)? {
                    *raw = text.to_legacy();
                    transformed += 1;
                }
            }
            (FieldKind::Sensitive, other) => {
                return Err(SealError::UnsupportedSensitiveField {
                    path,
                    found: kind_of(other),
                });
            }
            (FieldKind::Nested(child), Value::Object(inner)) => {
                transformed += walk_object(inner, child, sealer, action, &path)?;
            }
            (FieldKind::Nested(_), other) => {
                return Err(SealError::NotComposite {
                    path,
                    found: kind_of(other),
                });
            }
        }
    }

    Ok(transformed)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
