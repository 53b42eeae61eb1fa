//! Script discovery over a virtual directory tree.
//!
//! Leaves named `^[0-9]+\.sql$` become migrations; anything else is ignored.
//! Filenames are only sorted to make traversal deterministic; ordering is by
//! the parsed number.

use std::collections::BTreeMap;

use strongbox_types::error::MigrationError;
use strongbox_types::migration::{MigrationScript, ScriptDir};

/// Discover every migration in `tree`, keyed by sequence number.
///
/// The root directory's own name is not part of script paths. A number
/// defined twice anywhere in the tree (including `1.sql` vs `001.sql`) is a
/// [`MigrationError::DuplicateSequence`]; `0.sql` or a number that does not
/// fit in 64 bits is a [`MigrationError::InvalidSequence`].
pub fn discover(tree: &ScriptDir) -> Result<BTreeMap<u64, MigrationScript>, MigrationError> {
    let mut scripts = BTreeMap::new();
    walk(tree, "", &mut scripts)?;
    Ok(scripts)
}

fn walk(
    dir: &ScriptDir,
    prefix: &str,
    scripts: &mut BTreeMap<u64, MigrationScript>,
) -> Result<(), MigrationError> {
    let mut files: Vec<_> = dir.files.iter().collect();
    files.sort_by(|a, b| a.name.cmp(&b.name));

    for file in files {
        let path = join(prefix, &file.name);
        let Some(digits) = sequence_digits(&file.name) else {
            tracing::debug!(path = %path, "ignoring non-migration file");
            continue;
        };

        let sequence = match digits.parse::<u64>() {
            Ok(0) | Err(_) => return Err(MigrationError::InvalidSequence { path }),
            Ok(n) => n,
        };

        if let Some(existing) = scripts.get(&sequence) {
            return Err(MigrationError::DuplicateSequence {
                sequence,
                first: existing.path.clone(),
                second: path,
            });
        }

        scripts.insert(
            sequence,
            MigrationScript {
                sequence,
                path,
                body: file.body.clone(),
            },
        );
    }

    let mut dirs: Vec<_> = dir.dirs.iter().collect();
    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    for child in dirs {
        walk(child, &join(prefix, &child.name), scripts)?;
    }

    Ok(())
}

/// The numeric stem of `name` if it matches `^[0-9]+\.sql$`.
fn sequence_digits(name: &str) -> Option<&str> {
    let stem = name.strip_suffix(".sql")?;
    if !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()) {
        Some(stem)
    } else {
        None
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
