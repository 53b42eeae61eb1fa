//! Load a module's migration scripts from a real directory.

use std::path::Path;

use strongbox_types::migration::{ScriptDir, ScriptFile};

/// Read `path` recursively into a [`ScriptDir`].
///
/// Only `*.sql` files are read; the engine decides which of those are
/// migrations. Symlinks are followed.
pub async fn load_script_dir(path: &Path) -> std::io::Result<ScriptDir> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    read_tree(path, name).await
}

async fn read_tree(path: &Path, name: String) -> std::io::Result<ScriptDir> {
    let mut dir = ScriptDir::new(name);
    let mut entries = tokio::fs::read_dir(path).await?;

    while let Some(entry) = entries.next_entry().await? {
        let entry_path = entry.path();
        let entry_name = entry.file_name().to_string_lossy().into_owned();
        let metadata = tokio::fs::metadata(&entry_path).await?;

        if metadata.is_dir() {
            let child = Box::pin(read_tree(&entry_path, entry_name)).await?;
            dir.dirs.push(child);
        } else if metadata.is_file() && entry_name.ends_with(".sql") {
            let body = tokio::fs::read_to_string(&entry_path).await?;
            dir.files.push(ScriptFile {
                name: entry_name,
                body,
            });
        }
    }

    Ok(dir)
}
