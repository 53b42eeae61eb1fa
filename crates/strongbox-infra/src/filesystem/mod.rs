//! Filesystem layout and script loading for Strongbox.

pub mod scripts;

use std::path::{Path, PathBuf};

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "strongbox.db";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `STRONGBOX_DATA_DIR` environment variable
/// 2. `~/.strongbox`
/// 3. `./.strongbox`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("STRONGBOX_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".strongbox");
    }

    PathBuf::from(".strongbox")
}

pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILE)
}
