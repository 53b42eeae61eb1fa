//! Migration script and report types.
//!
//! Modules hand the migration engine a [`ScriptDir`]: a virtual directory tree
//! whose `{number}.sql` leaves are the module's migrations. The tree is either
//! embedded in the binary or loaded from disk; the engine never cares which.

use serde::{Deserialize, Serialize};

/// A leaf of the virtual script tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFile {
    pub name: String,
    pub body: String,
}

/// A directory of the virtual script tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptDir {
    pub name: String,
    pub files: Vec<ScriptFile>,
    pub dirs: Vec<ScriptDir>,
}

impl ScriptDir {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
            dirs: Vec::new(),
        }
    }

    /// Add a file (builder style).
    pub fn file(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.files.push(ScriptFile {
            name: name.into(),
            body: body.into(),
        });
        self
    }

    /// Add a subdirectory (builder style).
    pub fn dir(mut self, dir: ScriptDir) -> Self {
        self.dirs.push(dir);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.iter().all(ScriptDir::is_empty)
    }
}

/// A discovered migration, keyed by its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    pub sequence: u64,
    /// Slash-separated path relative to the tree root, e.g. `"v2/3.sql"`.
    pub path: String,
    pub body: String,
}

/// What to do when a module's scripts skip a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Apply up to the gap and stop, logging a warning about stranded scripts.
    #[default]
    Stop,
    /// Refuse to run anything while a gap exists.
    Reject,
}

/// Outcome of one `migrate` call for a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub module: String,
    pub starting_watermark: u64,
    pub watermark: u64,
    /// Sequences executed by this call, in order.
    pub applied: Vec<u64>,
    /// Discovered sequences unreachable because of a gap.
    pub stranded: Vec<u64>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}
