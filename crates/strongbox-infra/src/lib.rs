//! Infrastructure layer for Strongbox.
//!
//! Contains implementations of the ports defined in `strongbox-core`: the
//! SQLite metadata repository and migration target, the password cipher,
//! filesystem script loading and configuration.

pub mod config;
pub mod crypto;
pub mod filesystem;
pub mod sqlite;
