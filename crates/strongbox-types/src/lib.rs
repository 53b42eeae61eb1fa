//! Shared domain types for Strongbox.
//!
//! This crate contains the types used across the persistence substrate:
//! core metadata entries, migration scripts and reports, cipher profiles,
//! sealed (sensitive) text, legacy snapshots, configuration, and the error
//! enums every layer returns.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod crypto;
pub mod error;
pub mod legacy;
pub mod meta;
pub mod migration;
pub mod seal;
