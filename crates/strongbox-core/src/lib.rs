//! Business logic and port definitions for Strongbox.
//!
//! This crate defines the "ports" (repository, migration target and cipher
//! traits) that the infrastructure layer implements, plus the logic built on
//! them: migration discovery and application, the typed metadata store, the
//! field crypto walker and legacy snapshot import. It depends only on
//! `strongbox-types` -- never on `strongbox-infra` or any database crate.

pub mod crypto;
pub mod migration;
pub mod repository;
pub mod retry;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
