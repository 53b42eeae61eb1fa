//! Repository trait definitions (ports).
//!
//! Implementations live in strongbox-infra.

pub mod meta;
