//! Cipher profile and key-derivation parameter types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Key-derivation strength profile selected per encryption call.
///
/// `Field` is used by the legacy per-field walker; `CoreSecret` is the
/// stronger profile behind the encrypted core metadata accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CipherProfile {
    Field,
    CoreSecret,
}

impl CipherProfile {
    /// Identifier byte written into the envelope header.
    pub fn id(self) -> u8 {
        match self {
            Self::Field => 1,
            Self::CoreSecret => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Field),
            2 => Some(Self::CoreSecret),
            _ => None,
        }
    }
}

impl fmt::Display for CipherProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => write!(f, "field"),
            Self::CoreSecret => write!(f, "core_secret"),
        }
    }
}

/// Argon2id parameters for one profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u8,
}

impl KdfParams {
    /// OWASP baseline: 19 MiB, 2 passes, 1 lane.
    pub const FIELD_DEFAULT: Self = Self {
        memory_kib: 19_456,
        iterations: 2,
        parallelism: 1,
    };

    /// 64 MiB, 3 passes, 1 lane.
    pub const CORE_SECRET_DEFAULT: Self = Self {
        memory_kib: 65_536,
        iterations: 3,
        parallelism: 1,
    };
}

/// Parameters for both profiles, as configured in `config.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfTable {
    #[serde(default = "default_field")]
    pub field: KdfParams,
    #[serde(default = "default_core_secret")]
    pub core_secret: KdfParams,
}

fn default_field() -> KdfParams {
    KdfParams::FIELD_DEFAULT
}

fn default_core_secret() -> KdfParams {
    KdfParams::CORE_SECRET_DEFAULT
}

impl KdfTable {
    pub fn params(&self, profile: CipherProfile) -> KdfParams {
        match profile {
            CipherProfile::Field => self.field,
            CipherProfile::CoreSecret => self.core_secret,
        }
    }
}

impl Default for KdfTable {
    fn default() -> Self {
        Self {
            field: default_field(),
            core_secret: default_core_secret(),
        }
    }
}
