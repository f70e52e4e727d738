//! Miscellaneous helpers: hashes, varints, wire serialization and the crate error type.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod hash160;
mod hash256;
mod result;
mod serdes;
pub mod var_int;

pub use self::hash160::{Hash160, hash160};
pub use self::hash256::{Hash256, sha256, sha256d};
pub use self::result::{Error, Result};
pub use self::serdes::Serializable;

/// Milliseconds since the Unix epoch.
#[must_use]
#[inline]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
