//! Error types for ordered map operations.

use crate::key::KeyId;
use thiserror::Error;

/// Result type alias for map operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// `first`, `last`, `pop` or `shift` on a map without entries.
    #[error("map is empty")]
    Empty,

    /// The object behind a weak key has been dropped.
    #[error("key {0} refers to an object that is no longer available")]
    StaleKey(KeyId),

    /// A `Key::Id` that names no entry was used where a live key is needed.
    #[error("no entry is stored under key {0}")]
    UnknownKey(KeyId),

    /// A typed map rejected a value.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    #[test]
    fn display_empty() {
        assert_eq!(Error::Empty.to_string(), "map is empty");
    }

    #[test]
    fn display_stale_key_names_the_id() {
        let id = KeyId::from(KeyData::from_ffi((1u64 << 32) | 7));
        let msg = Error::StaleKey(id).to_string();
        assert!(msg.contains(&id.to_string()));
        assert!(msg.contains("no longer available"));
    }

    #[test]
    fn display_type_mismatch() {
        let err = Error::TypeMismatch {
            expected: "string".into(),
            found: "array".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("expected string"));
        assert!(msg.contains("found array"));
    }
}
