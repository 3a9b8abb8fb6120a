//! Per-map configuration: capabilities, equality modes and display separator.

use serde::{Deserialize, Serialize};

/// Separator used by `join` when none is given.
pub const DEFAULT_SEPARATOR: &str = ", ";

/// How two keys or two values are compared.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Equality {
    /// Same variant and equal.
    #[default]
    Strict,
    /// Scripting-language style comparison (see `LooseEq`).
    Loose,
}

/// Behaviour switches checked by `set` and `remove`.
///
/// - `associative`: caller-supplied keys are kept. Without it keys are
///   positional and renumbered to `0..n` after every deletion.
/// - `unique`: inserting a value that is already present is a no-op.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub associative: bool,
    pub unique: bool,
}

impl Capabilities {
    /// Plain indexed list: positional keys, duplicates allowed.
    pub const LIST: Self = Self {
        associative: false,
        unique: false,
    };
    pub const MAP: Self = Self {
        associative: true,
        unique: false,
    };
    pub const SET: Self = Self {
        associative: false,
        unique: true,
    };
    pub const UNIQUE_MAP: Self = Self {
        associative: true,
        unique: true,
    };
}

/// Construction-time configuration of an `OrderedMap`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub capabilities: Capabilities,
    pub key_equality: Equality,
    pub value_equality: Equality,
    pub separator: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::LIST,
            key_equality: Equality::Strict,
            value_equality: Equality::Strict,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl MapConfig {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            ..Self::default()
        }
    }

    pub fn associative(mut self, on: bool) -> Self {
        self.capabilities.associative = on;
        self
    }

    pub fn unique(mut self, on: bool) -> Self {
        self.capabilities.unique = on;
        self
    }

    pub fn key_equality(mut self, eq: Equality) -> Self {
        self.key_equality = eq;
        self
    }

    pub fn value_equality(mut self, eq: Equality) -> Self {
        self.value_equality = eq;
        self
    }

    pub fn separator(mut self, sep: impl Into<String>) -> Self {
        self.separator = sep.into();
        self
    }
}
