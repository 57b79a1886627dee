//! Selectors — `key:value` facts about a workload.
//!
//! Every selector this attestor emits carries the type `unix`. The value is
//! one of a fixed set of keys followed by a colon and the fact itself, e.g.
//! `uid:1000` or `sha256:<hex>`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Selector type for every selector produced by this attestor.
pub const SELECTOR_TYPE: &str = "unix";

/// The fixed set of selector keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorKey {
    Uid,
    User,
    Gid,
    Group,
    SupplementaryGid,
    SupplementaryGroup,
    Path,
    Sha256,
}

impl SelectorKey {
    /// The literal key written before the colon.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uid => "uid",
            Self::User => "user",
            Self::Gid => "gid",
            Self::Group => "group",
            Self::SupplementaryGid => "supplementary_gid",
            Self::SupplementaryGroup => "supplementary_group",
            Self::Path => "path",
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for SelectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single attestation selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector {
    /// Always [`SELECTOR_TYPE`].
    #[serde(rename = "type")]
    pub selector_type: String,
    /// `key:value` pair.
    pub value: String,
}

impl Selector {
    /// Build a `unix` selector from a key and its fact.
    pub fn new(key: SelectorKey, value: impl fmt::Display) -> Self {
        Self {
            selector_type: SELECTOR_TYPE.to_string(),
            value: format!("{key}:{value}"),
        }
    }

    /// The key portion of the value, if the value is well formed.
    pub fn key(&self) -> Option<&str> {
        self.value.split_once(':').map(|(k, _)| k)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.selector_type, self.value)
    }
}
