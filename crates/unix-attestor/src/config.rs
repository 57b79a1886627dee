//! Attestor configuration and its runtime-replaceable snapshot.
//!
//! The configuration payload is TOML with exactly two recognized keys:
//!
//! ```toml
//! discover_workload_path = true
//! workload_size_limit = 1048576
//! ```
//!
//! A successful `configure` swaps the whole snapshot at once, so an
//! in-flight attestation sees either the old or the new value in full.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// Configuration decode errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to decode configuration: {0}")]
    Decode(#[from] toml::de::Error),
}

/// Attestor tunables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttestationConfig {
    /// Report the executable path (and, unless disabled, its digest).
    pub discover_workload_path: bool,
    /// Negative disables hashing, zero means no limit, positive is the
    /// maximum binary size in bytes.
    pub workload_size_limit: i64,
}

/// How the workload binary should be hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestPolicy {
    Disabled,
    Unlimited,
    Limit(u64),
}

impl AttestationConfig {
    /// Parse a configuration payload. An empty payload yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Decode` for malformed TOML, unknown keys, or
    /// values of the wrong type.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Interpret `workload_size_limit`.
    pub fn digest_policy(&self) -> DigestPolicy {
        match self.workload_size_limit {
            n if n < 0 => DigestPolicy::Disabled,
            0 => DigestPolicy::Unlimited,
            n => DigestPolicy::Limit(n.unsigned_abs()),
        }
    }
}

/// Shared, atomically replaced configuration snapshot.
///
/// Readers clone the inner `Arc` under a read lock held only for the clone;
/// writers swap the `Arc` under a write lock held only for the assignment.
#[derive(Debug, Default)]
pub struct ConfigState {
    current: RwLock<Arc<AttestationConfig>>,
}

impl ConfigState {
    pub fn new(config: AttestationConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// The active configuration.
    pub fn snapshot(&self) -> Arc<AttestationConfig> {
        // The guarded value is a whole Arc; a poisoned lock cannot hold a torn one.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Install `config` as the active configuration.
    pub fn replace(&self, config: AttestationConfig) {
        let next = Arc::new(config);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
    }

    /// Parse `text` and, only if it is valid, install it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` and leaves the active configuration untouched
    /// if `text` does not decode.
    pub fn configure(&self, text: &str) -> Result<(), ConfigError> {
        let config = AttestationConfig::parse(text)?;
        self.replace(config);
        Ok(())
    }
}
