//! Error types for the unix attestor.
//!
//! Every fatal attestation failure maps to exactly one variant, and each
//! variant's message starts with the stage that failed. Name-resolution
//! failures never appear here; they are logged and attestation continues.

use crate::config::ConfigError;
use crate::digest::DigestError;
use crate::process::InspectError;

/// Fatal attestation errors.
#[derive(Debug, thiserror::Error)]
pub enum AttestError {
    #[error("{0}")]
    ProcessUnavailable(#[source] InspectError),

    #[error("UIDs lookup: {0}")]
    UidLookupFailed(#[source] InspectError),

    #[error("UIDs lookup: no UIDs for process")]
    NoUids,

    #[error("GIDs lookup: {0}")]
    GidLookupFailed(#[source] InspectError),

    #[error("GIDs lookup: no GIDs for process")]
    NoGids,

    #[error("supplementary GIDs lookup: {0}")]
    SupplementaryGidLookupFailed(#[source] InspectError),

    #[error("path lookup: {0}")]
    ExePathLookupFailed(#[source] InspectError),

    #[error("SHA256 digest: {0}")]
    DigestFailed(#[source] DigestError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, AttestError>;
