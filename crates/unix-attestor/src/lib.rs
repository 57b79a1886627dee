//! Unix workload attestor — OS-level identity selectors for a local process.
//!
//! Given a pid, derives the process's effective uid and gid, their names,
//! its supplementary groups and, optionally, the path and SHA-256 digest of
//! its executable. The resulting selectors feed a policy engine that decides
//! which identity document the workload receives.

pub mod attestor;
pub mod config;
pub mod digest;
pub mod error;
pub mod process;
pub mod resolver;
pub mod selector;

// Re-export primary types
pub use attestor::{PluginInfo, UnixAttestor, PLUGIN_NAME, SUBSYSTEM_NAME};
pub use config::{AttestationConfig, ConfigError, ConfigState, DigestPolicy};
pub use digest::DigestError;
pub use error::{AttestError, Result};
pub use process::{
    FactsSource, InspectError, ProcessIdentityFacts, ProcessInfo, ProcessSource, ProcfsSource,
};
pub use resolver::{IdentityResolver, ResolveError, ResolvedIdentity, SystemResolver};
pub use selector::{Selector, SelectorKey, SELECTOR_TYPE};
