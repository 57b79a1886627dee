//! Attestation engine — turns a pid into an ordered list of selectors.
//!
//! Attestation steps:
//! 1. Effective uid (fatal if unreadable or empty), then its user name
//! 2. Effective gid (same policy), then its group name
//! 3. Supplementary gids (fatal if unreadable), each followed by its name
//! 4. Executable path, when `discover_workload_path` is enabled
//! 5. SHA-256 of the executable, unless `workload_size_limit` is negative
//!
//! Name lookups that fail are logged at warn level and skipped; they never
//! change the outcome of the call. Any other failure aborts the call and no
//! selectors are returned.

use std::sync::Arc;

use serde::Serialize;

use crate::config::{AttestationConfig, ConfigState, DigestPolicy};
use crate::digest::file_digest;
use crate::error::{AttestError, Result};
use crate::process::{ProcessSource, ProcfsSource};
use crate::resolver::{IdentityResolver, ResolvedIdentity, SystemResolver};
use crate::selector::{Selector, SelectorKey};

/// Plugin name, used as the prefix of host-facing error messages.
pub const PLUGIN_NAME: &str = "unix";

/// Subsystem tag attached to every log event from this attestor.
pub const SUBSYSTEM_NAME: &str = "built-in_plugin.unix";

/// Static plugin metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub name: &'static str,
    pub kind: &'static str,
    pub version: &'static str,
}

/// The unix workload attestor.
///
/// Safe to share across threads: `attest` only reads an immutable
/// configuration snapshot, and `configure` swaps that snapshot whole.
pub struct UnixAttestor {
    source: Box<dyn ProcessSource>,
    resolver: Box<dyn IdentityResolver>,
    config: ConfigState,
}

impl Default for UnixAttestor {
    fn default() -> Self {
        Self::new()
    }
}

impl UnixAttestor {
    /// Attestor backed by `/proc` and the system user/group databases.
    pub fn new() -> Self {
        Self::with_hooks(ProcfsSource::new(), SystemResolver)
    }

    /// Attestor with an injected process source and name resolver.
    pub fn with_hooks(
        source: impl ProcessSource + 'static,
        resolver: impl IdentityResolver + 'static,
    ) -> Self {
        Self {
            source: Box::new(source),
            resolver: Box::new(resolver),
            config: ConfigState::default(),
        }
    }

    /// Apply a configuration payload.
    ///
    /// # Errors
    ///
    /// Returns `AttestError::Config` if the payload is malformed or names an
    /// unknown key; the previous configuration stays active.
    pub fn configure(&self, text: &str) -> Result<()> {
        self.config.configure(text)?;
        tracing::debug!(subsystem_name = SUBSYSTEM_NAME, "Configuration applied");
        Ok(())
    }

    /// The active configuration snapshot.
    pub fn config(&self) -> Arc<AttestationConfig> {
        self.config.snapshot()
    }

    pub fn get_info(&self) -> PluginInfo {
        PluginInfo {
            name: PLUGIN_NAME,
            kind: "WorkloadAttestor",
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Attest the process `pid`.
    ///
    /// # Errors
    ///
    /// Returns the `AttestError` of the first fatal stage; see the module
    /// docs for which failures are fatal.
    pub fn attest(&self, pid: i32) -> Result<Vec<Selector>> {
        let config = self.config.snapshot();
        let process = self
            .source
            .inspect(pid)
            .map_err(AttestError::ProcessUnavailable)?;

        let mut selectors = Vec::new();

        let uids = process.uids().map_err(AttestError::UidLookupFailed)?;
        let uid = uids.last().ok_or(AttestError::NoUids)?;
        selectors.push(Selector::new(SelectorKey::Uid, uid));
        match ResolvedIdentity::resolve_user(self.resolver.as_ref(), uid.to_string()) {
            Ok(user) => push_name(&mut selectors, SelectorKey::User, user),
            Err((user, err)) => tracing::warn!(
                uid = %user.id,
                error = %err,
                subsystem_name = SUBSYSTEM_NAME,
                "Failed to lookup user name by uid"
            ),
        }

        let gids = process.gids().map_err(AttestError::GidLookupFailed)?;
        let gid = gids.last().ok_or(AttestError::NoGids)?;
        selectors.push(Selector::new(SelectorKey::Gid, gid));
        match ResolvedIdentity::resolve_group(self.resolver.as_ref(), gid.to_string()) {
            Ok(group) => push_name(&mut selectors, SelectorKey::Group, group),
            Err((group, err)) => tracing::warn!(
                gid = %group.id,
                error = %err,
                subsystem_name = SUBSYSTEM_NAME,
                "Failed to lookup group name by gid"
            ),
        }

        let supplementary = process
            .supplementary_gids()
            .map_err(AttestError::SupplementaryGidLookupFailed)?;
        for sgid in supplementary {
            selectors.push(Selector::new(SelectorKey::SupplementaryGid, &sgid));
            match ResolvedIdentity::resolve_group(self.resolver.as_ref(), sgid) {
                Ok(group) => push_name(&mut selectors, SelectorKey::SupplementaryGroup, group),
                Err((group, err)) => tracing::warn!(
                    gid = %group.id,
                    error = %err,
                    subsystem_name = SUBSYSTEM_NAME,
                    "Failed to lookup supplementary group name by gid"
                ),
            }
        }

        if config.discover_workload_path {
            let path = process
                .exe_path()
                .map_err(AttestError::ExePathLookupFailed)?;
            selectors.push(Selector::new(SelectorKey::Path, path.display()));

            let limit = match config.digest_policy() {
                DigestPolicy::Disabled => None,
                DigestPolicy::Unlimited => Some(0),
                DigestPolicy::Limit(n) => Some(n),
            };
            if let Some(limit) = limit {
                let exe = process
                    .namespaced_exe_path()
                    .map_err(AttestError::ExePathLookupFailed)?;
                let digest = file_digest(&exe, limit).map_err(AttestError::DigestFailed)?;
                selectors.push(Selector::new(SelectorKey::Sha256, digest));
            }
        }

        tracing::debug!(
            pid,
            selectors = selectors.len(),
            subsystem_name = SUBSYSTEM_NAME,
            "Attested workload"
        );
        Ok(selectors)
    }
}

fn push_name(selectors: &mut Vec<Selector>, key: SelectorKey, identity: ResolvedIdentity) {
    if let Some(name) = identity.name {
        selectors.push(Selector::new(key, name));
    }
}
