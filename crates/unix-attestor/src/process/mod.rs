//! Process inspection — the identity facts of a single running process.
//!
//! The attestor never reads kernel process tables directly. It asks a
//! [`ProcessSource`] for a [`ProcessInfo`] bound to one pid and queries the
//! facts it needs from that handle.
//!
//! # Modules
//!
//! - [`procfs`] — Linux `/proc` backed source.
//!
//! [`FactsSource`] serves pre-captured [`ProcessIdentityFacts`], which is
//! useful for dry runs and for substituting the OS in tests.

pub mod procfs;

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use procfs::ProcfsSource;

/// Process inspection errors. Messages are surfaced to the caller verbatim.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("invalid PID {pid}")]
    InvalidPid { pid: i32 },

    #[error("no process with PID {pid}")]
    NotFound { pid: i32 },

    #[error("unable to get {what} for PID {pid}: {source}")]
    Unavailable {
        what: &'static str,
        pid: i32,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to get {what} for PID {pid}")]
    Missing { what: &'static str, pid: i32 },

    #[error("malformed {what} for PID {pid}")]
    Malformed { what: &'static str, pid: i32 },

    #[error("{0}")]
    Other(String),
}

/// Identity facts of one process, queried on demand.
///
/// UIDs and GIDs are reported in real-then-effective order.
pub trait ProcessInfo {
    fn uids(&self) -> Result<Vec<u32>, InspectError>;
    fn gids(&self) -> Result<Vec<u32>, InspectError>;
    /// Supplementary group ids as the OS reports them, duplicates included.
    fn supplementary_gids(&self) -> Result<Vec<String>, InspectError>;
    /// Path of the executable as seen from the attestor.
    fn exe_path(&self) -> Result<PathBuf, InspectError>;
    /// Path that opens the executable inside the process's own mount namespace.
    fn namespaced_exe_path(&self) -> Result<PathBuf, InspectError>;
}

/// Hands out a [`ProcessInfo`] bound to a pid.
pub trait ProcessSource: Send + Sync {
    fn inspect(&self, pid: i32) -> Result<Box<dyn ProcessInfo>, InspectError>;
}

/// A captured snapshot of a process's identity facts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessIdentityFacts {
    pub uids: Vec<u32>,
    pub gids: Vec<u32>,
    #[serde(default)]
    pub supplementary_gids: Vec<String>,
    #[serde(default)]
    pub exe_path: Option<PathBuf>,
    #[serde(default)]
    pub namespaced_exe_path: PathBuf,
}

/// A snapshot bound to the pid it was captured for.
struct CapturedProcess {
    pid: i32,
    facts: ProcessIdentityFacts,
}

impl ProcessInfo for CapturedProcess {
    fn uids(&self) -> Result<Vec<u32>, InspectError> {
        Ok(self.facts.uids.clone())
    }

    fn gids(&self) -> Result<Vec<u32>, InspectError> {
        Ok(self.facts.gids.clone())
    }

    fn supplementary_gids(&self) -> Result<Vec<String>, InspectError> {
        Ok(self.facts.supplementary_gids.clone())
    }

    fn exe_path(&self) -> Result<PathBuf, InspectError> {
        self.facts.exe_path.clone().ok_or(InspectError::Missing {
            what: "EXE",
            pid: self.pid,
        })
    }

    fn namespaced_exe_path(&self) -> Result<PathBuf, InspectError> {
        if self.facts.namespaced_exe_path.as_os_str().is_empty() {
            return self.exe_path();
        }
        Ok(self.facts.namespaced_exe_path.clone())
    }
}

/// Source serving captured facts keyed by pid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactsSource {
    processes: HashMap<i32, ProcessIdentityFacts>,
}

impl FactsSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the facts for `pid`.
    pub fn insert(&mut self, pid: i32, facts: ProcessIdentityFacts) {
        self.processes.insert(pid, facts);
    }

    pub fn with_process(mut self, pid: i32, facts: ProcessIdentityFacts) -> Self {
        self.insert(pid, facts);
        self
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

impl ProcessSource for FactsSource {
    fn inspect(&self, pid: i32) -> Result<Box<dyn ProcessInfo>, InspectError> {
        let facts = self
            .processes
            .get(&pid)
            .cloned()
            .ok_or(InspectError::NotFound { pid })?;
        Ok(Box::new(CapturedProcess { pid, facts }))
    }
}
