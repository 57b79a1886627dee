//! Linux `/proc` backed process inspection.
//!
//! Reads identity facts from `/proc/<pid>/status`:
//!
//! ```text
//! Uid:    1000    1000    1000    1000
//! Gid:    1000    1000    1000    1000
//! Groups: 4 24 27 1000
//! ```
//!
//! `Uid:`/`Gid:` list real, effective, saved and filesystem ids; only the
//! real and effective ids are reported. The executable is `/proc/<pid>/exe`,
//! which the kernel resolves within the process's mount namespace.

use std::io::ErrorKind;
use std::path::PathBuf;

use super::{InspectError, ProcessInfo, ProcessSource};

const DEFAULT_PROC_ROOT: &str = "/proc";

/// Process source reading a procfs mount.
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    root: PathBuf,
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcfsSource {
    pub fn new() -> Self {
        Self::with_root(DEFAULT_PROC_ROOT)
    }

    /// Use a procfs mounted somewhere other than `/proc`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ProcessSource for ProcfsSource {
    fn inspect(&self, pid: i32) -> Result<Box<dyn ProcessInfo>, InspectError> {
        if pid <= 0 {
            return Err(InspectError::InvalidPid { pid });
        }
        let dir = self.root.join(pid.to_string());
        match std::fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => Ok(Box::new(ProcfsProcess { pid, dir })),
            Ok(_) => Err(InspectError::NotFound { pid }),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(InspectError::NotFound { pid }),
            Err(source) => Err(InspectError::Unavailable {
                what: "process",
                pid,
                source,
            }),
        }
    }
}

/// One process under a procfs root. Every query re-reads the kernel's view.
struct ProcfsProcess {
    pid: i32,
    dir: PathBuf,
}

impl ProcfsProcess {
    fn status(&self, what: &'static str) -> Result<String, InspectError> {
        std::fs::read_to_string(self.dir.join("status")).map_err(|source| {
            InspectError::Unavailable {
                what,
                pid: self.pid,
                source,
            }
        })
    }

    /// Parse the real and effective ids from a `Uid:`/`Gid:` line.
    fn ids(&self, prefix: &str, what: &'static str) -> Result<Vec<u32>, InspectError> {
        let status = self.status(what)?;
        let malformed = || InspectError::Malformed {
            what,
            pid: self.pid,
        };
        let line = status_field(&status, prefix).ok_or_else(malformed)?;
        line.split_whitespace()
            .take(2)
            .map(|id| id.parse::<u32>().map_err(|_| malformed()))
            .collect()
    }
}

impl ProcessInfo for ProcfsProcess {
    fn uids(&self) -> Result<Vec<u32>, InspectError> {
        self.ids("Uid:", "UIDs")
    }

    fn gids(&self) -> Result<Vec<u32>, InspectError> {
        self.ids("Gid:", "GIDs")
    }

    fn supplementary_gids(&self) -> Result<Vec<String>, InspectError> {
        let status = self.status("supplementary GIDs")?;
        Ok(status_field(&status, "Groups:")
            .map(|line| line.split_whitespace().map(String::from).collect())
            .unwrap_or_default())
    }

    fn exe_path(&self) -> Result<PathBuf, InspectError> {
        std::fs::read_link(self.dir.join("exe")).map_err(|source| InspectError::Unavailable {
            what: "EXE",
            pid: self.pid,
            source,
        })
    }

    fn namespaced_exe_path(&self) -> Result<PathBuf, InspectError> {
        Ok(self.dir.join("exe"))
    }
}

/// The remainder of the first `status` line starting with `prefix`.
fn status_field<'a>(status: &'a str, prefix: &str) -> Option<&'a str> {
    status.lines().find_map(|line| line.strip_prefix(prefix))
}
