//! Concurrency test: parallel attestation with concurrent reconfiguration.
//!
//! Validates that attestations for distinct pids never interfere and that a
//! configuration swap is observed whole by every in-flight call.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use unix_attestor::{
    FactsSource, IdentityResolver, ProcessIdentityFacts, ResolveError, UnixAttestor,
};

struct NumericNames;

impl IdentityResolver for NumericNames {
    fn user_name(&self, uid: &str) -> Result<String, ResolveError> {
        Ok(format!("user{uid}"))
    }

    fn group_name(&self, gid: &str) -> Result<String, ResolveError> {
        Ok(format!("group{gid}"))
    }
}

fn source(exe: PathBuf, processes: i32) -> FactsSource {
    let mut source = FactsSource::new();
    for pid in 1..=processes {
        let id = 10_000 + pid as u32;
        source.insert(
            pid,
            ProcessIdentityFacts {
                uids: vec![0, id],
                gids: vec![0, id + 50_000],
                supplementary_gids: vec![id.to_string()],
                exe_path: Some(exe.clone()),
                namespaced_exe_path: exe.clone(),
            },
        );
    }
    source
}

#[test]
fn stress_50_threads_distinct_pids() {
    let dir = tempfile::tempdir().unwrap();
    let exe = dir.path().join("exe");
    std::fs::write(&exe, b"data").unwrap();

    let attestor = Arc::new(UnixAttestor::with_hooks(source(exe, 50), NumericNames));

    let mut handles = Vec::new();
    for pid in 1..=50 {
        let attestor = Arc::clone(&attestor);
        handles.push(thread::spawn(move || {
            let id = 10_000 + pid as u32;
            for _ in 0..100 {
                let selectors = attestor.attest(pid).expect("attest should succeed");
                let values: Vec<&str> = selectors.iter().map(|s| s.value.as_str()).collect();
                assert_eq!(
                    values,
                    vec![
                        format!("uid:{id}"),
                        format!("user:user{id}"),
                        format!("gid:{}", id + 50_000),
                        format!("group:group{}", id + 50_000),
                        format!("supplementary_gid:{id}"),
                        format!("supplementary_group:group{id}"),
                    ]
                );
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn stress_configure_during_attest_never_mixes() {
    let dir = tempfile::tempdir().unwrap();
    let exe = dir.path().join("exe");
    std::fs::write(&exe, b"data").unwrap();

    // Path with digest, or neither. Mixing the two payloads would yield a
    // path without a digest.
    const WITH_DIGEST: &str = "discover_workload_path = true\nworkload_size_limit = 0";
    const WITHOUT_PATH: &str = "discover_workload_path = false\nworkload_size_limit = -1";

    let attestor = Arc::new(UnixAttestor::with_hooks(source(exe, 8), NumericNames));
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let attestor = Arc::clone(&attestor);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut flip = false;
            while !done.load(Ordering::Relaxed) {
                let config = if flip { WITH_DIGEST } else { WITHOUT_PATH };
                attestor.configure(config).expect("configure should succeed");
                flip = !flip;
            }
        })
    };

    let mut readers = Vec::new();
    for pid in 1..=8 {
        let attestor = Arc::clone(&attestor);
        readers.push(thread::spawn(move || {
            for _ in 0..500 {
                let selectors = attestor.attest(pid).expect("attest should succeed");
                let has_path = selectors.iter().any(|s| s.value.starts_with("path:"));
                let has_digest = selectors.iter().any(|s| s.value.starts_with("sha256:"));
                assert_eq!(has_path, has_digest, "observed a mixed configuration");
            }
        }));
    }

    for r in readers {
        r.join().unwrap();
    }
    done.store(true, Ordering::Relaxed);
    writer.join().unwrap();
}
