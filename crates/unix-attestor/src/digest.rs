//! SHA-256 digest of a workload binary, bounded by a size limit.
//!
//! The file is streamed in 8 KiB chunks. With a positive limit the size is
//! checked from metadata before reading, and the read itself stops one byte
//! past the limit so a file that grows while being hashed is still rejected.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

const CHUNK_SIZE: usize = 8192;

/// Digest errors. Paths are always the path that was attempted.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("workload {} exceeds size limit ({actual} > {limit})", path.display())]
    TooLarge {
        path: PathBuf,
        actual: u64,
        limit: u64,
    },
}

/// Compute the lowercase hex SHA-256 digest of the file at `path`.
///
/// `limit` is the maximum allowed size in bytes; `0` hashes the whole file
/// regardless of size.
///
/// # Errors
///
/// Returns `DigestError::Open` if the file cannot be opened,
/// `DigestError::TooLarge` if it exceeds `limit`, or `DigestError::Read`
/// for I/O failures while hashing.
pub fn file_digest(path: &Path, limit: u64) -> Result<String, DigestError> {
    let file = File::open(path).map_err(|source| DigestError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    if limit == 0 {
        return hash_reader(path, file).map(|(digest, _)| digest);
    }

    let size = file
        .metadata()
        .map_err(|source| DigestError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if size > limit {
        return Err(DigestError::TooLarge {
            path: path.to_path_buf(),
            actual: size,
            limit,
        });
    }

    let (digest, read) = hash_reader(path, file.take(limit.saturating_add(1)))?;
    if read > limit {
        return Err(DigestError::TooLarge {
            path: path.to_path_buf(),
            actual: read,
            limit,
        });
    }
    Ok(digest)
}

/// Stream `reader` through SHA-256, returning the hex digest and byte count.
fn hash_reader<R: Read>(path: &Path, mut reader: R) -> Result<(String, u64), DigestError> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total: u64 = 0;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(DigestError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok((hex::encode(hasher.finalize()), total))
}
