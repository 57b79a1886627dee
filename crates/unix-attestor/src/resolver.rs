//! User and group name resolution.
//!
//! Ids are taken as decimal strings because supplementary group ids arrive
//! from the process source as opaque strings. Every failure here is
//! recoverable: the attestor logs it and omits the name selector.

use std::ffi::CStr;

/// Name resolution errors.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid id {0:?}")]
    InvalidId(String),

    #[error("no user with UID {0}")]
    UnknownUser(String),

    #[error("no group with GID {0}")]
    UnknownGroup(String),

    #[error("lookup of {id} failed: {source}")]
    Lookup {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Maps numeric user and group ids to names.
pub trait IdentityResolver: Send + Sync {
    fn user_name(&self, uid: &str) -> Result<String, ResolveError>;
    fn group_name(&self, gid: &str) -> Result<String, ResolveError>;
}

/// An id together with its name, when it resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub id: String,
    pub name: Option<String>,
}

impl ResolvedIdentity {
    /// Resolve a user id. On failure the unnamed identity is returned
    /// alongside the error so the caller can report it and carry on.
    pub fn resolve_user(
        resolver: &dyn IdentityResolver,
        id: impl Into<String>,
    ) -> Result<Self, (Self, ResolveError)> {
        let id = id.into();
        Self::from_lookup(resolver.user_name(&id), id)
    }

    /// Resolve a group id; see [`ResolvedIdentity::resolve_user`].
    pub fn resolve_group(
        resolver: &dyn IdentityResolver,
        id: impl Into<String>,
    ) -> Result<Self, (Self, ResolveError)> {
        let id = id.into();
        Self::from_lookup(resolver.group_name(&id), id)
    }

    fn from_lookup(
        lookup: Result<String, ResolveError>,
        id: String,
    ) -> Result<Self, (Self, ResolveError)> {
        match lookup {
            Ok(name) => Ok(Self {
                id,
                name: Some(name),
            }),
            Err(e) => Err((Self { id, name: None }, e)),
        }
    }
}

/// Resolver backed by the system user and group databases (NSS).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

const INITIAL_BUFFER: usize = 1024;
const MAX_BUFFER: usize = 1 << 20;

fn parse_id(id: &str) -> Result<u32, ResolveError> {
    id.parse::<u32>()
        .map_err(|_| ResolveError::InvalidId(id.to_string()))
}

/// Grow the scratch buffer on `ERANGE`, up to a fixed ceiling.
fn grow(buf: &mut Vec<libc::c_char>, id: &str) -> Result<(), ResolveError> {
    let next = buf.len() * 2;
    if next > MAX_BUFFER {
        return Err(ResolveError::Lookup {
            id: id.to_string(),
            source: std::io::Error::from_raw_os_error(libc::ERANGE),
        });
    }
    buf.resize(next, 0);
    Ok(())
}

impl IdentityResolver for SystemResolver {
    fn user_name(&self, uid: &str) -> Result<String, ResolveError> {
        let raw = parse_id(uid)?;
        let mut buf: Vec<libc::c_char> = vec![0; INITIAL_BUFFER];
        loop {
            // SAFETY: all-zero is a valid `passwd` value (null pointers, zero ids).
            let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
            let mut result: *mut libc::passwd = std::ptr::null_mut();
            // SAFETY: `buf` outlives the call and its length is passed along;
            // `pwd` and `result` are valid for writes.
            let rc = unsafe {
                libc::getpwuid_r(raw, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result)
            };
            if rc == libc::ERANGE {
                grow(&mut buf, uid)?;
                continue;
            }
            if rc != 0 {
                return Err(ResolveError::Lookup {
                    id: uid.to_string(),
                    source: std::io::Error::from_raw_os_error(rc),
                });
            }
            if result.is_null() || pwd.pw_name.is_null() {
                return Err(ResolveError::UnknownUser(uid.to_string()));
            }
            // SAFETY: on success `pw_name` points into `buf`, NUL terminated.
            let name = unsafe { CStr::from_ptr(pwd.pw_name) };
            return Ok(name.to_string_lossy().into_owned());
        }
    }

    fn group_name(&self, gid: &str) -> Result<String, ResolveError> {
        let raw = parse_id(gid)?;
        let mut buf: Vec<libc::c_char> = vec![0; INITIAL_BUFFER];
        loop {
            // SAFETY: all-zero is a valid `group` value.
            let mut grp: libc::group = unsafe { std::mem::zeroed() };
            let mut result: *mut libc::group = std::ptr::null_mut();
            // SAFETY: see `user_name`.
            let rc = unsafe {
                libc::getgrgid_r(raw, &mut grp, buf.as_mut_ptr(), buf.len(), &mut result)
            };
            if rc == libc::ERANGE {
                grow(&mut buf, gid)?;
                continue;
            }
            if rc != 0 {
                return Err(ResolveError::Lookup {
                    id: gid.to_string(),
                    source: std::io::Error::from_raw_os_error(rc),
                });
            }
            if result.is_null() || grp.gr_name.is_null() {
                return Err(ResolveError::UnknownGroup(gid.to_string()));
            }
            // SAFETY: on success `gr_name` points into `buf`, NUL terminated.
            let name = unsafe { CStr::from_ptr(grp.gr_name) };
            return Ok(name.to_string_lossy().into_owned());
        }
    }
}
