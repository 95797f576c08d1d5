//! Root privilege pre-check shared by both binaries.
//!
//! Raw L2CAP sockets, `hciconfig` and `/dev/input/event*` all need root, so
//! each binary calls [`require_root`] before doing anything else.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrivilegeError {
    #[error("must run as root (effective uid is {0})")]
    NotRoot(u32),
}

/// Accepts only effective UID 0.
pub fn check_euid(euid: u32) -> Result<(), PrivilegeError> {
    if euid == 0 {
        Ok(())
    } else {
        Err(PrivilegeError::NotRoot(euid))
    }
}

/// The effective UID of this process.
pub fn effective_uid() -> u32 {
    // SAFETY: geteuid(2) takes no arguments and cannot fail.
    unsafe { libc::geteuid() }
}

/// Fails unless the process runs with effective UID 0.
///
/// # Errors
///
/// [`PrivilegeError::NotRoot`] for any other UID.
pub fn require_root() -> Result<(), PrivilegeError> {
    check_euid(effective_uid())
}
