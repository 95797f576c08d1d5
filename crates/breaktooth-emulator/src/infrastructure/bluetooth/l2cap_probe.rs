//! Raw kernel L2CAP sockets for the link-key probe.
//!
//! A `SOCK_RAW` L2CAP socket may connect to PSM 0; the kernel then pages the
//! target and builds the ACL link, which is the part the probe is after.
//! `bluer` only exposes stream and seqpacket sockets, so this goes through
//! `libc` directly.
//!
//! # Safety
//!
//! `unsafe` is limited to the `socket`, `setsockopt` and `connect` calls.
//! Each block is annotated with a `// SAFETY:` comment.

use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use async_trait::async_trait;
use bluer::Address;
use breaktooth_core::config::SecurityLevel;

use crate::application::hijack::{ProbeSocket, ProbeSocketFactory};

const BTPROTO_L2CAP: libc::c_int = 0;
const SOL_BLUETOOTH: libc::c_int = 274;
const BT_SECURITY: libc::c_int = 4;
const BDADDR_BREDR: u8 = 0x00;

/// `struct sockaddr_l2` from `<bluetooth/l2cap.h>`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SockaddrL2 {
    l2_family: libc::sa_family_t,
    /// Little-endian.
    l2_psm: u16,
    /// Little-endian (reversed) device address.
    l2_bdaddr: [u8; 6],
    l2_cid: u16,
    l2_bdaddr_type: u8,
}

impl SockaddrL2 {
    pub(crate) fn new(target: Address, psm: u16) -> Self {
        let mut bdaddr = target.0;
        bdaddr.reverse();
        Self {
            l2_family: libc::AF_BLUETOOTH as libc::sa_family_t,
            l2_psm: psm.to_le(),
            l2_bdaddr: bdaddr,
            l2_cid: 0,
            l2_bdaddr_type: BDADDR_BREDR,
        }
    }
}

/// `struct bt_security` from `<bluetooth/bluetooth.h>`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BtSecurity {
    level: u8,
    key_size: u8,
}

/// Maps the configured level onto `BT_SECURITY_*`.
pub(crate) fn bt_security(level: SecurityLevel) -> BtSecurity {
    let level = match level {
        SecurityLevel::Sdp => 0,
        SecurityLevel::Low => 1,
        SecurityLevel::Medium => 2,
        SecurityLevel::High => 3,
    };
    BtSecurity { level, key_size: 0 }
}

fn check(ret: libc::c_int) -> io::Result<()> {
    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

fn connect_blocking(fd: &OwnedFd, addr: SockaddrL2) -> io::Result<()> {
    // SAFETY: `addr` is a fully initialised `sockaddr_l2` living for the whole
    // call and the length passed is its exact size. `fd` is an open socket.
    check(unsafe {
        libc::connect(
            fd.as_raw_fd(),
            &addr as *const SockaddrL2 as *const libc::sockaddr,
            mem::size_of::<SockaddrL2>() as libc::socklen_t,
        )
    })
}

/// Opens unbound `SOCK_RAW` L2CAP sockets.
#[derive(Debug, Default, Clone, Copy)]
pub struct L2capProbeSockets;

impl ProbeSocketFactory for L2capProbeSockets {
    type Socket = L2capProbeSocket;

    fn open(&self) -> io::Result<L2capProbeSocket> {
        // SAFETY: plain syscall with constant arguments; the result is checked
        // before it is wrapped.
        let fd = unsafe {
            libc::socket(
                libc::AF_BLUETOOTH,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                BTPROTO_L2CAP,
            )
        };
        check(fd)?;
        // SAFETY: `fd` was just returned by `socket` and is owned by nobody else.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(L2capProbeSocket { fd: Some(fd) })
    }
}

/// One raw L2CAP socket. The descriptor is closed when the socket is
/// closed or dropped.
pub struct L2capProbeSocket {
    fd: Option<OwnedFd>,
}

fn already_consumed() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "probe socket already used")
}

#[async_trait]
impl ProbeSocket for L2capProbeSocket {
    fn set_security(&mut self, level: SecurityLevel) -> io::Result<()> {
        let fd = self.fd.as_ref().ok_or_else(already_consumed)?;
        let sec = bt_security(level);
        // SAFETY: `sec` outlives the call and the length is its exact size.
        check(unsafe {
            libc::setsockopt(
                fd.as_raw_fd(),
                SOL_BLUETOOTH,
                BT_SECURITY,
                &sec as *const BtSecurity as *const libc::c_void,
                mem::size_of::<BtSecurity>() as libc::socklen_t,
            )
        })
    }

    async fn connect(&mut self, target: Address, psm: u16) -> io::Result<()> {
        let fd = self.fd.take().ok_or_else(already_consumed)?;
        let addr = SockaddrL2::new(target, psm);
        // connect(2) blocks until the page completes or times out
        let (fd, result) = tokio::task::spawn_blocking(move || {
            let result = connect_blocking(&fd, addr);
            (fd, result)
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        self.fd = Some(fd);
        result
    }

    fn close(self) {
        drop(self.fd);
    }
}
