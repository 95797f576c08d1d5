//! [`EchoProbe`] that shells out to BlueZ `l2ping`.
//!
//! `l2ping -c 1 -f <addr>` sends a single L2CAP echo request in flood mode
//! (no delay) and exits 0 only when a reply arrived.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use bluer::Address;
use tokio::process::Command;
use tracing::trace;

use crate::application::sleep_monitor::{EchoError, EchoProbe};

pub struct L2pingProbe {
    program: PathBuf,
}

impl L2pingProbe {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(target: Address) -> [String; 4] {
        ["-c".into(), "1".into(), "-f".into(), target.to_string()]
    }
}

#[async_trait]
impl EchoProbe for L2pingProbe {
    async fn echo(&self, target: Address) -> Result<(), EchoError> {
        let status = Command::new(&self.program)
            .args(Self::args(target))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;
        trace!(%status, "l2ping exited");
        if status.success() {
            Ok(())
        } else {
            Err(EchoError::NoReply(status.code()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Address {
        Address::new([0xAA, 0xBB, 0xCC, 0x00, 0x11, 0x22])
    }

    #[test]
    fn test_arguments_request_single_flood_echo() {
        assert_eq!(
            L2pingProbe::args(target()),
            ["-c", "1", "-f", "AA:BB:CC:00:11:22"].map(String::from)
        );
    }

    #[tokio::test]
    async fn test_zero_exit_status_is_a_reply() {
        // Arrange: `true` ignores its arguments and exits 0
        let probe = L2pingProbe::new("true");

        // Act / Assert
        assert!(probe.echo(target()).await.is_ok());
    }

    #[tokio::test]
    async fn test_non_zero_exit_status_is_no_reply() {
        let probe = L2pingProbe::new("false");

        let err = probe.echo(target()).await.unwrap_err();

        assert!(matches!(err, EchoError::NoReply(Some(1))));
    }

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let probe = L2pingProbe::new("/nonexistent/l2ping");

        let err = probe.echo(target()).await.unwrap_err();

        assert!(matches!(err, EchoError::Io(_)));
    }
}
