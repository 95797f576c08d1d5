//! SleepMonitor: waits until the target answers an L2CAP echo request.
//!
//! A target in its power-saving link state still answers connectionless echo
//! requests. The monitor sends one echo per interval until one succeeds; there
//! is no attempt limit and no backoff. The only way out besides success is the
//! shared `running` flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bluer::Address;
use thiserror::Error;
use tokio::time::{self, Instant};
use tracing::{info, info_span, Instrument};

/// Error returned by a single echo probe.
#[derive(Debug, Error)]
pub enum EchoError {
    /// The probe ran but the target did not answer.
    #[error("no echo reply (exit status {0:?})")]
    NoReply(Option<i32>),

    /// The probe could not be started at all.
    #[error("failed to run echo probe: {0}")]
    Io(#[from] std::io::Error),
}

/// Error type for [`SleepMonitor::detect`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SleepMonitorError {
    /// The shutdown flag was cleared before the target answered.
    #[error("sleep detection cancelled after {attempts} probes")]
    Cancelled { attempts: u64 },
}

/// One connectionless echo toward a Bluetooth address.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EchoProbe: Send + Sync {
    /// Sends one echo request and waits for its reply.
    async fn echo(&self, target: Address) -> Result<(), EchoError>;
}

/// Polls a target with echo probes at a fixed rate.
pub struct SleepMonitor<P> {
    probe: P,
    interval: Duration,
}

impl<P: EchoProbe> SleepMonitor<P> {
    /// Creates a monitor that issues at most one probe per `interval`.
    pub fn new(probe: P, interval: Duration) -> Self {
        Self { probe, interval }
    }

    /// Blocks until `target` answers an echo probe.
    ///
    /// Returns the number of probes issued, including the successful one.
    ///
    /// # Errors
    ///
    /// Returns [`SleepMonitorError::Cancelled`] once `running` is cleared.
    pub async fn detect(
        &self,
        target: Address,
        running: &AtomicBool,
    ) -> Result<u64, SleepMonitorError> {
        let span = info_span!("sleep_monitor", %target);
        async {
            info!("waiting for target to enter sleep mode");
            let mut attempts = 0u64;

            while running.load(Ordering::Relaxed) {
                let started = Instant::now();
                attempts += 1;

                match self.probe.echo(target).await {
                    Ok(()) => {
                        info!(attempts, "sleep mode detected");
                        return Ok(attempts);
                    }
                    Err(e) => info!(attempts, "not in sleep mode yet, trying again: {e}"),
                }

                time::sleep_until(started + self.interval).await;
            }

            info!(attempts, "sleep detection cancelled");
            Err(SleepMonitorError::Cancelled { attempts })
        }
        .instrument(span)
        .await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
