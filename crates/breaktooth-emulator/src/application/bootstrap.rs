//! Startup sequence of the `breaktooth` binary.
//!
//! ```text
//! SleepMonitor::detect ─▶ SessionHijacker::probe ─▶ settle delay ─▶ HidEmulationService::initialize
//! ```
//!
//! Each of the first two steps can be skipped from the command line. The
//! probe outcome is checked against [`ProbeFailurePolicy`].

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use bluer::Address;
use breaktooth_core::config::{HijackConfig, ProbeFailurePolicy, SecurityLevel};
use thiserror::Error;
use tracing::{info, warn};

use crate::application::hid_service::{BluetoothPlatform, HidEmulationService, ServiceError};
use crate::application::hijack::{HijackOutcome, ProbeSocketFactory, SessionHijacker};
use crate::application::sleep_monitor::{EchoProbe, SleepMonitor, SleepMonitorError};

/// Error type for [`StartupSequence::run`].
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    SleepMonitor(#[from] SleepMonitorError),

    /// The probe failed and the policy is [`ProbeFailurePolicy::Abort`].
    #[error("link-key probe failed with status {status}; aborting")]
    ProbeAborted { status: i32 },

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Which steps run and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupOptions {
    pub skip_sleep_detection: bool,
    pub skip_hijack: bool,
    pub security_level: SecurityLevel,
    pub on_probe_failure: ProbeFailurePolicy,
    pub settle_delay: Duration,
}

impl StartupOptions {
    pub fn from_config(hijack: &HijackConfig) -> Self {
        Self {
            skip_sleep_detection: false,
            skip_hijack: false,
            security_level: hijack.security_level,
            on_probe_failure: hijack.on_failure,
            settle_delay: hijack.settle_delay(),
        }
    }
}

/// Runs the startup steps in order against one target.
pub struct StartupSequence<'a, E, F> {
    pub monitor: &'a SleepMonitor<E>,
    pub hijacker: &'a SessionHijacker<F>,
    pub options: StartupOptions,
}

impl<E: EchoProbe, F: ProbeSocketFactory> StartupSequence<'_, E, F> {
    /// Brings `service` to `Ready` against `target`.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] if detection is cancelled, the probe fails
    /// under the abort policy, or the service cannot connect.
    pub async fn run<P: BluetoothPlatform>(
        &self,
        target: Address,
        service: &mut HidEmulationService<P>,
        running: &AtomicBool,
    ) -> Result<(), StartupError> {
        if self.options.skip_sleep_detection {
            info!("sleep detection skipped");
        } else {
            self.monitor.detect(target, running).await?;
        }

        if self.options.skip_hijack {
            info!("link-key probe skipped");
        } else {
            let outcome = self
                .hijacker
                .probe(target, self.options.security_level)
                .await;
            if let HijackOutcome::Failed { status } = outcome {
                match self.options.on_probe_failure {
                    ProbeFailurePolicy::Abort => return Err(StartupError::ProbeAborted { status }),
                    ProbeFailurePolicy::Continue => {
                        warn!(status, "link-key probe failed; continuing")
                    }
                }
            }
            info!("waiting {:?} before connecting", self.options.settle_delay);
            tokio::time::sleep(self.options.settle_delay).await;
        }

        service.initialize(target).await?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::hid_service::{ProfileSpec, ServiceState, PSM_CONTROL};
    use crate::application::sleep_monitor::{EchoError, MockEchoProbe};
    use crate::infrastructure::mock::{MockBluetoothPlatform, MockProbeSockets, ProbeBehaviour};
    use tokio::time::Instant;

    fn target() -> Address {
        Address::new([0x5C, 0xF3, 0x70, 0x01, 0x02, 0x03])
    }

    fn options() -> StartupOptions {
        StartupOptions::from_config(&HijackConfig::default())
    }

    fn answering_probe() -> MockEchoProbe {
        let mut probe = MockEchoProbe::new();
        probe.expect_echo().returning(|_| Ok(()));
        probe
    }

    fn service(platform: &MockBluetoothPlatform) -> HidEmulationService<MockBluetoothPlatform> {
        HidEmulationService::new(platform.clone(), ProfileSpec::keyboard(String::new()), 0x2C0540)
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_sequence_waits_settle_delay_then_connects() {
        // Arrange
        let monitor = SleepMonitor::new(answering_probe(), Duration::from_secs(1));
        let sockets = MockProbeSockets::new(ProbeBehaviour::Accept);
        let hijacker = SessionHijacker::new(sockets.clone());
        let platform = MockBluetoothPlatform::new();
        let mut svc = service(&platform);
        let seq = StartupSequence {
            monitor: &monitor,
            hijacker: &hijacker,
            options: options(),
        };
        let start = Instant::now();

        // Act
        seq.run(target(), &mut svc, &AtomicBool::new(true)).await.unwrap();

        // Assert
        assert_eq!(svc.state(), ServiceState::Ready);
        assert_eq!(sockets.closes(), 1);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_failure_continues_by_default() {
        let monitor = SleepMonitor::new(answering_probe(), Duration::from_secs(1));
        let hijacker = SessionHijacker::new(MockProbeSockets::new(ProbeBehaviour::RefuseConnect(111)));
        let platform = MockBluetoothPlatform::new();
        let mut svc = service(&platform);
        let seq = StartupSequence {
            monitor: &monitor,
            hijacker: &hijacker,
            options: options(),
        };

        seq.run(target(), &mut svc, &AtomicBool::new(true)).await.unwrap();

        assert_eq!(svc.state(), ServiceState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_failure_aborts_under_abort_policy() {
        let monitor = SleepMonitor::new(answering_probe(), Duration::from_secs(1));
        let hijacker = SessionHijacker::new(MockProbeSockets::new(ProbeBehaviour::RefuseConnect(112)));
        let platform = MockBluetoothPlatform::new();
        let mut svc = service(&platform);
        let seq = StartupSequence {
            monitor: &monitor,
            hijacker: &hijacker,
            options: StartupOptions {
                on_probe_failure: ProbeFailurePolicy::Abort,
                ..options()
            },
        };

        let err = seq.run(target(), &mut svc, &AtomicBool::new(true)).await.unwrap_err();

        assert!(matches!(err, StartupError::ProbeAborted { status: 112 }));
        assert!(platform.connects().is_empty());
        assert_eq!(svc.state(), ServiceState::Unregistered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_flags_go_straight_to_service() {
        let mut probe = MockEchoProbe::new();
        probe.expect_echo().times(0);
        let monitor = SleepMonitor::new(probe, Duration::from_secs(1));
        let sockets = MockProbeSockets::new(ProbeBehaviour::Accept);
        let hijacker = SessionHijacker::new(sockets.clone());
        let platform = MockBluetoothPlatform::new();
        let mut svc = service(&platform);
        let seq = StartupSequence {
            monitor: &monitor,
            hijacker: &hijacker,
            options: StartupOptions {
                skip_sleep_detection: true,
                skip_hijack: true,
                ..options()
            },
        };
        let start = Instant::now();

        seq.run(target(), &mut svc, &AtomicBool::new(true)).await.unwrap();

        assert_eq!(sockets.closes(), 0);
        assert_eq!(platform.connects()[0], (target(), PSM_CONTROL));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_detection_never_probes() {
        let mut probe = MockEchoProbe::new();
        probe
            .expect_echo()
            .returning(|_| Err(EchoError::NoReply(Some(1))));
        let monitor = SleepMonitor::new(probe, Duration::from_secs(1));
        let sockets = MockProbeSockets::new(ProbeBehaviour::Accept);
        let hijacker = SessionHijacker::new(sockets.clone());
        let platform = MockBluetoothPlatform::new();
        let mut svc = service(&platform);
        let seq = StartupSequence {
            monitor: &monitor,
            hijacker: &hijacker,
            options: options(),
        };

        let err = seq.run(target(), &mut svc, &AtomicBool::new(false)).await.unwrap_err();

        assert!(matches!(err, StartupError::SleepMonitor(_)));
        assert!(sockets.connects().is_empty());
    }
}
