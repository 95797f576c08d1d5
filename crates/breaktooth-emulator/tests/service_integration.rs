//! Integration tests for the emulator pipeline.
//!
//! These run the startup sequence and the IPC reader against the recording
//! Bluetooth mocks and assert on the exact bytes that reach the interrupt
//! channel.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use bluer::Address;
use breaktooth_core::config::HijackConfig;
use breaktooth_core::protocol::{encode_frame, IpcRequest, SendKeysMessage};
use breaktooth_core::report::{apply, KeyState};
use breaktooth_emulator::application::bootstrap::{StartupOptions, StartupSequence};
use breaktooth_emulator::application::hid_service::{
    HidEmulationService, ProfileSpec, ServiceState, PSM_INTERRUPT,
};
use breaktooth_emulator::application::hijack::SessionHijacker;
use breaktooth_emulator::application::sleep_monitor::{EchoError, EchoProbe, SleepMonitor};
use breaktooth_emulator::infrastructure::ipc::read_requests;
use breaktooth_emulator::infrastructure::mock::{
    MockBluetoothPlatform, MockProbeSockets, ProbeBehaviour,
};
use tokio::sync::mpsc;

fn target() -> Address {
    Address::new([0x00, 0x1B, 0xDC, 0x0F, 0x10, 0x20])
}

/// Answers every echo request.
struct AlwaysAsleep;

#[async_trait::async_trait]
impl EchoProbe for AlwaysAsleep {
    async fn echo(&self, _: Address) -> Result<(), EchoError> {
        Ok(())
    }
}

async fn ready_service(
    platform: &MockBluetoothPlatform,
) -> HidEmulationService<MockBluetoothPlatform> {
    let monitor = SleepMonitor::new(AlwaysAsleep, Duration::from_secs(1));
    let hijacker = SessionHijacker::new(MockProbeSockets::new(ProbeBehaviour::Accept));
    let sequence = StartupSequence {
        monitor: &monitor,
        hijacker: &hijacker,
        options: StartupOptions::from_config(&HijackConfig::default()),
    };
    let mut service = HidEmulationService::new(
        platform.clone(),
        ProfileSpec::keyboard("<record/>".to_string()),
        0x2C0540,
    );
    sequence
        .run(target(), &mut service, &AtomicBool::new(true))
        .await
        .expect("startup must succeed against mocks");
    service
}

#[tokio::test(start_paused = true)]
async fn test_send_keys_transmits_exact_report_bytes() {
    // Arrange
    let platform = MockBluetoothPlatform::new();
    let mut service = ready_service(&platform).await;
    assert_eq!(service.state(), ServiceState::Ready);

    // Act
    service
        .send_keys(0b0000_0001, &[0x04, 0x00, 0x00, 0x00, 0x00, 0x00])
        .await
        .unwrap();

    // Assert
    assert_eq!(
        platform.sent_on(PSM_INTERRUPT),
        vec![vec![0xA1, 0x01, 0x01, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00]]
    );
}

#[tokio::test(start_paused = true)]
async fn test_ipc_frames_reach_interrupt_channel_in_order() {
    // Arrange: the injector side folds Shift, A, release A, release Shift
    let mut mirror = KeyState::new();
    let mut wire = Vec::new();
    for (key, pressed) in [(42u16, true), (30, true), (30, false), (42, false)] {
        mirror = apply(mirror, key, pressed);
        let req = IpcRequest::SendKeys(SendKeysMessage::from_state(&mirror));
        wire.extend(encode_frame(&req).unwrap());
    }
    let mut reader = tokio_test::io::Builder::new().read(&wire).build();
    let (tx, mut rx) = mpsc::channel(16);
    let platform = MockBluetoothPlatform::new();
    let mut service = ready_service(&platform).await;

    // Act
    let forwarded = read_requests(&mut reader, &tx).await.unwrap();
    drop(tx);
    while let Some(IpcRequest::SendKeys(msg)) = rx.recv().await {
        service.send_keys(msg.modifiers, &msg.keys).await.unwrap();
    }

    // Assert
    assert_eq!(forwarded, 4);
    let reports = platform.sent_on(PSM_INTERRUPT);
    assert_eq!(reports.len(), 4);
    assert_eq!(reports[0], vec![0xA1, 0x01, 0x02, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(reports[1], vec![0xA1, 0x01, 0x02, 0, 0x04, 0, 0, 0, 0, 0]);
    assert_eq!(reports[2], vec![0xA1, 0x01, 0x02, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(reports[3], vec![0xA1, 0x01, 0x00, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(KeyState::decode(&reports[3]).unwrap(), mirror);
    assert!(service.key_state().is_idle());
}

#[tokio::test(start_paused = true)]
async fn test_transmission_failure_affects_only_one_report() {
    let platform = MockBluetoothPlatform::new();
    let mut service = ready_service(&platform).await;

    service.send_keys(0, &[0x04]).await.unwrap();
    platform.fail_next_send();
    service.send_keys(0, &[0x04, 0x05]).await.unwrap();
    service.send_keys(0, &[0x05]).await.unwrap();

    let reports = platform.sent_on(PSM_INTERRUPT);
    assert_eq!(reports.len(), 2);
    assert_eq!(&reports[1][4..6], &[0x05, 0x00]);
    assert_eq!(service.state(), ServiceState::Ready);
}
