//! In-memory stand-ins for the Bluetooth adapters.
//!
//! The real adapters talk to `bluetoothd` and open kernel L2CAP sockets, which
//! needs a powered adapter, root and a reachable target. These mocks record
//! every call in shared `Mutex<Vec<...>>` fields instead, so tests can assert
//! on exactly what the application layer asked for and in what order.
//!
//! Both mocks are `Clone`; clones share their records. Keep one clone in the
//! test and move the other into the code under test.
//!
//! ```ignore
//! let platform = MockBluetoothPlatform::new();
//! let mut service = HidEmulationService::new(platform.clone(), profile, 0x2C0540);
//! service.initialize(target).await?;
//! assert_eq!(platform.connects().len(), 2);
//! ```

use std::collections::HashSet;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bluer::Address;
use breaktooth_core::config::SecurityLevel;

use crate::application::hid_service::{
    BluetoothPlatform, PlatformError, ProfileSpec, Registration, ReportChannel,
};
use crate::application::hijack::{ProbeSocket, ProbeSocketFactory};

// ── Bluetooth platform ────────────────────────────────────────────────────────

#[derive(Default)]
struct PlatformRecord {
    profiles: Vec<ProfileSpec>,
    device_classes: Vec<u32>,
    connects: Vec<(Address, u16)>,
    sent: Vec<(u16, Vec<u8>)>,
    fail_next_send: bool,
}

/// Records profile registrations, class changes, connects and sent reports.
#[derive(Clone, Default)]
pub struct MockBluetoothPlatform {
    record: Arc<Mutex<PlatformRecord>>,
    profile_exists: bool,
    fail_device_class: bool,
    refused_psms: HashSet<u16>,
}

impl MockBluetoothPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registration answers as if the UUID were already taken.
    pub fn with_existing_profile(mut self) -> Self {
        self.profile_exists = true;
        self
    }

    pub fn failing_device_class(mut self) -> Self {
        self.fail_device_class = true;
        self
    }

    /// Connects to `psm` fail with `ECONNREFUSED`.
    pub fn refusing_psm(mut self, psm: u16) -> Self {
        self.refused_psms.insert(psm);
        self
    }

    /// The next report write on any channel fails.
    pub fn fail_next_send(&self) {
        self.record.lock().unwrap().fail_next_send = true;
    }

    pub fn registered_profiles(&self) -> Vec<ProfileSpec> {
        self.record.lock().unwrap().profiles.clone()
    }

    pub fn device_classes(&self) -> Vec<u32> {
        self.record.lock().unwrap().device_classes.clone()
    }

    /// Every attempted connect, in order, including refused ones.
    pub fn connects(&self) -> Vec<(Address, u16)> {
        self.record.lock().unwrap().connects.clone()
    }

    /// Reports successfully written to the channel on `psm`.
    pub fn sent_on(&self, psm: u16) -> Vec<Vec<u8>> {
        self.record
            .lock()
            .unwrap()
            .sent
            .iter()
            .filter(|(p, _)| *p == psm)
            .map(|(_, bytes)| bytes.clone())
            .collect()
    }
}

/// Channel handed out by [`MockBluetoothPlatform`].
pub struct MockChannel {
    psm: u16,
    record: Arc<Mutex<PlatformRecord>>,
}

#[async_trait]
impl ReportChannel for MockChannel {
    async fn send(&self, report: &[u8]) -> io::Result<usize> {
        let mut record = self.record.lock().unwrap();
        if record.fail_next_send {
            record.fail_next_send = false;
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        record.sent.push((self.psm, report.to_vec()));
        Ok(report.len())
    }
}

#[async_trait]
impl BluetoothPlatform for MockBluetoothPlatform {
    type Channel = MockChannel;

    async fn register_profile(
        &mut self,
        profile: &ProfileSpec,
    ) -> Result<Registration, PlatformError> {
        self.record.lock().unwrap().profiles.push(profile.clone());
        if self.profile_exists {
            Ok(Registration::AlreadyRegistered)
        } else {
            Ok(Registration::Registered)
        }
    }

    async fn set_device_class(&self, class: u32) -> Result<(), PlatformError> {
        if self.fail_device_class {
            return Err(PlatformError::Command {
                command: "hciconfig".into(),
                reason: "mock failure".into(),
            });
        }
        self.record.lock().unwrap().device_classes.push(class);
        Ok(())
    }

    async fn connect_channel(
        &self,
        target: Address,
        psm: u16,
    ) -> Result<MockChannel, PlatformError> {
        self.record.lock().unwrap().connects.push((target, psm));
        if self.refused_psms.contains(&psm) {
            return Err(io::Error::from_raw_os_error(111).into());
        }
        Ok(MockChannel {
            psm,
            record: Arc::clone(&self.record),
        })
    }
}

// ── Probe sockets ─────────────────────────────────────────────────────────────

/// How the next probe socket behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeBehaviour {
    /// Everything succeeds.
    Accept,
    /// `connect` fails with the given OS error number.
    RefuseConnect(i32),
    /// `set_security` fails.
    RejectSecurity,
    /// The socket cannot be created.
    FailOpen,
}

#[derive(Default)]
struct ProbeRecord {
    security_levels: Vec<SecurityLevel>,
    connects: Vec<(Address, u16)>,
    closes: usize,
}

/// Factory of recording probe sockets.
#[derive(Clone)]
pub struct MockProbeSockets {
    behaviour: ProbeBehaviour,
    record: Arc<Mutex<ProbeRecord>>,
}

impl MockProbeSockets {
    pub fn new(behaviour: ProbeBehaviour) -> Self {
        Self {
            behaviour,
            record: Arc::default(),
        }
    }

    pub fn closes(&self) -> usize {
        self.record.lock().unwrap().closes
    }

    pub fn connects(&self) -> Vec<(Address, u16)> {
        self.record.lock().unwrap().connects.clone()
    }

    pub fn security_levels(&self) -> Vec<SecurityLevel> {
        self.record.lock().unwrap().security_levels.clone()
    }
}

pub struct MockProbeSocket {
    behaviour: ProbeBehaviour,
    record: Arc<Mutex<ProbeRecord>>,
}

impl ProbeSocketFactory for MockProbeSockets {
    type Socket = MockProbeSocket;

    fn open(&self) -> io::Result<MockProbeSocket> {
        if self.behaviour == ProbeBehaviour::FailOpen {
            // EAFNOSUPPORT: no Bluetooth support in the kernel
            return Err(io::Error::from_raw_os_error(97));
        }
        Ok(MockProbeSocket {
            behaviour: self.behaviour,
            record: Arc::clone(&self.record),
        })
    }
}

#[async_trait]
impl ProbeSocket for MockProbeSocket {
    fn set_security(&mut self, level: SecurityLevel) -> io::Result<()> {
        if self.behaviour == ProbeBehaviour::RejectSecurity {
            return Err(io::Error::from(io::ErrorKind::InvalidInput));
        }
        self.record.lock().unwrap().security_levels.push(level);
        Ok(())
    }

    async fn connect(&mut self, target: Address, psm: u16) -> io::Result<()> {
        self.record.lock().unwrap().connects.push((target, psm));
        match self.behaviour {
            ProbeBehaviour::RefuseConnect(errno) => Err(io::Error::from_raw_os_error(errno)),
            _ => Ok(()),
        }
    }

    fn close(self) {
        self.record.lock().unwrap().closes += 1;
    }
}
