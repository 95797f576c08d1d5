//! [`BluetoothPlatform`] backed by BlueZ.
//!
//! - Profile registration goes through `org.bluez.ProfileManager1` on the
//!   system bus (via `bluer`). The returned handle is kept for the lifetime of
//!   the platform; dropping it unregisters the profile.
//! - The Class of Device is written with `hciconfig <adapter> class <hex>`;
//!   `bluetoothd` exposes the class read-only.
//! - HID channels are kernel `SOCK_SEQPACKET` L2CAP sockets.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use bluer::l2cap::{SeqPacket, Socket, SocketAddr};
use bluer::rfcomm::{Profile, ProfileHandle};
use bluer::{Address, AddressType, ErrorKind, Session};
use tokio::process::Command;
use tracing::debug;

use crate::application::hid_service::{
    BluetoothPlatform, PlatformError, ProfileSpec, Registration, ReportChannel,
};

/// A connected HID channel.
pub struct L2capChannel {
    conn: SeqPacket,
}

#[async_trait]
impl ReportChannel for L2capChannel {
    async fn send(&self, report: &[u8]) -> io::Result<usize> {
        self.conn.send(report).await
    }
}

/// BlueZ implementation of [`BluetoothPlatform`].
pub struct BluezPlatform {
    session: Session,
    adapter: String,
    hciconfig: PathBuf,
    profile: Option<ProfileHandle>,
}

impl BluezPlatform {
    /// Opens a D-Bus session to `bluetoothd` and powers on `adapter`.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Daemon`] if the daemon is unreachable or the
    /// adapter does not exist.
    pub async fn connect(adapter: &str) -> Result<Self, PlatformError> {
        let session = Session::new().await.map_err(daemon_error)?;
        let handle = session.adapter(adapter).map_err(daemon_error)?;
        if !handle.is_powered().await.map_err(daemon_error)? {
            debug!("powering on {adapter}");
            handle.set_powered(true).await.map_err(daemon_error)?;
        }
        Ok(Self {
            session,
            adapter: adapter.to_string(),
            hciconfig: PathBuf::from("hciconfig"),
            profile: None,
        })
    }
}

fn daemon_error(e: bluer::Error) -> PlatformError {
    PlatformError::Daemon(e.to_string())
}

/// Class of Device as the hex literal `hciconfig` expects.
pub(crate) fn class_argument(class: u32) -> String {
    format!("0x{class:06x}")
}

#[async_trait]
impl BluetoothPlatform for BluezPlatform {
    type Channel = L2capChannel;

    async fn register_profile(
        &mut self,
        spec: &ProfileSpec,
    ) -> Result<Registration, PlatformError> {
        let profile = Profile {
            uuid: spec.uuid,
            auto_connect: Some(spec.auto_connect),
            service_record: Some(spec.service_record.clone()),
            ..Default::default()
        };
        match self.session.register_profile(profile).await {
            Ok(handle) => {
                self.profile = Some(handle);
                Ok(Registration::Registered)
            }
            Err(e) if matches!(e.kind, ErrorKind::AlreadyExists) => {
                Ok(Registration::AlreadyRegistered)
            }
            Err(e) => Err(daemon_error(e)),
        }
    }

    async fn set_device_class(&self, class: u32) -> Result<(), PlatformError> {
        let arg = class_argument(class);
        let status = Command::new(&self.hciconfig)
            .args([self.adapter.as_str(), "class", arg.as_str()])
            .status()
            .await?;
        if status.success() {
            Ok(())
        } else {
            Err(PlatformError::Command {
                command: format!("hciconfig {} class {arg}", self.adapter),
                reason: status.to_string(),
            })
        }
    }

    async fn connect_channel(
        &self,
        target: Address,
        psm: u16,
    ) -> Result<L2capChannel, PlatformError> {
        let socket = Socket::<SeqPacket>::new_seq_packet()?;
        socket.bind(SocketAddr::any_br_edr())?;
        let conn = socket
            .connect(SocketAddr::new(target, AddressType::BrEdr, psm))
            .await?;
        Ok(L2capChannel { conn })
    }
}
