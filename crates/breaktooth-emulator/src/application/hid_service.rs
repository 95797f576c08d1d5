//! HidEmulationService: presents this adapter to the target as a keyboard.
//!
//! # Lifecycle
//!
//! ```text
//! Unregistered ─register─▶ Registered ─▶ ControlConnecting ─▶ ControlConnected
//!                                                                   │
//!                     Closed ◀── any connect failure    InterruptConnecting
//!                        ▲                                          │
//!                        └──────────── close() ─────────── Ready ◀──┘
//! ```
//!
//! Only [`ServiceState::Ready`] accepts report traffic. The two channels are
//! connected once, in order (control on PSM 17, then interrupt on PSM 19), and
//! are never reconnected.
//!
//! The service is the only writer of the authoritative [`KeyState`]. It is
//! owned by a single dispatch task in `main`, so IPC requests are applied one
//! at a time without a lock.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use bluer::Address;
use breaktooth_core::report::KeyState;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::{uuid, Uuid};

/// Bluetooth SIG UUID of the Human Interface Device service class.
pub const HID_PROFILE_UUID: Uuid = uuid!("00001124-0000-1000-8000-00805f9b34fb");

/// L2CAP PSM of the HID control channel.
pub const PSM_CONTROL: u16 = 17;

/// L2CAP PSM of the HID interrupt channel.
pub const PSM_INTERRUPT: u16 = 19;

/// Service lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Unregistered,
    Registered,
    ControlConnecting,
    ControlConnected,
    InterruptConnecting,
    Ready,
    Closed,
}

/// The two L2CAP channels of a HID connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    Control,
    Interrupt,
}

impl ChannelRole {
    pub fn psm(self) -> u16 {
        match self {
            ChannelRole::Control => PSM_CONTROL,
            ChannelRole::Interrupt => PSM_INTERRUPT,
        }
    }
}

impl std::fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelRole::Control => f.write_str("control"),
            ChannelRole::Interrupt => f.write_str("interrupt"),
        }
    }
}

/// Error reported by a [`BluetoothPlatform`] implementation.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The Bluetooth daemon rejected a request.
    #[error("bluetooth daemon error: {0}")]
    Daemon(String),

    /// An external helper command failed.
    #[error("command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Error type for [`HidEmulationService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The SDP service record file could not be read.
    #[error("cannot read service record {path}: {source}")]
    ServiceRecord {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Profile registration failed for a reason other than a conflict.
    #[error("profile registration failed: {0}")]
    Registration(#[source] PlatformError),

    /// A HID channel could not be connected. Fatal, no retry.
    #[error("{role} channel (PSM {psm}) connection failed: {source}", psm = .role.psm())]
    ChannelConnection {
        role: ChannelRole,
        #[source]
        source: PlatformError,
    },

    /// `initialize` was called outside [`ServiceState::Unregistered`].
    #[error("service cannot initialize from state {0:?}")]
    AlreadyInitialized(ServiceState),

    /// A report was submitted before the channels were up.
    #[error("service not ready (state {0:?})")]
    NotReady(ServiceState),
}

/// Identity handed to the Bluetooth daemon's profile manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSpec {
    pub uuid: Uuid,
    pub auto_connect: bool,
    /// SDP record XML.
    pub service_record: String,
}

impl ProfileSpec {
    /// The keyboard profile with the given service record.
    pub fn keyboard(service_record: String) -> Self {
        Self {
            uuid: HID_PROFILE_UUID,
            auto_connect: true,
            service_record,
        }
    }
}

/// Outcome of a profile registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered,
    /// The daemon already had a profile with this UUID.
    AlreadyRegistered,
}

/// Writes encoded reports to a connected channel.
#[async_trait]
pub trait ReportChannel: Send + Sync {
    async fn send(&self, report: &[u8]) -> io::Result<usize>;
}

/// Bluetooth operations the service needs from the host.
#[async_trait]
pub trait BluetoothPlatform: Send + Sync {
    type Channel: ReportChannel;

    /// Registers the profile. A UUID conflict must map to
    /// [`Registration::AlreadyRegistered`], not an error.
    async fn register_profile(&mut self, profile: &ProfileSpec)
        -> Result<Registration, PlatformError>;

    /// Sets the local adapter's Class of Device.
    async fn set_device_class(&self, class: u32) -> Result<(), PlatformError>;

    /// Opens a SEQPACKET L2CAP connection to `target` on `psm`.
    async fn connect_channel(&self, target: Address, psm: u16)
        -> Result<Self::Channel, PlatformError>;
}

/// Reads the SDP record file once at startup.
///
/// # Errors
///
/// Returns [`ServiceError::ServiceRecord`] if the file is unreadable.
pub async fn load_service_record(path: &Path) -> Result<String, ServiceError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ServiceError::ServiceRecord {
            path: path.display().to_string(),
            source,
        })
}

/// The HID emulation service.
pub struct HidEmulationService<P: BluetoothPlatform> {
    platform: P,
    profile: ProfileSpec,
    device_class: u32,
    state: ServiceState,
    control: Option<P::Channel>,
    interrupt: Option<P::Channel>,
    keys: KeyState,
}

impl<P: BluetoothPlatform> HidEmulationService<P> {
    pub fn new(platform: P, profile: ProfileSpec, device_class: u32) -> Self {
        Self {
            platform,
            profile,
            device_class,
            state: ServiceState::Unregistered,
            control: None,
            interrupt: None,
            keys: KeyState::new(),
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Last state accepted through [`send_report`](Self::send_report).
    pub fn key_state(&self) -> KeyState {
        self.keys
    }

    /// Registers the profile, sets the device class and connects both
    /// channels to `target`.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::AlreadyInitialized`] unless the state is `Unregistered`.
    /// - [`ServiceError::Registration`] for a non-conflict registration failure.
    /// - [`ServiceError::ChannelConnection`] if either connect fails; the
    ///   service is then `Closed`.
    pub async fn initialize(&mut self, target: Address) -> Result<(), ServiceError> {
        if self.state != ServiceState::Unregistered {
            return Err(ServiceError::AlreadyInitialized(self.state));
        }
        let span = info_span!("hid_service", %target);
        self.initialize_inner(target).instrument(span).await
    }

    async fn initialize_inner(&mut self, target: Address) -> Result<(), ServiceError> {
        match self
            .platform
            .register_profile(&self.profile)
            .await
            .map_err(ServiceError::Registration)?
        {
            Registration::Registered => info!(uuid = %self.profile.uuid, "HID profile registered"),
            Registration::AlreadyRegistered => info!("UUID already registered"),
        }
        self.state = ServiceState::Registered;

        // hciconfig exit status is not checked by BlueZ tooling either
        if let Err(e) = self.platform.set_device_class(self.device_class).await {
            warn!("could not set device class 0x{:06X}: {e}", self.device_class);
        } else {
            debug!("device class set to 0x{:06X}", self.device_class);
        }

        self.state = ServiceState::ControlConnecting;
        let control = self.connect(target, ChannelRole::Control).await?;
        self.control = Some(control);
        self.state = ServiceState::ControlConnected;

        self.state = ServiceState::InterruptConnecting;
        let interrupt = self.connect(target, ChannelRole::Interrupt).await?;
        self.interrupt = Some(interrupt);
        self.state = ServiceState::Ready;

        info!("HID channels connected; service ready");
        Ok(())
    }

    async fn connect(
        &mut self,
        target: Address,
        role: ChannelRole,
    ) -> Result<P::Channel, ServiceError> {
        info!("connecting {role} channel (PSM {})", role.psm());
        match self.platform.connect_channel(target, role.psm()).await {
            Ok(channel) => {
                info!("{role} channel connected");
                Ok(channel)
            }
            Err(source) => {
                self.close();
                Err(ServiceError::ChannelConnection { role, source })
            }
        }
    }

    /// Writes `state` to the interrupt channel.
    ///
    /// A failed write is logged and the report dropped; the service stays
    /// `Ready` and later reports are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotReady`] outside [`ServiceState::Ready`].
    pub async fn send_report(&mut self, state: &KeyState) -> Result<(), ServiceError> {
        let channel = match (&self.interrupt, self.state) {
            (Some(channel), ServiceState::Ready) => channel,
            _ => return Err(ServiceError::NotReady(self.state)),
        };

        self.keys = *state;
        let report = state.encode();
        match channel.send(&report).await {
            Ok(_) => debug!(?report, "report sent"),
            Err(e) => warn!("report dropped: {e}"),
        }
        Ok(())
    }

    /// IPC handler: rebuilds a full state from a modifier byte and up to six
    /// usage codes and sends it.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotReady`] outside [`ServiceState::Ready`].
    pub async fn send_keys(&mut self, modifiers: u8, keys: &[u8]) -> Result<(), ServiceError> {
        let state = KeyState::from_parts(modifiers, keys);
        self.send_report(&state).await
    }

    /// Drops both channels and moves to [`ServiceState::Closed`].
    pub fn close(&mut self) {
        self.interrupt = None;
        self.control = None;
        if self.state != ServiceState::Closed {
            info!(from = ?self.state, "HID service closed");
        }
        self.state = ServiceState::Closed;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
