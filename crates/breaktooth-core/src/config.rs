//! TOML configuration shared by the `breaktooth` and `breaktooth-injector` binaries.
//!
//! Both processes read the same file, `/etc/breaktooth/breaktooth.toml` unless
//! overridden on the command line. A missing file yields
//! [`BreaktoothConfig::default()`]; any missing field takes its serde default,
//! so a partial file only needs the values it changes:
//!
//! ```toml
//! [emulator]
//! adapter = "hci1"
//!
//! [hijack]
//! security_level = "medium"
//! on_failure = "abort"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::protocol::messages::DEFAULT_SOCKET_PATH;
use crate::report::codec::ModifierMode;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/breaktooth/breaktooth.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BreaktoothConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub emulator: EmulatorConfig,
    #[serde(default)]
    pub sleep_monitor: SleepMonitorConfig,
    #[serde(default)]
    pub hijack: HijackConfig,
    #[serde(default)]
    pub ipc: IpcConfig,
    #[serde(default)]
    pub injector: InjectorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// HID emulation service settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmulatorConfig {
    /// Local adapter name, e.g. `hci0`.
    #[serde(default = "default_adapter")]
    pub adapter: String,
    /// Class of Device advertised while emulating (peripheral / keyboard).
    #[serde(default = "default_device_class")]
    pub device_class: u32,
    /// SDP service record XML handed to the profile manager.
    #[serde(default = "default_sdp_record_path")]
    pub sdp_record_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SleepMonitorConfig {
    /// Minimum spacing between two echo probes.
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    /// Path or name of the BlueZ `l2ping` utility.
    #[serde(default = "default_l2ping_path")]
    pub l2ping_path: PathBuf,
}

/// L2CAP socket security level, `BT_SECURITY_*`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    /// SDP only, no security.
    Sdp,
    Low,
    Medium,
    #[default]
    High,
}

/// What the orchestrator does when the link-key probe fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeFailurePolicy {
    /// Log the failure and start emulation anyway.
    #[default]
    Continue,
    /// Stop before emulation starts.
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HijackConfig {
    #[serde(default)]
    pub security_level: SecurityLevel,
    #[serde(default)]
    pub on_failure: ProbeFailurePolicy,
    /// Pause between the probe and the first channel connect.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IpcConfig {
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InjectorConfig {
    /// Fixed delay between two keyboard discovery attempts.
    #[serde(default = "default_discovery_retry_ms")]
    pub discovery_retry_ms: u64,
    #[serde(default)]
    pub modifier_mode: ModifierMode,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_adapter() -> String {
    "hci0".to_string()
}
fn default_device_class() -> u32 {
    0x2C_0540
}
fn default_sdp_record_path() -> PathBuf {
    PathBuf::from("/etc/breaktooth/sdp_record.xml")
}
fn default_probe_interval_ms() -> u64 {
    1_000
}
fn default_l2ping_path() -> PathBuf {
    PathBuf::from("l2ping")
}
fn default_settle_delay_ms() -> u64 {
    5_000
}
fn default_socket_path() -> PathBuf {
    PathBuf::from(DEFAULT_SOCKET_PATH)
}
fn default_discovery_retry_ms() -> u64 {
    3_000
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            adapter: default_adapter(),
            device_class: default_device_class(),
            sdp_record_path: default_sdp_record_path(),
        }
    }
}

impl Default for SleepMonitorConfig {
    fn default() -> Self {
        Self {
            probe_interval_ms: default_probe_interval_ms(),
            l2ping_path: default_l2ping_path(),
        }
    }
}

impl Default for HijackConfig {
    fn default() -> Self {
        Self {
            security_level: SecurityLevel::default(),
            on_failure: ProbeFailurePolicy::default(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
        }
    }
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            discovery_retry_ms: default_discovery_retry_ms(),
            modifier_mode: ModifierMode::default(),
        }
    }
}

impl SleepMonitorConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }
}

impl HijackConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl InjectorConfig {
    pub fn discovery_retry(&self) -> Duration {
        Duration::from_millis(self.discovery_retry_ms)
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses configuration from TOML text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is malformed or a field has the wrong type.
pub fn parse_config(content: &str) -> Result<BreaktoothConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Loads configuration from `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<BreaktoothConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            debug!("loading config from {}", path.display());
            parse_config(&content)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no config at {}; using defaults", path.display());
            Ok(BreaktoothConfig::default())
        }
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
