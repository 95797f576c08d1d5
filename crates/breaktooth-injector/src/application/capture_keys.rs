//! KeyCaptureClient: folds local key transitions into a report state and
//! pushes every change to the emulator.
//!
//! The client keeps its own [`KeyState`] mirror. Each qualifying transition
//! (press or release, never auto-repeat) goes through
//! [`apply_with`](breaktooth_core::report::apply_with) and then exactly one
//! [`KeySink::send_keys`] call carries the full resulting state.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use breaktooth_core::report::{apply_with, KeyState, ModifierMode};
use futures_util::{pin_mut, Stream, StreamExt};
use thiserror::Error;
use tokio::time::{self, timeout};
use tracing::{debug, info, info_span, warn, Instrument};

/// How long a read may block before the `running` flag is re-checked.
const READ_POLL: Duration = Duration::from_millis(200);

/// One key going down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTransition {
    /// Linux evdev key code.
    pub code: u16,
    pub pressed: bool,
}

impl KeyTransition {
    pub fn press(code: u16) -> Self {
        Self {
            code,
            pressed: true,
        }
    }

    pub fn release(code: u16) -> Self {
        Self {
            code,
            pressed: false,
        }
    }
}

/// Errors from keyboard discovery and capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The shutdown flag was cleared.
    #[error("capture cancelled")]
    Cancelled,

    /// Reading from the input device failed.
    #[error("input device read failed: {0}")]
    Read(#[from] io::Error),
}

/// Destination of key states, normally the emulator's IPC endpoint.
#[cfg_attr(test, mockall::automock(type Error = std::io::Error;))]
#[async_trait]
pub trait KeySink: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends the modifier byte and the six key slots.
    async fn send_keys(&mut self, modifiers: u8, keys: &[u8]) -> Result<(), Self::Error>;
}

/// Finds a local keyboard.
pub trait KeyboardLocator: Send + Sync {
    type Device: Send;

    /// Returns the first keyboard with a usable device node, with its path
    /// for logging.
    fn locate(&self) -> Option<(String, Self::Device)>;
}

/// Polls `locator` until a keyboard shows up, waiting `retry` between
/// attempts. No attempt limit and no backoff.
///
/// # Errors
///
/// Returns [`CaptureError::Cancelled`] once `running` is cleared.
pub async fn discover<L: KeyboardLocator>(
    locator: &L,
    retry: Duration,
    running: &AtomicBool,
) -> Result<L::Device, CaptureError> {
    while running.load(Ordering::Relaxed) {
        if let Some((path, device)) = locator.locate() {
            info!("found keyboard: {path}");
            return Ok(device);
        }
        warn!("keyboard not found, retrying in {retry:?}");
        time::sleep(retry).await;
    }
    Err(CaptureError::Cancelled)
}

/// The capture client.
pub struct KeyCaptureClient<S> {
    sink: S,
    state: KeyState,
    mode: ModifierMode,
}

impl<S: KeySink> KeyCaptureClient<S> {
    pub fn new(sink: S, mode: ModifierMode) -> Self {
        Self {
            sink,
            state: KeyState::new(),
            mode,
        }
    }

    /// The local mirror of the emulator's report state.
    pub fn state(&self) -> KeyState {
        self.state
    }

    /// Applies one transition and sends the resulting state.
    ///
    /// # Errors
    ///
    /// Returns the sink's error; the mirror is updated regardless.
    pub async fn handle_transition(&mut self, transition: KeyTransition) -> Result<(), S::Error> {
        self.state = apply_with(self.state, transition.code, transition.pressed, self.mode);
        debug!(?transition, state = ?self.state, "key transition");
        self.sink
            .send_keys(self.state.modifiers.bits(), &self.state.keys)
            .await
    }

    /// Drives the client from a stream of transitions until the stream ends
    /// or `running` is cleared. Sink failures are logged and skipped.
    ///
    /// Returns the number of transitions handled.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Read`] if the stream yields an I/O error.
    pub async fn run<St>(&mut self, events: St, running: &AtomicBool) -> Result<u64, CaptureError>
    where
        St: Stream<Item = io::Result<KeyTransition>>,
    {
        pin_mut!(events);
        let mut handled = 0u64;

        async {
            info!("capture loop running");
            while running.load(Ordering::Relaxed) {
                let next = match timeout(READ_POLL, events.next()).await {
                    Ok(next) => next,
                    Err(_) => continue,
                };
                let Some(item) = next else {
                    info!("input stream ended");
                    break;
                };
                if let Err(e) = self.handle_transition(item?).await {
                    warn!("key state not delivered: {e}");
                }
                handled += 1;
            }
            Ok(handled)
        }
        .instrument(info_span!("key_capture"))
        .await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
