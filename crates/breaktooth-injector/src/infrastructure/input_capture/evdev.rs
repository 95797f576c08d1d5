//! Linux evdev keyboard adapter.

use std::io;

use evdev::{Device, InputEvent, InputEventKind, Key};
use futures_util::{future, Stream, StreamExt};
use tracing::debug;

use crate::application::capture_keys::{KeyTransition, KeyboardLocator};

const VALUE_RELEASE: i32 = 0;
const VALUE_PRESS: i32 = 1;

/// Locates keyboards by enumerating `/dev/input/event*`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvdevLocator;

impl KeyboardLocator for EvdevLocator {
    type Device = Device;

    fn locate(&self) -> Option<(String, Device)> {
        evdev::enumerate().find_map(|(path, dev)| {
            let is_keyboard = dev
                .supported_keys()
                .is_some_and(|keys| keys.contains(Key::KEY_A));
            debug!(path = %path.display(), name = ?dev.name(), is_keyboard, "input device");
            is_keyboard.then(|| (path.display().to_string(), dev))
        })
    }
}

/// Maps one raw event to a transition. Only key events with value 1 (press)
/// or 0 (release) qualify.
pub fn to_transition(event: &InputEvent) -> Option<KeyTransition> {
    let InputEventKind::Key(key) = event.kind() else {
        return None;
    };
    match event.value() {
        VALUE_PRESS => Some(KeyTransition::press(key.code())),
        VALUE_RELEASE => Some(KeyTransition::release(key.code())),
        _ => None,
    }
}

/// Opens `device` as an async event stream of key transitions.
///
/// # Errors
///
/// Returns the error from switching the device node to non-blocking mode.
pub fn key_transitions(
    device: Device,
) -> io::Result<impl Stream<Item = io::Result<KeyTransition>>> {
    let events = device.into_event_stream()?;
    Ok(events.filter_map(|item| {
        future::ready(match item {
            Ok(event) => to_transition(&event).map(Ok),
            Err(e) => Some(Err(e)),
        })
    }))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use evdev::EventType;

    #[test]
    fn test_press_and_release_map_to_transitions() {
        let press = InputEvent::new(EventType::KEY, Key::KEY_A.code(), 1);
        let release = InputEvent::new(EventType::KEY, Key::KEY_A.code(), 0);

        assert_eq!(to_transition(&press), Some(KeyTransition::press(30)));
        assert_eq!(to_transition(&release), Some(KeyTransition::release(30)));
    }

    #[test]
    fn test_auto_repeat_is_dropped() {
        let repeat = InputEvent::new(EventType::KEY, Key::KEY_A.code(), 2);

        assert_eq!(to_transition(&repeat), None);
    }

    #[test]
    fn test_non_key_events_are_dropped() {
        // MSC_SCAN accompanies most key presses
        let scan = InputEvent::new(EventType::MISC, 4, 0x70004);
        let sync = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);

        assert_eq!(to_transition(&scan), None);
        assert_eq!(to_transition(&sync), None);
    }
}
