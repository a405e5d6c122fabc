//! Device type definitions
//!
//! Snapshots handed over by the host on every poll, and the event
//! enum the watcher uses to forward them to the hub.

use serde::{Deserialize, Serialize};

/// A single button record (pressed flag plus analog value in 0.0..=1.0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonState {
    pub pressed: bool,
    pub value: f32,
}

impl ButtonState {
    pub fn pressed() -> Self {
        Self { pressed: true, value: 1.0 }
    }

    pub fn released() -> Self {
        Self::default()
    }
}

/// Read-only snapshot of a device as reported by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDeviceState {
    /// Stable for the connected lifetime of the physical device
    pub id: String,

    /// Axis values, each in -1.0..=1.0
    #[serde(default)]
    pub axes: Vec<f32>,

    #[serde(default)]
    pub buttons: Vec<ButtonState>,

    /// Bumped by the host whenever any value changes
    #[serde(default)]
    pub revision: u64,
}

impl RawDeviceState {
    /// Create an idle device with `axes` centred axes and `buttons` released buttons
    pub fn new(id: impl Into<String>, axes: usize, buttons: usize) -> Self {
        Self {
            id: id.into(),
            axes: vec![0.0; axes],
            buttons: vec![ButtonState::released(); buttons],
            revision: 0,
        }
    }

    /// Pressed flags in slot order
    pub fn pressed_flags(&self) -> Vec<bool> {
        self.buttons.iter().map(|b| b.pressed).collect()
    }
}

/// Events surfaced by the device watcher
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    Connected(RawDeviceState),
    Disconnected(RawDeviceState),
    Updated(RawDeviceState),
}

impl DeviceEvent {
    pub fn device(&self) -> &RawDeviceState {
        match self {
            DeviceEvent::Connected(d) | DeviceEvent::Disconnected(d) | DeviceEvent::Updated(d) => d,
        }
    }
}

/// Per-device update policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMode {
    pub continuous: bool,
}

impl UpdateMode {
    pub fn continuous() -> Self {
        Self { continuous: true }
    }

    pub fn discrete() -> Self {
        Self { continuous: false }
    }
}

impl Default for UpdateMode {
    fn default() -> Self {
        Self::continuous()
    }
}
