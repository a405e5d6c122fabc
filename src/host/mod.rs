//! Host abstraction for device enumeration and frame scheduling
//!
//! The platform binding implements [`Host`] and forwards its native
//! connect/disconnect notifications and fired frames into the router.

pub mod mock;

pub use mock::MockHost;

use crate::device::RawDeviceState;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Host does not provide device polling")]
    PollingUnavailable,

    #[error("Frame scheduling failed: {0}")]
    Scheduling(String),
}

/// Opaque handle for a scheduled frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Capabilities the host platform must supply
pub trait Host {
    /// Current device slots in enumeration order. Disconnected slots are `None`.
    fn enumerate_devices(&self) -> Vec<Option<RawDeviceState>>;

    /// Request a single frame callback
    fn schedule_next_frame(&self) -> Result<FrameHandle, HostError>;

    /// Cancel a previously requested frame
    fn cancel_frame(&self, handle: FrameHandle);

    /// Clock used for the discrete-mode debounce window
    fn now(&self) -> Instant {
        Instant::now()
    }

    /// Whether the raw polling primitive exists on this platform
    fn supports_polling(&self) -> bool {
        true
    }
}
