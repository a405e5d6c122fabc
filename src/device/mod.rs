//! Device polling and state tracking
//!
//! This module provides:
//! - Raw device snapshots and watcher events
//! - Threshold and debounce constants
//! - Revision-stamp polling against the host
//! - Per-device continuous/discrete update tracking

pub mod constants;
pub mod types;
pub mod tracker;
pub mod watcher;

// Re-export commonly used items
pub use constants::*;
pub use types::*;
pub use tracker::{DeviceStateTracker, TrackedDevice, TrackerError, TrackerSettings, UpdateOutcome};
pub use watcher::DeviceWatcher;
