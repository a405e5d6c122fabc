//! Tuning constants and well-known event names
//!
//! Defaults for the state tracker thresholds and the discrete-mode
//! debounce window, plus the fixed names used for connection events.

// ============================================================================
// Axis thresholds
// ============================================================================

/// Axes closer to rest than this are ignored in continuous mode
pub const CONTINUOUS_AXIS_THRESHOLD: f32 = 0.05;

/// Axes closer to rest than this are ignored in discrete mode.
/// Coarser than the continuous threshold because sensitive sticks
/// oscillate around zero.
pub const DISCRETE_AXIS_THRESHOLD: f32 = 0.2;

// ============================================================================
// Timing Constants
// ============================================================================

/// Minimum gap between accepted updates in discrete mode (milliseconds)
pub const DISCRETE_UPDATE_DELAY_MS: u64 = 350;

// ============================================================================
// Event names
// ============================================================================

pub const DEVICE_CONNECTED_EVENT: &str = "device-connected";
pub const DEVICE_DISCONNECTED_EVENT: &str = "device-disconnected";
