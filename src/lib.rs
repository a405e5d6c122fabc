//! padsense: semantic gamepad events
//!
//! This library polls controllers through a host-provided API, tracks
//! per-device state frame over frame, and re-dispatches raw axis/button
//! changes as named events using a per-model mapping table.

pub mod device;
pub mod host;
pub mod hub;
pub mod mapping;
pub mod pubsub;
pub mod router;

// Re-export commonly used items
pub use device::{ButtonState, RawDeviceState, UpdateMode};
pub use host::{FrameHandle, Host, HostError, MockHost};
pub use hub::{ControllerHandler, ControllerHub, HubError};
pub use mapping::{Config, ControllerMapping};
pub use pubsub::{callback, Callback, PubSub};
pub use router::{ControlEvent, RouterError, SemanticEventRouter};
