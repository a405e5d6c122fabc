//! Semantic event router
//!
//! Public facade: wires a [`ControllerMapping`] and a [`PubSub`] registry
//! in as the hub's reaction points, so raw slot changes come out as named
//! events ("left", "zoom-in", "J1", ...). Unmapped slots never fire.
//! Connection changes always fire [`DEVICE_CONNECTED_EVENT`] and
//! [`DEVICE_DISCONNECTED_EVENT`] with the raw device snapshot.

use crate::device::{
    RawDeviceState, TrackedDevice, TrackerSettings, DEVICE_CONNECTED_EVENT, DEVICE_DISCONNECTED_EVENT,
};
use crate::host::{FrameHandle, Host};
use crate::hub::{ControllerHandler, ControllerHub, HubError};
use crate::mapping::{Config, ConfigError, ControllerMapping};
use crate::pubsub::{Callback, PubSub};
use log::trace;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Hub(#[from] HubError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Arguments delivered to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    Axis {
        value: f32,
        axis_index: usize,
        device_id: String,
    },
    Button {
        button_index: usize,
        device_id: String,
    },
    Device(RawDeviceState),
    /// Payload of an application-level [`SemanticEventRouter::trigger`]
    Custom(serde_json::Value),
}

/// Reaction points that translate slots to names and fan out to subscribers
pub struct SemanticDispatcher {
    mapping: ControllerMapping,
    bus: PubSub<ControlEvent>,
}

impl SemanticDispatcher {
    pub fn new(mapping: ControllerMapping) -> Self {
        Self {
            mapping,
            bus: PubSub::new(),
        }
    }

    fn axis(&self, value: f32, axis_index: usize, device_id: &str) {
        let Some(name) = self.mapping.axis_name(value, axis_index) else {
            trace!("Axis {} of '{}' is unmapped", axis_index, device_id);
            return;
        };
        self.bus.trigger(
            name,
            &ControlEvent::Axis {
                value,
                axis_index,
                device_id: device_id.to_string(),
            },
        );
    }
}

impl ControllerHandler for SemanticDispatcher {
    fn on_axis_continuous(&mut self, value: f32, axis_index: usize, device_id: &str) {
        self.axis(value, axis_index, device_id);
    }

    fn on_axis_discrete(&mut self, value: f32, axis_index: usize, device_id: &str) {
        self.axis(value, axis_index, device_id);
    }

    fn on_button(&mut self, button_index: usize, device_id: &str) {
        let Some(name) = self.mapping.button_name(button_index) else {
            trace!("Button {} of '{}' is unmapped", button_index, device_id);
            return;
        };
        self.bus.trigger(
            name,
            &ControlEvent::Button {
                button_index,
                device_id: device_id.to_string(),
            },
        );
    }

    fn on_connected(&mut self, device: &RawDeviceState) {
        self.bus
            .trigger(DEVICE_CONNECTED_EVENT, &ControlEvent::Device(device.clone()));
    }

    fn on_disconnected(&mut self, device: &RawDeviceState) {
        self.bus
            .trigger(DEVICE_DISCONNECTED_EVENT, &ControlEvent::Device(device.clone()));
    }
}

pub struct SemanticEventRouter<H: Host> {
    hub: ControllerHub<H, SemanticDispatcher>,
}

impl<H: Host> SemanticEventRouter<H> {
    /// Build a router over `host` using `mapping` to name controls
    pub fn new(host: H, mapping: ControllerMapping, settings: TrackerSettings) -> Result<Self, RouterError> {
        let hub = ControllerHub::new(host, settings, SemanticDispatcher::new(mapping))?;
        Ok(Self { hub })
    }

    /// Build a router from configuration, using its default model and thresholds
    pub fn from_config(host: H, config: &Config) -> Result<Self, RouterError> {
        let mapping = config.default_mapping()?;
        Self::new(host, mapping, config.settings.tracker_settings())
    }

    /// Start listening; devices connect in continuous mode when `continuous` is set
    pub fn start(&mut self, continuous: bool) -> &mut Self {
        self.hub.start(continuous);
        self
    }

    pub fn stop(&mut self) -> &mut Self {
        self.hub.stop();
        self
    }

    pub fn on(&mut self, name: &str, callback: Callback<ControlEvent>) -> &mut Self {
        self.hub.handler_mut().bus.on(name, callback);
        self
    }

    /// Unsubscribe `callback` from `name`, or everything on `name` when `None`
    pub fn off(&mut self, name: &str, callback: Option<&Callback<ControlEvent>>) -> &mut Self {
        self.hub.handler_mut().bus.off(name, callback);
        self
    }

    pub fn off_all(&mut self) -> &mut Self {
        self.hub.handler_mut().bus.off_all();
        self
    }

    /// Fire `name` directly. Returns how many subscribers ran.
    pub fn trigger(&self, name: &str, args: &ControlEvent) -> usize {
        self.hub.handler().bus.trigger(name, args)
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.hub.handler().bus.subscriber_count(name)
    }

    /// Returns how many devices changed mode
    pub fn set_update_mode(&mut self, continuous: bool, device_id: Option<&str>) -> usize {
        self.hub.set_update_mode(continuous, device_id)
    }

    /// Returns how many devices were flipped
    pub fn toggle_update_mode(&mut self, device_id: Option<&str>) -> usize {
        self.hub.toggle_update_mode(device_id)
    }

    pub fn device_connected(&mut self, device: RawDeviceState) -> Result<(), RouterError> {
        Ok(self.hub.device_connected(device)?)
    }

    pub fn device_disconnected(&mut self, device: RawDeviceState) -> Result<(), RouterError> {
        Ok(self.hub.device_disconnected(device)?)
    }

    pub fn frame(&mut self, handle: FrameHandle) -> Result<(), RouterError> {
        Ok(self.hub.frame(handle)?)
    }

    /// Retry frame scheduling after a host error
    pub fn resume_polling(&mut self) -> Result<(), RouterError> {
        Ok(self.hub.resume_polling()?)
    }

    pub fn mapping(&self) -> &ControllerMapping {
        &self.hub.handler().mapping
    }

    pub fn tracked_device(&self, device_id: &str) -> Option<&TrackedDevice> {
        self.hub.tracked_device(device_id)
    }

    pub fn device_count(&self) -> usize {
        self.hub.device_count()
    }

    pub fn is_polling(&self) -> bool {
        self.hub.is_polling()
    }

    pub fn host(&self) -> &H {
        self.hub.host()
    }
}
