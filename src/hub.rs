//! Controller hub
//!
//! Composes the [`DeviceWatcher`] and the [`DeviceStateTracker`] and
//! reports raw axis/button/connection changes to a [`ControllerHandler`].
//! The platform binding drives it through [`ControllerHub::device_connected`],
//! [`ControllerHub::device_disconnected`] and [`ControllerHub::frame`].

use crate::device::{
    DeviceEvent, DeviceStateTracker, DeviceWatcher, RawDeviceState, TrackedDevice, TrackerError,
    TrackerSettings, UpdateMode,
};
use crate::host::{FrameHandle, Host, HostError};
use crossbeam_channel::{unbounded, Receiver};
use log::{debug, info};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),
}

/// Reaction points for raw controller changes. Every method defaults to a no-op.
pub trait ControllerHandler {
    /// Axis past the continuous threshold on a continuous-mode device
    fn on_axis_continuous(&mut self, _value: f32, _axis_index: usize, _device_id: &str) {}

    /// Axis past the discrete threshold on an accepted discrete-mode update
    fn on_axis_discrete(&mut self, _value: f32, _axis_index: usize, _device_id: &str) {}

    /// Button held on the sampled frame
    fn on_button(&mut self, _button_index: usize, _device_id: &str) {}

    fn on_connected(&mut self, _device: &RawDeviceState) {}

    fn on_disconnected(&mut self, _device: &RawDeviceState) {}
}

pub struct ControllerHub<H: Host, R: ControllerHandler> {
    watcher: DeviceWatcher<H>,
    events: Receiver<DeviceEvent>,
    tracker: DeviceStateTracker,
    handler: R,
    /// Mode given to newly connected devices
    default_mode: UpdateMode,
    started: bool,
}

impl<H: Host, R: ControllerHandler> ControllerHub<H, R> {
    /// Create a hub over `host`. Fails fast when the host cannot poll devices.
    pub fn new(host: H, settings: TrackerSettings, handler: R) -> Result<Self, HubError> {
        let (sender, events) = unbounded();
        let watcher = DeviceWatcher::new(host, sender)?;

        Ok(Self {
            watcher,
            events,
            tracker: DeviceStateTracker::new(settings),
            handler,
            default_mode: UpdateMode::default(),
            started: false,
        })
    }

    /// Start listening for devices. Devices connected from now on begin in
    /// continuous or discrete mode according to `continuous`.
    pub fn start(&mut self, continuous: bool) {
        self.default_mode = UpdateMode { continuous };
        self.started = true;
        self.watcher.start_listening();
        info!("Controller hub started (continuous: {})", continuous);
    }

    /// Stop polling and forget every tracked device
    pub fn stop(&mut self) {
        self.watcher.stop();
        self.tracker.clear();
        self.drain_discard();
        self.started = false;
        info!("Controller hub stopped");
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_polling(&self) -> bool {
        self.watcher.is_polling()
    }

    pub fn host(&self) -> &H {
        self.watcher.host()
    }

    pub fn handler(&self) -> &R {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut R {
        &mut self.handler
    }

    pub fn tracked_device(&self, device_id: &str) -> Option<&TrackedDevice> {
        self.tracker.get(device_id)
    }

    pub fn device_count(&self) -> usize {
        self.tracker.len()
    }

    /// Returns how many devices changed mode
    pub fn set_update_mode(&mut self, continuous: bool, device_id: Option<&str>) -> usize {
        self.tracker.set_update_mode(continuous, device_id)
    }

    /// Returns how many devices were flipped
    pub fn toggle_update_mode(&mut self, device_id: Option<&str>) -> usize {
        self.tracker.toggle_update_mode(device_id)
    }

    /// Host notification: device attached.
    ///
    /// The device is tracked and reported even when scheduling the next
    /// frame fails; that error is returned afterwards.
    pub fn device_connected(&mut self, device: RawDeviceState) -> Result<(), HubError> {
        let scheduled = self.watcher.handle_connected(device);
        self.process_events()?;
        Ok(scheduled?)
    }

    /// Host notification: device detached
    pub fn device_disconnected(&mut self, device: RawDeviceState) -> Result<(), HubError> {
        self.watcher.handle_disconnected(device);
        self.process_events()
    }

    /// Host callback: a scheduled frame fired. Updates are dispatched
    /// before any rescheduling error is returned.
    pub fn frame(&mut self, handle: FrameHandle) -> Result<(), HubError> {
        let scheduled = self.watcher.handle_frame(handle);
        self.process_events()?;
        Ok(scheduled?)
    }

    /// Retry frame scheduling after a host error
    pub fn resume_polling(&mut self) -> Result<(), HubError> {
        Ok(self.watcher.ensure_polling()?)
    }

    fn process_events(&mut self) -> Result<(), HubError> {
        while let Ok(event) = self.events.try_recv() {
            match event {
                DeviceEvent::Connected(device) => {
                    let now = self.watcher.host().now();
                    self.tracker.add_device(&device, self.default_mode, now);
                    self.handler.on_connected(&device);
                }
                DeviceEvent::Disconnected(device) => {
                    // Entry goes first so the handler never sees a stale one
                    self.tracker.remove_device(&device.id);
                    self.handler.on_disconnected(&device);
                }
                DeviceEvent::Updated(device) => {
                    let now = self.watcher.host().now();
                    let outcome = self.tracker.update_device(&device, now, &mut self.handler)?;
                    debug!("Update for '{}': {:?}", device.id, outcome);
                }
            }
        }
        Ok(())
    }

    fn drain_discard(&mut self) {
        let dropped = self.events.try_iter().count();
        if dropped > 0 {
            debug!("Discarded {} queued device events", dropped);
        }
    }
}
