//! Device watcher
//!
//! Bridges the host's polling and scheduling primitives. Every fired
//! frame compares each enumerated device's revision stamp against the
//! one seen last time and forwards changed devices as
//! [`DeviceEvent::Updated`]. Polling only runs while at least one device
//! is registered: the watcher stops rescheduling when the registry
//! empties and schedules again when it fills.
//!
//! Ids that received a disconnect notification are remembered until the
//! next connect for the same id, so a host that keeps enumerating a
//! detached device for a few frames cannot re-register it.

use super::types::{DeviceEvent, RawDeviceState};
use crate::host::{FrameHandle, Host, HostError};
use crossbeam_channel::Sender;
use log::{debug, info, trace, warn};
use std::collections::{HashMap, HashSet};

pub struct DeviceWatcher<H: Host> {
    host: H,
    events: Sender<DeviceEvent>,
    listening: bool,
    /// device id -> last observed revision stamp
    registry: HashMap<String, u64>,
    /// ids disconnected since their last connect
    departed: HashSet<String>,
    pending_frame: Option<FrameHandle>,
}

impl<H: Host> DeviceWatcher<H> {
    /// Create a watcher that forwards device events into `events`.
    ///
    /// Fails with [`HostError::PollingUnavailable`] when the host cannot
    /// enumerate devices, since nothing else works without it.
    pub fn new(host: H, events: Sender<DeviceEvent>) -> Result<Self, HostError> {
        if !host.supports_polling() {
            return Err(HostError::PollingUnavailable);
        }

        Ok(Self {
            host,
            events,
            listening: false,
            registry: HashMap::new(),
            departed: HashSet::new(),
            pending_frame: None,
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Begin accepting connect/disconnect notifications. Calling it again is a no-op.
    pub fn start_listening(&mut self) {
        if self.listening {
            debug!("Watcher already listening");
            return;
        }
        self.listening = true;
        info!("Watcher listening for device notifications");
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Stop listening, cancel the pending frame and forget every registered device
    pub fn stop(&mut self) {
        self.cancel_polling();
        self.listening = false;
        self.registry.clear();
        self.departed.clear();
        info!("Watcher stopped");
    }

    /// Whether a frame is currently scheduled
    pub fn is_polling(&self) -> bool {
        self.pending_frame.is_some()
    }

    /// Number of registered devices
    pub fn device_count(&self) -> usize {
        self.registry.len()
    }

    /// Host notification: a device was attached
    pub fn handle_connected(&mut self, device: RawDeviceState) -> Result<(), HostError> {
        if !self.listening {
            debug!("Ignoring connect of '{}': watcher not listening", device.id);
            return Ok(());
        }

        self.departed.remove(&device.id);
        self.registry.insert(device.id.clone(), device.revision);
        info!("Device connected: {} ({} registered)", device.id, self.registry.len());
        self.emit(DeviceEvent::Connected(device));

        self.ensure_polling()
    }

    /// Host notification: a device was detached
    pub fn handle_disconnected(&mut self, device: RawDeviceState) {
        if !self.listening {
            debug!("Ignoring disconnect of '{}': watcher not listening", device.id);
            return;
        }

        self.registry.remove(&device.id);
        self.departed.insert(device.id.clone());
        info!("Device disconnected: {} ({} registered)", device.id, self.registry.len());
        self.emit(DeviceEvent::Disconnected(device));

        if self.registry.is_empty() {
            self.cancel_polling();
        }
    }

    /// Host callback for a fired frame.
    ///
    /// Frames that are not the one currently pending (already cancelled,
    /// or fired after a stop) are ignored.
    pub fn handle_frame(&mut self, handle: FrameHandle) -> Result<(), HostError> {
        if self.pending_frame != Some(handle) {
            trace!("Ignoring stale frame {:?}", handle);
            return Ok(());
        }
        self.pending_frame = None;

        for device in self.host.enumerate_devices().into_iter().flatten() {
            if self.revision_changed(&device) {
                self.emit(DeviceEvent::Updated(device));
            }
        }

        self.ensure_polling()
    }

    /// Records the device's revision and reports whether it moved.
    ///
    /// A device seen here before any connect notification is registered
    /// on the spot and reported as changed. This covers hosts that
    /// deliver the notification late; the tracker still drops the update
    /// until the connect arrives. A departed id is never registered this way.
    fn revision_changed(&mut self, device: &RawDeviceState) -> bool {
        match self.registry.get_mut(&device.id) {
            Some(revision) if *revision == device.revision => false,
            Some(revision) => {
                *revision = device.revision;
                true
            }
            None if self.departed.contains(&device.id) => {
                trace!("Skipping '{}': disconnected, still enumerated", device.id);
                false
            }
            None => {
                debug!("Registering '{}' on first sight (no connect notification yet)", device.id);
                self.registry.insert(device.id.clone(), device.revision);
                true
            }
        }
    }

    /// Schedule a frame if devices are registered and none is pending.
    ///
    /// Used after a failed scheduling attempt to resume polling.
    pub fn ensure_polling(&mut self) -> Result<(), HostError> {
        if self.pending_frame.is_none() && !self.registry.is_empty() {
            let handle = self.host.schedule_next_frame()?;
            trace!("Scheduled frame {:?}", handle);
            self.pending_frame = Some(handle);
        }
        Ok(())
    }

    fn cancel_polling(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.host.cancel_frame(handle);
            debug!("Polling suspended");
        }
    }

    fn emit(&self, event: DeviceEvent) {
        if let Err(e) = self.events.send(event) {
            warn!("Device event channel disconnected, dropped event for '{}'", e.0.device().id);
        }
    }
}
