//! Per-device state tracking
//!
//! Holds the last accepted snapshot and the update mode of every
//! connected device, and decides on each update which buttons and axes
//! are reported to the [`ControllerHandler`].
//!
//! Two policies exist per device:
//! - **continuous**: every updated frame dispatches held buttons and
//!   every axis past [`CONTINUOUS_AXIS_THRESHOLD`].
//! - **discrete**: updates closer than the debounce window to the last
//!   accepted one are dropped entirely; accepted ones use the coarser
//!   [`DISCRETE_AXIS_THRESHOLD`].
//!
//! Buttons are reported while held, not on edges, so a button held
//! across several sampled frames fires once per frame.

use super::constants::{CONTINUOUS_AXIS_THRESHOLD, DISCRETE_AXIS_THRESHOLD, DISCRETE_UPDATE_DELAY_MS};
use super::types::{RawDeviceState, UpdateMode};
use crate::hub::ControllerHandler;
use log::{debug, info, trace};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TrackerError {
    #[error("Discrete update requested for '{device_id}' while it is in continuous mode")]
    DiscreteWhileContinuous { device_id: String },
}

/// Thresholds and debounce window used by the tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerSettings {
    pub continuous_threshold: f32,
    pub discrete_threshold: f32,
    pub update_delay: Duration,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            continuous_threshold: CONTINUOUS_AXIS_THRESHOLD,
            discrete_threshold: DISCRETE_AXIS_THRESHOLD,
            update_delay: Duration::from_millis(DISCRETE_UPDATE_DELAY_MS),
        }
    }
}

/// Remembered state of one connected device
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedDevice {
    pub device_id: String,
    pub last_axes: Vec<f32>,
    pub last_buttons: Vec<bool>,
    pub last_update: Instant,
    pub mode: UpdateMode,
}

impl TrackedDevice {
    fn new(device: &RawDeviceState, mode: UpdateMode, now: Instant) -> Self {
        Self {
            device_id: device.id.clone(),
            last_axes: device.axes.clone(),
            last_buttons: device.pressed_flags(),
            last_update: now,
            mode,
        }
    }

    fn refresh(&mut self, device: &RawDeviceState, now: Instant) {
        self.last_axes.clone_from(&device.axes);
        self.last_buttons = device.pressed_flags();
        self.last_update = now;
    }
}

/// What happened to a single device update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Continuous,
    Discrete,
    /// Discrete update inside the debounce window; nothing dispatched, nothing refreshed
    Debounced,
    /// No entry for the device; the update was dropped
    Untracked,
}

#[derive(Debug, Default)]
pub struct DeviceStateTracker {
    settings: TrackerSettings,
    devices: HashMap<String, TrackedDevice>,
}

impl DeviceStateTracker {
    pub fn new(settings: TrackerSettings) -> Self {
        Self {
            settings,
            devices: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Start tracking a device. Any previous entry for the same id is replaced.
    pub fn add_device(&mut self, device: &RawDeviceState, mode: UpdateMode, now: Instant) {
        debug!("Tracking '{}' (continuous: {})", device.id, mode.continuous);
        self.devices
            .insert(device.id.clone(), TrackedDevice::new(device, mode, now));
    }

    pub fn remove_device(&mut self, device_id: &str) -> Option<TrackedDevice> {
        let removed = self.devices.remove(device_id);
        if removed.is_some() {
            debug!("Stopped tracking '{}'", device_id);
        }
        removed
    }

    pub fn get(&self, device_id: &str) -> Option<&TrackedDevice> {
        self.devices.get(device_id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }

    /// Run one update for `device`, dispatching to `handler` according to its mode
    pub fn update_device<R>(
        &mut self,
        device: &RawDeviceState,
        now: Instant,
        handler: &mut R,
    ) -> Result<UpdateOutcome, TrackerError>
    where
        R: ControllerHandler + ?Sized,
    {
        let continuous = match self.devices.get(&device.id) {
            Some(entry) => entry.mode.continuous,
            None => {
                trace!("Dropping update for untracked device '{}'", device.id);
                return Ok(UpdateOutcome::Untracked);
            }
        };

        if continuous {
            self.update_continuous(device, now, handler)
        } else {
            self.update_discrete(device, now, handler)
        }
    }

    fn update_continuous<R>(
        &mut self,
        device: &RawDeviceState,
        now: Instant,
        handler: &mut R,
    ) -> Result<UpdateOutcome, TrackerError>
    where
        R: ControllerHandler + ?Sized,
    {
        let threshold = self.settings.continuous_threshold;
        let Some(entry) = self.devices.get_mut(&device.id) else {
            return Ok(UpdateOutcome::Untracked);
        };

        dispatch_buttons(device, handler);
        for (index, value) in significant_axes(device, threshold) {
            handler.on_axis_continuous(value, index, &device.id);
        }
        entry.refresh(device, now);

        Ok(UpdateOutcome::Continuous)
    }

    fn update_discrete<R>(
        &mut self,
        device: &RawDeviceState,
        now: Instant,
        handler: &mut R,
    ) -> Result<UpdateOutcome, TrackerError>
    where
        R: ControllerHandler + ?Sized,
    {
        let settings = self.settings;
        let Some(entry) = self.devices.get_mut(&device.id) else {
            return Ok(UpdateOutcome::Untracked);
        };

        if entry.mode.continuous {
            return Err(TrackerError::DiscreteWhileContinuous {
                device_id: device.id.clone(),
            });
        }

        if now < entry.last_update + settings.update_delay {
            trace!("Debounced update for '{}'", device.id);
            return Ok(UpdateOutcome::Debounced);
        }

        dispatch_buttons(device, handler);
        for (index, value) in significant_axes(device, settings.discrete_threshold) {
            handler.on_axis_discrete(value, index, &device.id);
        }
        entry.refresh(device, now);

        Ok(UpdateOutcome::Discrete)
    }

    /// Set the update mode of one device, or of every tracked device when
    /// `device_id` is `None`. Entries already in the requested mode are
    /// left untouched. Returns how many entries changed.
    pub fn set_update_mode(&mut self, continuous: bool, device_id: Option<&str>) -> usize {
        let mut changed = 0;
        for entry in self.entries_mut(device_id) {
            if entry.mode.continuous != continuous {
                entry.mode.continuous = continuous;
                changed += 1;
                info!("'{}' update mode -> {}", entry.device_id, mode_name(continuous));
            }
        }
        changed
    }

    /// Flip the update mode of one device, or of every tracked device.
    /// Returns how many entries were flipped.
    pub fn toggle_update_mode(&mut self, device_id: Option<&str>) -> usize {
        let mut flipped = 0;
        for entry in self.entries_mut(device_id) {
            entry.mode.continuous = !entry.mode.continuous;
            flipped += 1;
            info!("'{}' update mode -> {}", entry.device_id, mode_name(entry.mode.continuous));
        }
        flipped
    }

    fn entries_mut<'a>(
        &'a mut self,
        device_id: Option<&str>,
    ) -> Box<dyn Iterator<Item = &'a mut TrackedDevice> + 'a> {
        match device_id {
            Some(id) => Box::new(self.devices.get_mut(id).into_iter()),
            None => Box::new(self.devices.values_mut()),
        }
    }
}

fn mode_name(continuous: bool) -> &'static str {
    if continuous { "continuous" } else { "discrete" }
}

fn dispatch_buttons<R>(device: &RawDeviceState, handler: &mut R)
where
    R: ControllerHandler + ?Sized,
{
    for (index, button) in device.buttons.iter().enumerate() {
        if button.pressed {
            handler.on_button(index, &device.id);
        }
    }
}

/// Axes whose magnitude reaches `threshold`, in slot order
fn significant_axes(device: &RawDeviceState, threshold: f32) -> impl Iterator<Item = (usize, f32)> + '_ {
    device
        .axes
        .iter()
        .copied()
        .enumerate()
        .filter(move |(_, value)| value.abs() >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ButtonState;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Continuous(f32, usize, String),
        Discrete(f32, usize, String),
        Button(usize, String),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl ControllerHandler for Recorder {
        fn on_axis_continuous(&mut self, value: f32, axis_index: usize, device_id: &str) {
            self.calls.push(Call::Continuous(value, axis_index, device_id.to_string()));
        }

        fn on_axis_discrete(&mut self, value: f32, axis_index: usize, device_id: &str) {
            self.calls.push(Call::Discrete(value, axis_index, device_id.to_string()));
        }

        fn on_button(&mut self, button_index: usize, device_id: &str) {
            self.calls.push(Call::Button(button_index, device_id.to_string()));
        }
    }

    fn pad(id: &str, axes: &[f32], pressed: &[bool]) -> RawDeviceState {
        RawDeviceState {
            id: id.to_string(),
            axes: axes.to_vec(),
            buttons: pressed
                .iter()
                .map(|p| if *p { ButtonState::pressed() } else { ButtonState::released() })
                .collect(),
            revision: 1,
        }
    }

    fn tracker_with(id: &str, mode: UpdateMode, at: Instant) -> DeviceStateTracker {
        let mut tracker = DeviceStateTracker::default();
        tracker.add_device(&pad(id, &[0.0, 0.0], &[false, false]), mode, at);
        tracker
    }

    #[test]
    fn test_default_settings() {
        let settings = TrackerSettings::default();
        assert_eq!(settings.continuous_threshold, 0.05);
        assert_eq!(settings.discrete_threshold, 0.2);
        assert_eq!(settings.update_delay, Duration::from_millis(350));
    }

    #[test]
    fn test_continuous_threshold() {
        let t0 = Instant::now();
        let mut tracker = tracker_with("dev1", UpdateMode::continuous(), t0);
        let mut rec = Recorder::default();

        let outcome = tracker
            .update_device(&pad("dev1", &[0.04, -0.05, 0.5, -0.049], &[]), t0, &mut rec)
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Continuous);
        assert_eq!(
            rec.calls,
            vec![
                Call::Continuous(-0.05, 1, "dev1".into()),
                Call::Continuous(0.5, 2, "dev1".into()),
            ]
        );
    }

    #[test]
    fn test_buttons_dispatch_before_axes() {
        let t0 = Instant::now();
        let mut tracker = tracker_with("dev1", UpdateMode::continuous(), t0);
        let mut rec = Recorder::default();

        tracker
            .update_device(&pad("dev1", &[0.9], &[false, true, true]), t0, &mut rec)
            .unwrap();

        assert_eq!(
            rec.calls,
            vec![
                Call::Button(1, "dev1".into()),
                Call::Button(2, "dev1".into()),
                Call::Continuous(0.9, 0, "dev1".into()),
            ]
        );
    }

    #[test]
    fn test_held_button_repeats_every_frame() {
        let t0 = Instant::now();
        let mut tracker = tracker_with("dev1", UpdateMode::continuous(), t0);
        let mut rec = Recorder::default();
        let held = pad("dev1", &[], &[false, false, false, false, true]);

        tracker.update_device(&held, t0, &mut rec).unwrap();
        tracker
            .update_device(&held, t0 + Duration::from_millis(16), &mut rec)
            .unwrap();

        assert_eq!(rec.calls, vec![Call::Button(4, "dev1".into()); 2]);
    }

    #[test]
    fn test_continuous_refreshes_snapshot() {
        let t0 = Instant::now();
        let mut tracker = tracker_with("dev1", UpdateMode::continuous(), t0);
        let t1 = t0 + Duration::from_millis(16);

        tracker
            .update_device(&pad("dev1", &[0.01, 0.3], &[true]), t1, &mut Recorder::default())
            .unwrap();

        let entry = tracker.get("dev1").unwrap();
        assert_eq!(entry.last_axes, vec![0.01, 0.3]);
        assert_eq!(entry.last_buttons, vec![true]);
        assert_eq!(entry.last_update, t1);
    }

    #[test]
    fn test_untracked_device_is_dropped() {
        let mut tracker = DeviceStateTracker::default();
        let mut rec = Recorder::default();

        let outcome = tracker
            .update_device(&pad("ghost", &[1.0], &[true]), Instant::now(), &mut rec)
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Untracked);
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn test_discrete_debounce_window() {
        let t0 = Instant::now();
        let mut tracker = tracker_with("dev1", UpdateMode::discrete(), t0);
        let mut rec = Recorder::default();
        let input = pad("dev1", &[0.8], &[true]);

        let early = t0 + Duration::from_millis(349);
        assert_eq!(
            tracker.update_device(&input, early, &mut rec).unwrap(),
            UpdateOutcome::Debounced
        );
        assert!(rec.calls.is_empty());
        let entry = tracker.get("dev1").unwrap();
        assert_eq!(entry.last_update, t0);
        assert_eq!(entry.last_axes, vec![0.0, 0.0]);

        let due = t0 + Duration::from_millis(350);
        assert_eq!(
            tracker.update_device(&input, due, &mut rec).unwrap(),
            UpdateOutcome::Discrete
        );
        assert_eq!(
            rec.calls,
            vec![Call::Button(0, "dev1".into()), Call::Discrete(0.8, 0, "dev1".into())]
        );
        assert_eq!(tracker.get("dev1").unwrap().last_update, due);

        // Window restarts from the accepted update
        rec.calls.clear();
        let again = due + Duration::from_millis(100);
        assert_eq!(
            tracker.update_device(&input, again, &mut rec).unwrap(),
            UpdateOutcome::Debounced
        );
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn test_discrete_threshold() {
        let t0 = Instant::now();
        let mut tracker = tracker_with("dev1", UpdateMode::discrete(), t0);
        let mut rec = Recorder::default();

        tracker
            .update_device(
                &pad("dev1", &[0.19, -0.2, 0.1, -0.7], &[]),
                t0 + Duration::from_secs(1),
                &mut rec,
            )
            .unwrap();

        assert_eq!(
            rec.calls,
            vec![
                Call::Discrete(-0.2, 1, "dev1".into()),
                Call::Discrete(-0.7, 3, "dev1".into()),
            ]
        );
    }

    #[test]
    fn test_discrete_path_rejects_continuous_entry() {
        let t0 = Instant::now();
        let mut tracker = tracker_with("dev1", UpdateMode::continuous(), t0);
        let mut rec = Recorder::default();

        let result = tracker.update_discrete(&pad("dev1", &[1.0], &[true]), t0, &mut rec);

        assert_eq!(
            result,
            Err(TrackerError::DiscreteWhileContinuous { device_id: "dev1".into() })
        );
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn test_set_update_mode_only_writes_on_change() {
        let t0 = Instant::now();
        let mut tracker = tracker_with("dev1", UpdateMode::discrete(), t0);

        assert_eq!(tracker.set_update_mode(true, Some("dev1")), 1);
        assert_eq!(tracker.set_update_mode(true, Some("dev1")), 0);
        let entry = tracker.get("dev1").unwrap();
        assert!(entry.mode.continuous);
        assert_eq!(entry.last_update, t0);
    }

    #[test]
    fn test_mode_changes_are_per_device() {
        let t0 = Instant::now();
        let mut tracker = tracker_with("a", UpdateMode::continuous(), t0);
        tracker.add_device(&pad("b", &[], &[]), UpdateMode::continuous(), t0);

        tracker.toggle_update_mode(Some("a"));
        assert!(!tracker.get("a").unwrap().mode.continuous);
        assert!(tracker.get("b").unwrap().mode.continuous);
        assert_eq!(tracker.get("b").unwrap().last_update, t0);

        tracker.set_update_mode(false, Some("b"));
        tracker.set_update_mode(true, Some("a"));
        assert!(tracker.get("a").unwrap().mode.continuous);
        assert!(!tracker.get("b").unwrap().mode.continuous);
    }

    #[test]
    fn test_mode_changes_for_all_devices() {
        let t0 = Instant::now();
        let mut tracker = tracker_with("a", UpdateMode::continuous(), t0);
        tracker.add_device(&pad("b", &[], &[]), UpdateMode::discrete(), t0);

        assert_eq!(tracker.toggle_update_mode(None), 2);
        assert!(!tracker.get("a").unwrap().mode.continuous);
        assert!(tracker.get("b").unwrap().mode.continuous);

        assert_eq!(tracker.set_update_mode(false, None), 1);
        assert!(!tracker.get("b").unwrap().mode.continuous);
    }

    #[test]
    fn test_unknown_device_mode_change_is_noop() {
        let mut tracker = DeviceStateTracker::default();
        assert_eq!(tracker.set_update_mode(true, Some("nope")), 0);
        assert_eq!(tracker.toggle_update_mode(Some("nope")), 0);
    }

    #[test]
    fn test_readd_starts_fresh() {
        let t0 = Instant::now();
        let mut tracker = tracker_with("dev1", UpdateMode::continuous(), t0);
        tracker
            .update_device(&pad("dev1", &[0.9, 0.9], &[true, true]), t0, &mut Recorder::default())
            .unwrap();
        tracker.toggle_update_mode(Some("dev1"));

        tracker.remove_device("dev1");
        let t1 = t0 + Duration::from_secs(5);
        tracker.add_device(&pad("dev1", &[0.0, 0.0], &[false, false]), UpdateMode::continuous(), t1);

        let entry = tracker.get("dev1").unwrap();
        assert_eq!(entry.last_axes, vec![0.0, 0.0]);
        assert_eq!(entry.last_buttons, vec![false, false]);
        assert_eq!(entry.last_update, t1);
        assert!(entry.mode.continuous);
    }
}
