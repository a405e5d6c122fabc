//! Mock host for testing.
//!
//! Keeps device slots and the frame queue in memory so the watcher,
//! hub and router can be driven deterministically without a real
//! platform. Clones share the same state: keep one clone to script
//! devices and fire frames while the router owns the other.

use super::{FrameHandle, Host, HostError};
use crate::device::{ButtonState, RawDeviceState};
use log::{debug, trace};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct MockState {
    slots: Vec<Option<RawDeviceState>>,
    pending: Vec<FrameHandle>,
    next_handle: u64,
    scheduled_total: usize,
    cancelled_total: usize,
    epoch: Instant,
    elapsed: Duration,
    polling: bool,
    fail_scheduling: bool,
}

/// In-memory host with a manually advanced clock
#[derive(Debug, Clone)]
pub struct MockHost {
    state: Rc<RefCell<MockState>>,
}

impl MockHost {
    /// Create a new mock host with no devices attached.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                slots: Vec::new(),
                pending: Vec::new(),
                next_handle: 1,
                scheduled_total: 0,
                cancelled_total: 0,
                epoch: Instant::now(),
                elapsed: Duration::ZERO,
                polling: true,
                fail_scheduling: false,
            })),
        }
    }

    /// A host that lacks the raw polling primitive.
    pub fn without_polling() -> Self {
        let host = Self::new();
        host.state.borrow_mut().polling = false;
        host
    }

    /// Make every following `schedule_next_frame` call fail (or succeed again)
    pub fn fail_scheduling(&self, fail: bool) {
        self.state.borrow_mut().fail_scheduling = fail;
    }

    /// Put a device into the first free slot (or replace the one with the same id)
    pub fn plug(&self, device: RawDeviceState) {
        let mut state = self.state.borrow_mut();
        if let Some(slot) = state
            .slots
            .iter_mut()
            .find(|s| s.as_ref().is_some_and(|d| d.id == device.id))
        {
            *slot = Some(device);
            return;
        }
        match state.slots.iter_mut().find(|s| s.is_none()) {
            Some(slot) => *slot = Some(device),
            None => state.slots.push(Some(device)),
        }
    }

    /// Empty the slot holding `id`, leaving a gap in the enumeration
    pub fn unplug(&self, id: &str) -> Option<RawDeviceState> {
        let mut state = self.state.borrow_mut();
        state
            .slots
            .iter_mut()
            .find(|s| s.as_ref().is_some_and(|d| d.id == id))
            .and_then(Option::take)
    }

    /// Current snapshot of a plugged device
    pub fn device(&self, id: &str) -> Option<RawDeviceState> {
        self.state
            .borrow()
            .slots
            .iter()
            .flatten()
            .find(|d| d.id == id)
            .cloned()
    }

    /// Set an axis value and bump the revision stamp
    pub fn set_axis(&self, id: &str, index: usize, value: f32) {
        self.modify(id, |d| {
            if d.axes.len() <= index {
                d.axes.resize(index + 1, 0.0);
            }
            d.axes[index] = value;
        });
    }

    /// Set a button's pressed flag and bump the revision stamp
    pub fn set_button(&self, id: &str, index: usize, pressed: bool) {
        self.modify(id, |d| {
            if d.buttons.len() <= index {
                d.buttons.resize(index + 1, ButtonState::released());
            }
            d.buttons[index] = if pressed { ButtonState::pressed() } else { ButtonState::released() };
        });
    }

    /// Bump the revision stamp without changing any value
    pub fn touch(&self, id: &str) {
        self.modify(id, |_| {});
    }

    fn modify(&self, id: &str, f: impl FnOnce(&mut RawDeviceState)) {
        let mut state = self.state.borrow_mut();
        if let Some(device) = state.slots.iter_mut().flatten().find(|d| d.id == id) {
            f(device);
            device.revision += 1;
            trace!("[MOCK HOST] {} revision -> {}", id, device.revision);
        }
    }

    /// Advance the mock clock
    pub fn advance(&self, by: Duration) {
        self.state.borrow_mut().elapsed += by;
    }

    /// Remove and return the oldest scheduled frame, as the host would when firing it
    pub fn take_frame(&self) -> Option<FrameHandle> {
        let mut state = self.state.borrow_mut();
        if state.pending.is_empty() {
            None
        } else {
            Some(state.pending.remove(0))
        }
    }

    pub fn pending_frames(&self) -> usize {
        self.state.borrow().pending.len()
    }

    pub fn scheduled_total(&self) -> usize {
        self.state.borrow().scheduled_total
    }

    pub fn cancelled_total(&self) -> usize {
        self.state.borrow().cancelled_total
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for MockHost {
    fn enumerate_devices(&self) -> Vec<Option<RawDeviceState>> {
        self.state.borrow().slots.clone()
    }

    fn schedule_next_frame(&self) -> Result<FrameHandle, HostError> {
        let mut state = self.state.borrow_mut();
        if state.fail_scheduling {
            debug!("[MOCK HOST] Refusing to schedule a frame");
            return Err(HostError::Scheduling("mock host refused the frame".into()));
        }
        let handle = FrameHandle(state.next_handle);
        state.next_handle += 1;
        state.scheduled_total += 1;
        state.pending.push(handle);
        trace!("[MOCK HOST] Scheduled frame {:?}", handle);
        Ok(handle)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        let mut state = self.state.borrow_mut();
        let before = state.pending.len();
        state.pending.retain(|h| *h != handle);
        if state.pending.len() != before {
            state.cancelled_total += 1;
            debug!("[MOCK HOST] Cancelled frame {:?}", handle);
        }
    }

    fn now(&self) -> Instant {
        let state = self.state.borrow();
        state.epoch + state.elapsed
    }

    fn supports_polling(&self) -> bool {
        self.state.borrow().polling
    }
}
