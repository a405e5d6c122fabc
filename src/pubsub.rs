//! Named-event publish/subscribe registry
//!
//! Subscribers are kept per event name in registration order. The same
//! callback may be registered more than once and then runs once per
//! registration. Removal matches callbacks by identity (`Rc` pointer).
//!
//! A subscriber that returns an error or panics is logged and skipped;
//! the remaining subscribers of the same trigger still run.

use log::{trace, warn};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

/// Subscriber callback. Context is whatever the closure captures.
pub type Callback<A> = Rc<dyn Fn(&A) -> anyhow::Result<()>>;

/// Wrap a closure as a [`Callback`]. Keep a clone to unsubscribe it later.
pub fn callback<A, F>(f: F) -> Callback<A>
where
    F: Fn(&A) -> anyhow::Result<()> + 'static,
{
    Rc::new(f)
}

pub struct PubSub<A> {
    subscribers: HashMap<String, Vec<Callback<A>>>,
}

impl<A> PubSub<A> {
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
        }
    }

    /// Append `callback` to the subscribers of `name`
    pub fn on(&mut self, name: &str, callback: Callback<A>) -> &mut Self {
        self.subscribers
            .entry(name.to_string())
            .or_default()
            .push(callback);
        self
    }

    /// Remove every registration of `callback` for `name`, or every
    /// subscriber of `name` when `callback` is `None`
    pub fn off(&mut self, name: &str, callback: Option<&Callback<A>>) -> &mut Self {
        match callback {
            Some(target) => {
                if let Some(list) = self.subscribers.get_mut(name) {
                    list.retain(|cb| !same_callback(cb, target));
                    if list.is_empty() {
                        self.subscribers.remove(name);
                    }
                }
            }
            None => {
                self.subscribers.remove(name);
            }
        }
        self
    }

    /// Drop every subscription for every event
    pub fn off_all(&mut self) -> &mut Self {
        self.subscribers.clear();
        self
    }

    /// Invoke the subscribers of `name` in registration order.
    /// Returns how many ran successfully.
    pub fn trigger(&self, name: &str, args: &A) -> usize {
        let Some(list) = self.subscribers.get(name) else {
            trace!("No subscribers for '{}'", name);
            return 0;
        };

        let mut delivered = 0;
        for callback in list {
            match catch_unwind(AssertUnwindSafe(|| callback(args))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => warn!("Subscriber for '{}' failed: {:#}", name, e),
                Err(_) => warn!("Subscriber for '{}' panicked", name),
            }
        }
        delivered
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.subscribers.get(name).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<A> Default for PubSub<A> {
    fn default() -> Self {
        Self::new()
    }
}

fn same_callback<A>(a: &Callback<A>, b: &Callback<A>) -> bool {
    // Compare data pointers only; vtable pointers may differ across codegen units
    std::ptr::eq(Rc::as_ptr(a) as *const u8, Rc::as_ptr(b) as *const u8)
}
