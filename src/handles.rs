//! Numeric handles for subscriptions held on behalf of JS callers
//!
//! A handle is reserved before the subscription exists, because the first
//! callback runs inside `subscribe` and may already release its own handle.

#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

/// What [`HandleTable::release`] found under a handle
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Released<S> {
    /// Reserved but not yet settled; the subscription is dropped on settle
    Opening,
    /// Settled subscription, handed back for the caller to cancel
    Active(S),
    /// Never issued, or already released
    Unknown,
}

#[derive(Debug)]
pub(crate) struct HandleTable<S> {
    next: Cell<u32>,
    opening: RefCell<HashSet<u32>>,
    active: RefCell<HashMap<u32, S>>,
}

impl<S> HandleTable<S> {
    pub(crate) fn new() -> Self {
        Self {
            next: Cell::new(1),
            opening: RefCell::new(HashSet::new()),
            active: RefCell::new(HashMap::new()),
        }
    }

    /// Issue a handle before the subscription is created
    pub(crate) fn reserve(&self) -> u32 {
        let handle = self.next.get();
        self.next.set(handle.wrapping_add(1));
        self.opening.borrow_mut().insert(handle);
        handle
    }

    /// Attach the subscription to its handle. Returns it back if the handle
    /// was released in the meantime, so the caller can cancel it.
    pub(crate) fn settle(&self, handle: u32, subscription: S) -> Option<S> {
        if self.opening.borrow_mut().remove(&handle) {
            self.active.borrow_mut().insert(handle, subscription);
            None
        } else {
            Some(subscription)
        }
    }

    pub(crate) fn release(&self, handle: u32) -> Released<S> {
        if self.opening.borrow_mut().remove(&handle) {
            return Released::Opening;
        }
        match self.active.borrow_mut().remove(&handle) {
            Some(subscription) => Released::Active(subscription),
            None => Released::Unknown,
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.active.borrow().len()
    }
}
