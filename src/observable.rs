//! Observer lists and observable values
//!
//! Single-threaded broadcast primitives the item store is built on:
//! - `Listeners`: ordered callback list with add/remove/notify
//! - `Observable`: a current value plus its listeners
//!
//! No `RefCell` borrow is held while a callback runs, so callbacks may
//! subscribe, unsubscribe or set the value again. A change made during a
//! notification round is delivered in a follow-up round once the current
//! one finishes, so the last value every subscriber sees is the final one.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Identifies one registered callback within its list
pub type SubscriptionId = u64;

type Callback<T> = Rc<dyn Fn(&T)>;

struct ListenerList<T: ?Sized> {
    next_id: SubscriptionId,
    entries: Vec<(SubscriptionId, Callback<T>)>,
}

/// Ordered list of callbacks notified with a `&T`
pub struct Listeners<T: ?Sized + 'static> {
    inner: Rc<RefCell<ListenerList<T>>>,
}

impl<T: ?Sized + 'static> Listeners<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ListenerList {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a callback. It stays registered until the returned handle
    /// is used to unsubscribe.
    pub fn add(&self, callback: impl Fn(&T) + 'static) -> Subscription<T> {
        let mut list = self.inner.borrow_mut();
        let id = list.next_id;
        list.next_id += 1;
        let callback: Callback<T> = Rc::new(callback);
        list.entries.push((id, callback));

        Subscription {
            id,
            list: Rc::downgrade(&self.inner),
        }
    }

    /// Remove a callback by id. Returns false if it was not registered.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        remove_entry(&self.inner, id)
    }

    /// Invoke every callback registered at the time of the call
    pub fn notify(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .inner
            .borrow()
            .entries
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();

        for callback in snapshot {
            callback(value);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized + 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> Clone for Listeners<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized + 'static> fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("len", &self.len()).finish()
    }
}

fn remove_entry<T: ?Sized>(list: &RefCell<ListenerList<T>>, id: SubscriptionId) -> bool {
    let mut list = list.borrow_mut();
    let before = list.entries.len();
    list.entries.retain(|(entry_id, _)| *entry_id != id);
    list.entries.len() != before
}

/// Handle for a registered callback.
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
pub struct Subscription<T: ?Sized> {
    id: SubscriptionId,
    list: Weak<RefCell<ListenerList<T>>>,
}

impl<T: ?Sized> Subscription<T> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Stop receiving notifications. Returns false if the callback was
    /// already removed or the list no longer exists.
    pub fn unsubscribe(self) -> bool {
        match self.list.upgrade() {
            Some(list) => remove_entry(&list, self.id),
            None => false,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// A value that broadcasts its current and future states
pub struct Observable<T: 'static> {
    value: Rc<RefCell<Rc<T>>>,
    listeners: Listeners<T>,
    /// A notification round is running
    notifying: Rc<Cell<bool>>,
    /// The value changed during the running round
    pending: Rc<Cell<bool>>,
}

impl<T: Clone + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(Rc::new(value))),
            listeners: Listeners::new(),
            notifying: Rc::new(Cell::new(false)),
            pending: Rc::new(Cell::new(false)),
        }
    }

    /// Register `callback`, then invoke it once with the current value.
    /// It is invoked again on every later change until unsubscribed.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription<T> {
        let callback = Rc::new(callback);
        let registered = Rc::clone(&callback);
        let subscription = self.listeners.add(move |value: &T| registered(value));

        let current = self.get();
        callback(&current);
        subscription
    }

    /// Replace the value and notify every subscriber before returning
    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = Rc::new(value);
        self.changed();
    }

    /// Edit a copy of the value, store it, and notify every subscriber
    /// before returning
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut value = self.get();
        f(Rc::make_mut(&mut value));
        *self.value.borrow_mut() = value;
        self.changed();
    }

    /// Like `update`, but nothing is stored or notified if `f` fails
    pub fn try_update<E>(&self, f: impl FnOnce(&mut T) -> Result<(), E>) -> Result<(), E> {
        let mut value = self.get();
        f(Rc::make_mut(&mut value))?;
        *self.value.borrow_mut() = value;
        self.changed();
        Ok(())
    }

    /// Current value (shared, not copied)
    pub fn get(&self) -> Rc<T> {
        Rc::clone(&self.value.borrow())
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Notify subscribers, or queue another round if one is already running
    fn changed(&self) {
        if self.notifying.replace(true) {
            self.pending.set(true);
            return;
        }

        loop {
            self.pending.set(false);
            let current = self.get();
            self.listeners.notify(&current);
            if !self.pending.get() {
                break;
            }
        }
        self.notifying.set(false);
    }
}

impl<T: 'static> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            listeners: self.listeners.clone(),
            notifying: Rc::clone(&self.notifying),
            pending: Rc::clone(&self.pending),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value.borrow())
            .field("subscribers", &self.listeners.len())
            .finish()
    }
}
