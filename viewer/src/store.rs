//! A synchronous observable cell for single-threaded UI state.
//!
//! DESIGN
//! ======
//! [`Store`] is a value cell with subscriber callbacks, not a signal graph:
//! `set` replaces the value wholesale and walks the subscriber list in
//! registration order before returning. Notification works off a snapshot of
//! that list, re-checked entry by entry against the live list, so a
//! subscription dropped mid-pass goes quiet immediately and a subscriber
//! added mid-pass is not called by the pass that was already underway.
//! Handles are `Rc`-based, so a store never leaves its thread and there is
//! no locking; exactly one writer role is assumed.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// A subscribable value cell.
///
/// Cloning a `Store` yields another handle to the same cell; all clones see
/// the same value and the same subscriber list.
pub struct Store<T> {
    inner: Rc<StoreInner<T>>,
}

struct StoreInner<T> {
    value: RefCell<T>,
    observers: RefCell<Vec<Observer<T>>>,
    next_id: Cell<u64>,
}

struct Observer<T> {
    id: u64,
    callback: Rc<RefCell<dyn FnMut(&T)>>,
}

impl<T> Store<T> {
    /// Creates a store holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                value: RefCell::new(initial),
                observers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Replaces the held value wholesale and synchronously notifies every
    /// current subscriber, in registration order, before returning.
    ///
    /// The value is stored as-is; the store validates nothing. Observers
    /// must not call `set` on the same store from inside their callback.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.notify();
    }

    /// Registers `observer`, immediately invokes it with the current value,
    /// and keeps invoking it on every subsequent [`set`](Self::set) until
    /// the returned [`Subscription`] is dropped.
    pub fn subscribe(&self, observer: impl FnMut(&T) + 'static) -> Subscription<T> {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        let callback: Rc<RefCell<dyn FnMut(&T)>> = Rc::new(RefCell::new(observer));
        self.inner.observers.borrow_mut().push(Observer {
            id,
            callback: Rc::clone(&callback),
        });

        {
            let value = self.inner.value.borrow();
            (&mut *callback.borrow_mut())(&value);
        }

        Subscription {
            store: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// A clone of the current value.
    #[must_use]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Calls `read` with a borrow of the current value.
    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.inner.value.borrow())
    }

    fn notify(&self) {
        // Snapshot, then release the list borrow, so callbacks are free to
        // subscribe and unsubscribe on this same store.
        let snapshot = self
            .inner
            .observers
            .borrow()
            .iter()
            .map(|observer| (observer.id, Rc::clone(&observer.callback)))
            .collect::<Vec<_>>();

        for (id, callback) in snapshot {
            let still_subscribed = self
                .inner
                .observers
                .borrow()
                .iter()
                .any(|observer| observer.id == id);
            if !still_subscribed {
                continue;
            }
            let value = self.inner.value.borrow();
            (&mut *callback.borrow_mut())(&value);
        }
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("value", &self.inner.value.borrow())
            .field("observers", &self.inner.observers.borrow().len())
            .finish()
    }
}

/// De-registration handle returned by [`Store::subscribe`].
///
/// Dropping the handle removes the observer; hold it for as long as the
/// observer should keep receiving values. A handle that outlives its store
/// drops quietly.
#[must_use = "dropping the subscription immediately de-registers the observer"]
pub struct Subscription<T> {
    store: Weak<StoreInner<T>>,
    id: u64,
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner
                .observers
                .borrow_mut()
                .retain(|observer| observer.id != self.id);
        }
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
