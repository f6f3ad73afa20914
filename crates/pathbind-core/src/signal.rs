#![forbid(unsafe_code)]

//! Single-threaded change-notification primitives.
//!
//! # Design
//!
//! [`Signal<T>`] is a publish/subscribe channel. Subscribers are stored as
//! `Weak` callbacks; [`Signal::subscribe`] returns an RAII [`Subscription`]
//! guard holding the strong reference, so dropping the guard unsubscribes.
//! Dead entries are pruned lazily during [`Signal::emit`].
//!
//! [`ValueCell`] layers a current value on top of a signal: subscribing
//! delivers the current value synchronously, then change notifications.
//! It is the observable-root variant of a binding session.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. Callbacks run outside any internal borrow, so a callback may freely
//!    subscribe, unsubscribe, or drop guards (including its own).
//! 3. [`ValueCell::set`] with an equal value is a no-op.
//! 4. [`Signal::live_count`] counts only subscribers whose guard is alive.
//!
//! # Failure Modes
//!
//! - **Subscriber leak**: guards stored indefinitely accumulate callbacks.
//!   Dead weak references are cleaned lazily during `emit()`.
//! - **Re-entrant emit**: permitted; the callback list is snapshotted before
//!   delivery, so mutations during delivery affect only later emissions.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::value::Value;

/// A subscriber callback stored as a strong `Rc` inside the guard, handed
/// to the signal as `Weak`.
type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

/// A single-threaded publish/subscribe channel.
///
/// Cloning a `Signal` creates a new handle to the **same** subscriber list.
pub struct Signal<T> {
    subscribers: Rc<RefCell<Vec<CallbackWeak<T>>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Rc::clone(&self.subscribers),
        }
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("subscriber_count", &self.subscribers.borrow().len())
            .finish()
    }
}

impl<T: 'static> Signal<T> {
    /// Create a signal with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Subscribe to emissions. Returns a [`Subscription`] guard; dropping
    /// the guard unsubscribes the callback.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        let weak = Rc::downgrade(&strong);
        self.subscribers.borrow_mut().push(weak);
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Deliver `payload` to all live subscribers in registration order and
    /// prune dead entries.
    pub fn emit(&self, payload: &T) {
        // Snapshot live callbacks so delivery runs outside the borrow.
        let callbacks: Vec<CallbackRc<T>> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|w| w.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };

        for callback in &callbacks {
            callback(payload);
        }
    }

    /// Number of registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Number of subscribers whose guard is still alive.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping the `Subscription` drops the strong callback reference, so the
/// `Weak` in the signal's subscriber list loses its referent and the
/// callback will not fire again.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl Subscription {
    /// A guard bound to nothing. Used by accessors over sources that expose
    /// no change notifications.
    #[must_use]
    pub fn noop() -> Self {
        Self {
            _guard: Box::new(()),
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ValueCell — current value plus changes
// ---------------------------------------------------------------------------

/// A shared current value with change notification.
///
/// Subscribing pushes the current value synchronously before any change
/// notifications, so a late subscriber never misses the present state.
/// Cloning creates a new handle to the **same** cell.
#[derive(Clone)]
pub struct ValueCell {
    value: Rc<RefCell<Value>>,
    changed: Signal<Value>,
}

impl ValueCell {
    /// Create a cell holding `initial`.
    #[must_use]
    pub fn new(initial: impl Into<Value>) -> Self {
        Self {
            value: Rc::new(RefCell::new(initial.into())),
            changed: Signal::new(),
        }
    }

    /// The current value.
    #[must_use]
    pub fn get(&self) -> Value {
        self.value.borrow().clone()
    }

    /// Replace the current value. Equal values are a no-op; otherwise all
    /// subscribers are notified with the new value.
    pub fn set(&self, value: impl Into<Value>) {
        let value = value.into();
        {
            let mut current = self.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value.clone();
        }
        self.changed.emit(&value);
    }

    /// Subscribe to the cell. The callback receives the current value
    /// immediately, then every subsequent change.
    pub fn subscribe(&self, callback: impl Fn(&Value) + 'static) -> Subscription {
        let subscription = self.changed.subscribe(callback);
        let current = self.get();
        // The guard is alive, so the snapshot in emit() sees the callback.
        self.changed.emit_to_current(&current, &subscription);
        subscription
    }

    /// The change signal alone, without the current-value push. Callers
    /// that need the current value at a precise point use [`ValueCell::get`]
    /// and subscribe here.
    #[must_use]
    pub fn changes(&self) -> &Signal<Value> {
        &self.changed
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.changed.live_count()
    }
}

impl Signal<Value> {
    /// Deliver `payload` to the single subscriber held by `guard` only.
    fn emit_to_current(&self, payload: &Value, _guard: &Subscription) {
        // The freshly-registered callback is the last entry; deliver to it
        // without notifying earlier subscribers.
        let callback = {
            let subscribers = self.subscribers.borrow();
            subscribers.last().and_then(Weak::upgrade)
        };
        if let Some(callback) = callback {
            callback(payload);
        }
    }
}

impl std::fmt::Debug for ValueCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueCell")
            .field("value", &self.value.borrow())
            .field("live_subscribers", &self.changed.live_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
