#![forbid(unsafe_code)]

//! Path nodes: one resolved segment of a binding path.
//!
//! # Design
//!
//! Every node variant shares one contract, carried by [`NodeCore`] and the
//! provided methods of [`PathNode`]: a weakly-held source, a weakly-held
//! cached value, an index in the owning chain, and a back-reference to the
//! owning session. Variants differ only in how they react to a source
//! change ([`PathNode::on_source_changed`]) and whether they support
//! write-through ([`PathNode::write_value`]).
//!
//! # Invariants
//!
//! 1. A node belongs to exactly one chain for its lifetime; assigning
//!    ownership twice is a programming error and panics.
//! 2. `value()` is `Unset` until the first resolution and again after
//!    `reset()`; a reclaimed cached object also reads as `Unset`.
//! 3. The owner is notified of a new value only when it differs by
//!    consumer-visible equality, on first resolution, or when the previous
//!    value's weak holder is dead (conservative re-notify, so an update is
//!    never missed after the old value was reclaimed).
//! 4. Resolution failures never cross the node boundary as panics; they
//!    become error-tagged values. An error-valued source is adopted
//!    verbatim so a fault upstream surfaces exactly once downstream.

pub mod ancestor;
pub mod context;
pub mod indexer;
pub mod named;
pub mod negate;
pub mod property;
pub mod transform;

pub use ancestor::AncestorNode;
pub use context::ContextNode;
pub use indexer::IndexNode;
pub use named::NamedNode;
pub use negate::NegateNode;
pub use property::PropertyNode;
pub use transform::TransformNode;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use pathbind_core::object::AccessError;
use pathbind_core::plugins::ValueObserver;
use pathbind_core::value::{BindingError, Value, WeakObject, WeakValue};
use tracing::trace;

use crate::session::SessionCore;

/// The member a session's validation observer should watch, exposed by
/// terminal nodes that hold a writable property accessor.
pub struct ValidationTarget {
    /// Weakly-held source object.
    pub source: WeakObject,
    /// The observed member name.
    pub property: String,
}

/// Shared per-node state.
///
/// Both the source and the cached value are weak holders: a node never
/// keeps a host object alive.
pub struct NodeCore {
    index: Cell<usize>,
    owner: RefCell<Option<Weak<SessionCore>>>,
    source: RefCell<WeakValue>,
    value: RefCell<Option<WeakValue>>,
}

impl NodeCore {
    /// An unowned core with no source and no value.
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: Cell::new(0),
            owner: RefCell::new(None),
            source: RefCell::new(WeakValue::Unset),
            value: RefCell::new(None),
        }
    }
}

impl NodeCore {
    /// Cache `value` and notify the owner when it is a change: first
    /// resolution, reclaimed previous value, or consumer-visible
    /// inequality.
    pub(crate) fn store_value(&self, value: Value) {
        let changed = match &*self.value.borrow() {
            None => true,
            Some(previous) => match previous.upgrade() {
                // The old value was reclaimed; we cannot prove the new one
                // equal, so re-notify.
                None => true,
                Some(old) => old != value,
            },
        };
        if !changed {
            return;
        }

        *self.value.borrow_mut() = Some(WeakValue::hold(&value));
        if let Some(owner) = self.owner.borrow().clone().and_then(|w| w.upgrade()) {
            trace!(index = self.index.get(), value = ?value, "node value changed");
            owner.on_node_value_changed(self.index.get(), value);
        }
    }
}

impl Default for NodeCore {
    fn default() -> Self {
        Self::new()
    }
}

/// Assign `node` to its owning session. Panics if the node already belongs
/// to a chain — a usage fault, raised immediately.
pub(crate) fn bind_owner(node: &dyn PathNode, owner: &Rc<SessionCore>, index: usize) {
    let core = node.core();
    assert!(
        core.owner.borrow().is_none(),
        "path node already belongs to a chain"
    );
    *core.owner.borrow_mut() = Some(Rc::downgrade(owner));
    core.index.set(index);
}

/// An observer that feeds notification payloads back into a node's value
/// slot. Captured by accessors and trackers so asynchronous notifications
/// re-enter the propagation path; the weak capture keeps a long-lived
/// source from pinning the node.
pub(crate) fn node_observer(core: &Rc<NodeCore>) -> ValueObserver {
    let weak = Rc::downgrade(core);
    Rc::new(move |value: &Value| {
        if let Some(core) = weak.upgrade() {
            core.store_value(value.clone());
        }
    })
}

/// One resolved segment of a binding path.
///
/// Implementations provide [`PathNode::core`] and the variant hooks;
/// everything else is provided.
pub trait PathNode {
    /// The node's shared state.
    fn core(&self) -> &NodeCore;

    /// Variant hook: unsubscribe from the old source, subscribe to the new
    /// one, and recompute the value. `old` is the previously cached source
    /// (`Null` when absent or reclaimed); `new` is never error-tagged.
    fn on_source_changed(&self, old: &Value, new: &Value);

    /// Variant hook: drop any observation hooks on the current source.
    fn detach(&self) {}

    /// Attempt to write through to the current source. Read-only variants
    /// report [`AccessError::NotSupported`].
    fn write_value(&self, _value: Value) -> Result<(), AccessError> {
        Err(AccessError::NotSupported)
    }

    /// The member a validation observer should watch, for terminal nodes
    /// holding a writable accessor.
    fn validation_target(&self) -> Option<ValidationTarget> {
        None
    }

    /// The node's position in the owning chain.
    fn index(&self) -> usize {
        self.core().index.get()
    }

    /// The currently cached source. Absent and reclaimed sources read as
    /// `Null`.
    fn source(&self) -> Value {
        match self.core().source.borrow().upgrade() {
            None | Some(Value::Unset) => Value::Null,
            Some(value) => value,
        }
    }

    /// The cached value: `Unset` until first resolution, after reset, or
    /// when the cached object has been reclaimed.
    fn value(&self) -> Value {
        match &*self.core().value.borrow() {
            None => Value::Unset,
            Some(held) => held.upgrade().unwrap_or(Value::Unset),
        }
    }

    /// Feed a new source into the node. `Unset` means absent. Equal
    /// sources are a no-op; otherwise the variant hook runs and the value
    /// is recomputed synchronously. Error-valued sources are adopted as the
    /// node's value without re-interpretation.
    fn set_source(&self, source: Value) {
        let core = self.core();
        let unchanged = core
            .source
            .borrow()
            .upgrade()
            .is_some_and(|old| old == source);
        if unchanged {
            return;
        }

        let old = self.source();
        *core.source.borrow_mut() = WeakValue::hold(&source);

        if source.is_error() {
            self.detach();
            self.set_value(source);
        } else {
            self.on_source_changed(&old, &source);
        }
    }

    /// Cache `value` and notify the owner when it is a change: first
    /// resolution, reclaimed previous value, or consumer-visible
    /// inequality.
    fn set_value(&self, value: Value) {
        self.core().store_value(value);
    }

    /// Cache the `Unset` sentinel (no value resolvable from the current
    /// source).
    fn clear_value(&self) {
        self.set_value(Value::Unset);
    }

    /// Record a recoverable fault as an error-tagged value.
    fn set_error(&self, error: BindingError) {
        self.set_value(Value::Error(error));
    }

    /// Return the node to its unresolved state, releasing all observation
    /// hooks. Called when the owning session stops.
    fn reset(&self) {
        self.detach();
        let core = self.core();
        *core.source.borrow_mut() = WeakValue::Unset;
        *core.value.borrow_mut() = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
