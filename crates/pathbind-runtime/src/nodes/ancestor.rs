#![forbid(unsafe_code)]

//! Tree-ancestor lookup node.
//!
//! Walks the host hierarchy upward from its source element, matching by
//! optional type name and by level (the number of matching ancestors to
//! skip; 0 selects the nearest match). The walk subscribes to every parent
//! link it crosses, so any topology change between the source and the
//! match re-resolves the lookup.

use std::cell::RefCell;
use std::rc::Rc;

use pathbind_core::plugins::ValueObserver;
use pathbind_core::signal::Subscription;
use pathbind_core::value::{BindingError, ObjectRef, Value, WeakObject};

use super::{NodeCore, PathNode, node_observer};

/// A node resolving a tree ancestor of its source element.
pub struct AncestorNode {
    core: Rc<NodeCore>,
    type_name: Option<String>,
    level: usize,
    tracker: RefCell<Option<Rc<AncestorTracker>>>,
}

impl AncestorNode {
    /// Create a node matching ancestors of `type_name` (any type when
    /// `None`), skipping `level` matches.
    pub fn new(type_name: Option<String>, level: usize) -> Self {
        Self {
            core: Rc::new(NodeCore::new()),
            type_name,
            level,
            tracker: RefCell::new(None),
        }
    }
}

impl PathNode for AncestorNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn detach(&self) {
        self.tracker.borrow_mut().take();
    }

    fn on_source_changed(&self, _old: &Value, new: &Value) {
        self.detach();

        match new {
            Value::Object(object) if object.as_element().is_some() => {
                let tracker = AncestorTracker::new(
                    object,
                    self.type_name.clone(),
                    self.level,
                    node_observer(&self.core),
                );
                *self.tracker.borrow_mut() = Some(Rc::clone(&tracker));
                tracker.refresh();
            }
            Value::Null | Value::Unset => self.clear_value(),
            other => self.set_error(BindingError::resolution(format!(
                "cannot find an ancestor of a non-element {} value",
                other.type_label()
            ))),
        }
    }
}

/// Re-resolving walker over a hierarchy's parent links.
///
/// Holds one subscription per crossed link; `refresh` rebuilds the walk
/// from scratch and pushes the (possibly unchanged — the node's value slot
/// coalesces) result into its output observer.
struct AncestorTracker {
    root: WeakObject,
    type_name: Option<String>,
    level: usize,
    subscriptions: RefCell<Vec<Subscription>>,
    output: ValueObserver,
}

impl AncestorTracker {
    fn new(
        root: &ObjectRef,
        type_name: Option<String>,
        level: usize,
        output: ValueObserver,
    ) -> Rc<Self> {
        Rc::new(Self {
            root: Rc::downgrade(root),
            type_name,
            level,
            subscriptions: RefCell::new(Vec::new()),
            output,
        })
    }

    fn matches(&self, candidate: &ObjectRef) -> bool {
        match &self.type_name {
            Some(name) => candidate.type_name() == name,
            None => true,
        }
    }

    fn refresh(self: &Rc<Self>) {
        let mut subscriptions = Vec::new();
        let mut result = Value::Unset;
        let mut skipped = 0usize;
        let mut current = self.root.upgrade();

        while let Some(object) = current {
            let Some(element) = object.as_element() else {
                break;
            };

            let weak_self = Rc::downgrade(self);
            subscriptions.push(element.parent_changed().subscribe(move |_: &()| {
                if let Some(tracker) = weak_self.upgrade() {
                    tracker.refresh();
                }
            }));

            let parent = element.parent();
            if let Some(candidate) = &parent {
                if self.matches(candidate) {
                    if skipped == self.level {
                        result = Value::Object(Rc::clone(candidate));
                    } else {
                        skipped += 1;
                    }
                }
            }
            if !result.is_unset() {
                // Links above the match cannot affect the result.
                break;
            }
            current = parent;
        }

        *self.subscriptions.borrow_mut() = subscriptions;
        (self.output)(&result);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
