#![forbid(unsafe_code)]

//! Ambient data-context lookup node.
//!
//! Reads the conventionally-named ambient value of a hierarchical host
//! element. The node re-reads both when the context value itself changes
//! and when the element's parent link changes, because hosts typically
//! inherit the ambient value through the hierarchy.

use std::cell::RefCell;
use std::rc::Rc;

use pathbind_core::signal::Subscription;
use pathbind_core::value::{BindingError, Value};

use super::{NodeCore, PathNode, node_observer};

/// A node resolving the ambient data context of an element source.
pub struct ContextNode {
    core: Rc<NodeCore>,
    context_sub: RefCell<Option<Subscription>>,
    parent_sub: RefCell<Option<Subscription>>,
}

impl ContextNode {
    /// Create a data-context node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: Rc::new(NodeCore::new()),
            context_sub: RefCell::new(None),
            parent_sub: RefCell::new(None),
        }
    }
}

impl Default for ContextNode {
    fn default() -> Self {
        Self::new()
    }
}

impl PathNode for ContextNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn detach(&self) {
        self.context_sub.borrow_mut().take();
        self.parent_sub.borrow_mut().take();
    }

    fn on_source_changed(&self, _old: &Value, new: &Value) {
        self.detach();

        match new {
            Value::Object(object) => {
                let Some(element) = object.as_element() else {
                    self.set_error(BindingError::resolution(format!(
                        "cannot read an ambient context from '{}'",
                        object.type_name()
                    )));
                    return;
                };

                let observer = node_observer(&self.core);

                let context_observer = observer.clone();
                let context_sub = element
                    .data_context_changed()
                    .subscribe(move |context: &Value| context_observer(context));

                // A reparented element may inherit a different context even
                // when its own slot did not notify; re-read on parent change.
                let weak = Rc::downgrade(object);
                let parent_observer = observer.clone();
                let parent_sub = element.parent_changed().subscribe(move |_: &()| {
                    if let Some(object) = weak.upgrade() {
                        if let Some(element) = object.as_element() {
                            parent_observer(&element.data_context());
                        }
                    }
                });

                let initial = element.data_context();
                *self.context_sub.borrow_mut() = Some(context_sub);
                *self.parent_sub.borrow_mut() = Some(parent_sub);
                self.set_value(initial);
            }
            Value::Null | Value::Unset => self.clear_value(),
            other => self.set_error(BindingError::resolution(format!(
                "cannot read an ambient context from a {} value",
                other.type_label()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
