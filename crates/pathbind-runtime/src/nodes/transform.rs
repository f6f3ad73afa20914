#![forbid(unsafe_code)]

//! Arbitrary pure-transform node.

use std::rc::Rc;

use pathbind_core::value::Value;

use super::{NodeCore, PathNode};

/// A node applying a caller-supplied pure function to its source value.
///
/// Absent sources stay absent; everything else — including `Null` — is
/// handed to the transform.
pub struct TransformNode {
    core: NodeCore,
    transform: Rc<dyn Fn(&Value) -> Value>,
}

impl TransformNode {
    /// Create a node applying `transform`.
    pub fn new(transform: Rc<dyn Fn(&Value) -> Value>) -> Self {
        Self {
            core: NodeCore::new(),
            transform,
        }
    }
}

impl PathNode for TransformNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn on_source_changed(&self, _old: &Value, new: &Value) {
        if new.is_unset() {
            self.clear_value();
        } else {
            self.set_value((self.transform)(new));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
