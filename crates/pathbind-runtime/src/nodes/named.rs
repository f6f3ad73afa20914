#![forbid(unsafe_code)]

//! Named-element lookup node.
//!
//! Resolves a name against a [`NameScope`] registry and re-resolves
//! whenever the registry entry for that name changes. An unregistered or
//! dead entry resolves to `Null` (a resolved nothing), so downstream nodes
//! see the usual absent-source behavior.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use pathbind_core::scope::NameScope;
use pathbind_core::signal::Subscription;
use pathbind_core::value::Value;

use super::{NodeCore, PathNode, node_observer};

/// A node resolving a name through a scoping registry.
pub struct NamedNode {
    core: Rc<NodeCore>,
    scope: Weak<NameScope>,
    name: String,
    subscription: RefCell<Option<Subscription>>,
}

impl NamedNode {
    /// Create a node resolving `name` against `scope`. The scope is held
    /// weakly; a dropped scope resolves to nothing.
    pub fn new(scope: &Rc<NameScope>, name: impl Into<String>) -> Self {
        Self {
            core: Rc::new(NodeCore::new()),
            scope: Rc::downgrade(scope),
            name: name.into(),
            subscription: RefCell::new(None),
        }
    }
}

fn resolve(scope: &Weak<NameScope>, name: &str) -> Value {
    scope
        .upgrade()
        .and_then(|scope| scope.resolve(name))
        .map(Value::Object)
        .unwrap_or(Value::Null)
}

impl PathNode for NamedNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn detach(&self) {
        self.subscription.borrow_mut().take();
    }

    fn on_source_changed(&self, _old: &Value, new: &Value) {
        self.detach();

        // Any live source activates the lookup; the source's identity is
        // otherwise irrelevant to a registry resolution.
        if new.is_unset() || new.is_null() {
            self.clear_value();
            return;
        }

        let Some(scope) = self.scope.upgrade() else {
            self.clear_value();
            return;
        };

        let observer = node_observer(&self.core);
        let weak_scope = self.scope.clone();
        let name = self.name.clone();
        let subscription = scope.changed().subscribe(move |changed: &String| {
            if *changed == name {
                observer(&resolve(&weak_scope, &name));
            }
        });

        let initial = resolve(&self.scope, &self.name);
        *self.subscription.borrow_mut() = Some(subscription);
        self.set_value(initial);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
