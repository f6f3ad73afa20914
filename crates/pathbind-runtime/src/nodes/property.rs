#![forbid(unsafe_code)]

//! Named-property accessor node.
//!
//! Resolves its property through the accessor-plugin registry per source:
//! on every source change the previous accessor is dropped, a fresh one is
//! started against the new source, and change notifications are routed
//! back into the owning chain.

use std::cell::RefCell;
use std::rc::Rc;

use pathbind_core::object::AccessError;
use pathbind_core::plugins::{AccessorRegistry, PropertyAccessor};
use pathbind_core::signal::Subscription;
use pathbind_core::value::{BindingError, Value};

use super::{NodeCore, PathNode, ValidationTarget, node_observer};

/// A node reading a named property via the plugin registry.
pub struct PropertyNode {
    core: Rc<NodeCore>,
    property: String,
    registry: Rc<AccessorRegistry>,
    accessor: RefCell<Option<Box<dyn PropertyAccessor>>>,
    subscription: RefCell<Option<Subscription>>,
}

impl PropertyNode {
    /// Create a node for `property`, resolving accessors from `registry`.
    pub fn new(property: impl Into<String>, registry: Rc<AccessorRegistry>) -> Self {
        Self {
            core: Rc::new(NodeCore::new()),
            property: property.into(),
            registry,
            accessor: RefCell::new(None),
            subscription: RefCell::new(None),
        }
    }

    /// The property this node reads.
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }
}

impl PathNode for PropertyNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn detach(&self) {
        self.subscription.borrow_mut().take();
        self.accessor.borrow_mut().take();
    }

    fn on_source_changed(&self, _old: &Value, new: &Value) {
        self.detach();

        match new {
            Value::Object(object) => {
                let started = self
                    .registry
                    .find_property_plugin(object, &self.property)
                    .and_then(|plugin| plugin.start(&Rc::downgrade(object), &self.property));

                let Some(accessor) = started else {
                    self.set_error(BindingError::resolution(format!(
                        "could not resolve property '{}' on '{}'",
                        self.property,
                        object.type_name()
                    )));
                    return;
                };

                // Wire notifications and store state before the first value
                // cascades, so a reentrant stop mid-cascade tears down fully.
                let subscription = accessor.subscribe(node_observer(&self.core));
                let initial = accessor.value();
                *self.accessor.borrow_mut() = Some(accessor);
                *self.subscription.borrow_mut() = Some(subscription);
                self.set_value(initial);
            }
            Value::Null | Value::Unset => self.clear_value(),
            other => self.set_error(BindingError::resolution(format!(
                "cannot read property '{}' from a {} value",
                self.property,
                other.type_label()
            ))),
        }
    }

    fn write_value(&self, value: Value) -> Result<(), AccessError> {
        match &*self.accessor.borrow() {
            Some(accessor) => accessor.write(value),
            None => Err(AccessError::NoSource),
        }
    }

    fn validation_target(&self) -> Option<ValidationTarget> {
        let accessor = self.accessor.borrow();
        let accessor = accessor.as_ref()?;
        if !accessor.can_write() {
            return None;
        }
        match self.source() {
            Value::Object(object) => Some(ValidationTarget {
                source: Rc::downgrade(&object),
                property: self.property.clone(),
            }),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pathbind_core::testkit::TestObject;

    fn node(property: &str) -> PropertyNode {
        PropertyNode::new(property, Rc::new(AccessorRegistry::with_defaults()))
    }

    #[test]
    fn resolves_property_from_object_source() {
        let obj = TestObject::new("Person");
        obj.insert("Name", "Frank");

        let node = node("Name");
        node.set_source(Value::object(&obj));
        assert_eq!(node.value(), Value::from("Frank"));
    }

    #[test]
    fn missing_property_is_an_error_value() {
        let obj = TestObject::new("Person");
        let node = node("Name");
        node.set_source(Value::object(&obj));
        assert!(node.value().is_error());
    }

    #[test]
    fn scalar_source_is_an_error_value() {
        let node = node("Name");
        node.set_source(Value::Int(3));
        assert!(node.value().is_error());
    }

    #[test]
    fn null_source_clears() {
        let obj = TestObject::new("Person");
        obj.insert("Name", "Frank");

        let node = node("Name");
        node.set_source(Value::object(&obj));
        node.set_source(Value::Null);
        assert_eq!(node.value(), Value::Unset);
    }

    #[test]
    fn source_swap_rebinds_subscription() {
        let a = TestObject::new("Person");
        a.insert("Name", "Frank");
        let b = TestObject::new("Person");
        b.insert("Name", "Kups");

        let node = node("Name");
        node.set_source(Value::object(&a));
        assert_eq!(a.live_property_subscriptions(), 1);

        node.set_source(Value::object(&b));
        assert_eq!(node.value(), Value::from("Kups"));
        assert_eq!(a.live_property_subscriptions(), 0);
        assert_eq!(b.live_property_subscriptions(), 1);
    }

    #[test]
    fn reset_releases_subscription() {
        let obj = TestObject::new("Person");
        obj.insert("Name", "Frank");

        let node = node("Name");
        node.set_source(Value::object(&obj));
        assert_eq!(obj.live_property_subscriptions(), 1);

        node.reset();
        assert_eq!(obj.live_property_subscriptions(), 0);
        assert_eq!(node.value(), Value::Unset);
    }

    #[test]
    fn write_through_current_accessor() {
        let obj = TestObject::new("Person");
        obj.insert("Name", "Frank");

        let node = node("Name");
        node.set_source(Value::object(&obj));
        node.write_value(Value::from("Kups")).expect("writable");
        assert_eq!(obj.get("Name"), Some(Value::from("Kups")));
    }

    #[test]
    fn write_without_source_fails() {
        let node = node("Name");
        assert!(matches!(
            node.write_value(Value::from("x")),
            Err(AccessError::NoSource)
        ));
    }

    #[test]
    fn validation_target_for_writable_accessor() {
        let obj = TestObject::new("Person");
        obj.insert("Name", "Frank");

        let node = node("Name");
        node.set_source(Value::object(&obj));
        let target = node.validation_target().expect("writable target");
        assert_eq!(target.property, "Name");
        assert!(target.source.upgrade().is_some());
    }
}
