#![forbid(unsafe_code)]

//! Indexer accessor node.
//!
//! Like the property node, but resolved through the indexer-plugin list
//! and re-read when any indexer-shaped property on the source changes
//! rather than on a property-name match.

use std::cell::RefCell;
use std::rc::Rc;

use pathbind_core::object::AccessError;
use pathbind_core::plugins::{AccessorRegistry, PropertyAccessor};
use pathbind_core::signal::Subscription;
use pathbind_core::value::{BindingError, Value};

use super::{NodeCore, PathNode, node_observer};

/// A node reading an indexed element via the plugin registry.
pub struct IndexNode {
    core: Rc<NodeCore>,
    args: Vec<Value>,
    registry: Rc<AccessorRegistry>,
    accessor: RefCell<Option<Box<dyn PropertyAccessor>>>,
    subscription: RefCell<Option<Subscription>>,
}

impl IndexNode {
    /// Create a node addressing the element at `args`.
    pub fn new(args: Vec<Value>, registry: Rc<AccessorRegistry>) -> Self {
        Self {
            core: Rc::new(NodeCore::new()),
            args,
            registry,
            accessor: RefCell::new(None),
            subscription: RefCell::new(None),
        }
    }
}

impl PathNode for IndexNode {
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
                    .find_indexer_plugin(object)
                    .and_then(|plugin| plugin.start(&Rc::downgrade(object), &self.args));

                let Some(accessor) = started else {
                    self.set_error(BindingError::resolution(format!(
                        "'{}' is not indexable",
                        object.type_name()
                    )));
                    return;
                };

                let subscription = accessor.subscribe(node_observer(&self.core));
                let initial = accessor.value();
                *self.accessor.borrow_mut() = Some(accessor);
                *self.subscription.borrow_mut() = Some(subscription);
                self.set_value(initial);
            }
            Value::Null | Value::Unset => self.clear_value(),
            other => self.set_error(BindingError::resolution(format!(
                "cannot index into a {} value",
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
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pathbind_core::testkit::TestList;

    fn node(index: i64) -> IndexNode {
        IndexNode::new(
            vec![Value::Int(index)],
            Rc::new(AccessorRegistry::with_defaults()),
        )
    }

    #[test]
    fn resolves_element() {
        let list = TestList::new(vec![Value::Int(10), Value::Int(20), Value::Int(30)]);
        let node = node(2);
        node.set_source(Value::object(&list));
        assert_eq!(node.value(), Value::Int(30));
    }

    #[test]
    fn short_list_is_an_error_value_not_a_fault() {
        let list = TestList::new(vec![Value::Int(10), Value::Int(20)]);
        let node = node(2);
        node.set_source(Value::object(&list));
        assert!(node.value().is_error());
    }

    #[test]
    fn element_mutation_triggers_reread() {
        let list = TestList::new(vec![Value::Int(1)]);
        let node = node(0);
        node.set_source(Value::object(&list));
        assert_eq!(node.value(), Value::Int(1));

        list.set(0, Value::Int(2)).expect("in range");
        assert_eq!(node.value(), Value::Int(2));
    }

    #[test]
    fn non_indexable_source_is_an_error_value() {
        let obj = pathbind_core::testkit::TestObject::new("Person");
        let node = node(0);
        node.set_source(Value::object(&obj));
        assert!(node.value().is_error());
    }

    #[test]
    fn reset_releases_subscription() {
        let list = TestList::new(vec![Value::Int(1)]);
        let node = node(0);
        node.set_source(Value::object(&list));
        assert_eq!(list.live_subscriptions(), 1);

        node.reset();
        assert_eq!(list.live_subscriptions(), 0);
    }

    #[test]
    fn write_through_indexer() {
        let list = TestList::new(vec![Value::Int(1)]);
        let node = node(0);
        node.set_source(Value::object(&list));

        node.write_value(Value::Int(9)).expect("in range");
        assert_eq!(node.value(), Value::Int(9));
    }
}
