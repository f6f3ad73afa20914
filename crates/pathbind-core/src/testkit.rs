#![forbid(unsafe_code)]

//! Instrumented fake host objects for exercising bindings in tests.
//!
//! Each fake implements the capability traits a real host object would and
//! counts live subscriptions, so tests can assert that a stopped binding
//! leaves no observation hooks behind.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use crate::object::{
    AccessError, Capabilities, DynObject, Element, ErrorNotifying, Indexed, Keyed, Notifying,
    PropertyChange, Reflective,
};
use crate::signal::Signal;
use crate::value::{ObjectRef, Value, WeakObject};

/// Erase a concrete fake into an [`ObjectRef`].
pub fn object<T: DynObject>(rc: &Rc<T>) -> ObjectRef {
    let handle: ObjectRef = rc.clone();
    handle
}

// ---------------------------------------------------------------------------
// TestObject — named properties with change notification
// ---------------------------------------------------------------------------

/// A notifying object with named properties.
pub struct TestObject {
    type_name: String,
    props: RefCell<HashMap<String, Value>>,
    read_only: RefCell<HashSet<String>>,
    changed: Signal<PropertyChange>,
}

impl TestObject {
    /// Create an empty object with the given type label.
    pub fn new(type_name: &str) -> Rc<Self> {
        Rc::new(Self {
            type_name: type_name.to_string(),
            props: RefCell::new(HashMap::new()),
            read_only: RefCell::new(HashSet::new()),
            changed: Signal::new(),
        })
    }

    /// Seed a property without notifying.
    pub fn insert(&self, name: &str, value: impl Into<Value>) {
        self.props.borrow_mut().insert(name.to_string(), value.into());
    }

    /// Host-side mutation: set a property and notify.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        self.props.borrow_mut().insert(name.to_string(), value.into());
        self.changed.emit(&PropertyChange::Named(name.to_string()));
    }

    /// Read a property directly (test assertions).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.props.borrow().get(name).cloned()
    }

    /// Make a property reject writes through the binding.
    pub fn mark_read_only(&self, name: &str) {
        self.read_only.borrow_mut().insert(name.to_string());
    }

    /// Emit an unspecified-change notification.
    pub fn notify_all(&self) {
        self.changed.emit(&PropertyChange::All);
    }

    /// Number of live property-changed subscriptions.
    #[must_use]
    pub fn live_property_subscriptions(&self) -> usize {
        self.changed.live_count()
    }
}

impl DynObject for TestObject {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PROPERTIES | Capabilities::NOTIFY
    }

    fn as_reflective(&self) -> Option<&dyn Reflective> {
        Some(self)
    }

    fn as_notifying(&self) -> Option<&dyn Notifying> {
        Some(self)
    }
}

impl Reflective for TestObject {
    fn get_property(&self, name: &str) -> Result<Value, AccessError> {
        self.props
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| AccessError::NotFound {
                type_name: self.type_name.clone(),
                member: name.to_string(),
            })
    }

    fn set_property(&self, name: &str, value: Value) -> Result<(), AccessError> {
        if self.read_only.borrow().contains(name) {
            return Err(AccessError::ReadOnly {
                member: name.to_string(),
            });
        }
        if !self.props.borrow().contains_key(name) {
            return Err(AccessError::NotFound {
                type_name: self.type_name.clone(),
                member: name.to_string(),
            });
        }
        self.props.borrow_mut().insert(name.to_string(), value);
        self.changed.emit(&PropertyChange::Named(name.to_string()));
        Ok(())
    }

    fn has_property(&self, name: &str) -> bool {
        self.props.borrow().contains_key(name)
    }
}

impl Notifying for TestObject {
    fn property_changed(&self) -> &Signal<PropertyChange> {
        &self.changed
    }
}

// ---------------------------------------------------------------------------
// TestList — indexed elements with change notification
// ---------------------------------------------------------------------------

/// A notifying sequence with indexer access.
pub struct TestList {
    elems: RefCell<Vec<Value>>,
    changed: Signal<PropertyChange>,
}

impl TestList {
    /// Create a list holding `elems`.
    pub fn new(elems: Vec<Value>) -> Rc<Self> {
        Rc::new(Self {
            elems: RefCell::new(elems),
            changed: Signal::new(),
        })
    }

    /// Host-side mutation: replace an element and notify.
    pub fn set(&self, index: usize, value: Value) -> Result<(), AccessError> {
        let mut elems = self.elems.borrow_mut();
        let len = elems.len();
        let slot = elems.get_mut(index).ok_or(AccessError::OutOfBounds {
            detail: format!("index {index} on length {len}"),
        })?;
        *slot = value;
        drop(elems);
        self.changed.emit(&PropertyChange::Indexed);
        Ok(())
    }

    /// Number of live change subscriptions.
    #[must_use]
    pub fn live_subscriptions(&self) -> usize {
        self.changed.live_count()
    }
}

fn index_argument(args: &[Value]) -> Result<usize, AccessError> {
    match args {
        [Value::Int(i)] if *i >= 0 => Ok(*i as usize),
        [Value::Int(i)] => Err(AccessError::OutOfBounds {
            detail: format!("negative index {i}"),
        }),
        [other] => Err(AccessError::TypeMismatch {
            member: "[]".to_string(),
            detail: format!("expected integer index, got {}", other.type_label()),
        }),
        _ => Err(AccessError::TypeMismatch {
            member: "[]".to_string(),
            detail: format!("expected one argument, got {}", args.len()),
        }),
    }
}

impl DynObject for TestList {
    fn type_name(&self) -> &str {
        "TestList"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::INDEXED | Capabilities::NOTIFY
    }

    fn as_indexed(&self) -> Option<&dyn Indexed> {
        Some(self)
    }

    fn as_notifying(&self) -> Option<&dyn Notifying> {
        Some(self)
    }
}

impl Indexed for TestList {
    fn get_index(&self, args: &[Value]) -> Result<Value, AccessError> {
        let index = index_argument(args)?;
        let elems = self.elems.borrow();
        elems.get(index).cloned().ok_or(AccessError::OutOfBounds {
            detail: format!("index {index} on length {}", elems.len()),
        })
    }

    fn set_index(&self, args: &[Value], value: Value) -> Result<(), AccessError> {
        let index = index_argument(args)?;
        self.set(index, value)
    }
}

impl Notifying for TestList {
    fn property_changed(&self) -> &Signal<PropertyChange> {
        &self.changed
    }
}

// ---------------------------------------------------------------------------
// TestDictionary — keyed entries with change notification
// ---------------------------------------------------------------------------

/// A notifying dictionary with string keys.
pub struct TestDictionary {
    entries: RefCell<HashMap<String, Value>>,
    changed: Signal<PropertyChange>,
}

impl TestDictionary {
    /// Create an empty dictionary.
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            entries: RefCell::new(HashMap::new()),
            changed: Signal::new(),
        })
    }

    /// Number of live change subscriptions.
    #[must_use]
    pub fn live_subscriptions(&self) -> usize {
        self.changed.live_count()
    }
}

impl DynObject for TestDictionary {
    fn type_name(&self) -> &str {
        "TestDictionary"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::KEYED | Capabilities::NOTIFY
    }

    fn as_keyed(&self) -> Option<&dyn Keyed> {
        Some(self)
    }

    fn as_notifying(&self) -> Option<&dyn Notifying> {
        Some(self)
    }
}

impl Keyed for TestDictionary {
    fn get_key(&self, key: &str) -> Result<Value, AccessError> {
        self.entries
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| AccessError::NotFound {
                type_name: "TestDictionary".to_string(),
                member: key.to_string(),
            })
    }

    fn set_key(&self, key: &str, value: Value) -> Result<(), AccessError> {
        self.entries.borrow_mut().insert(key.to_string(), value);
        self.changed.emit(&PropertyChange::Named(key.to_string()));
        Ok(())
    }

    fn contains_key(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }
}

impl Notifying for TestDictionary {
    fn property_changed(&self) -> &Signal<PropertyChange> {
        &self.changed
    }
}

// ---------------------------------------------------------------------------
// TestElement — hierarchy participation with ambient context
// ---------------------------------------------------------------------------

/// A tree element with a parent link, an ambient data context, and named
/// properties, mimicking a host UI object.
pub struct TestElement {
    type_name: String,
    parent: RefCell<Option<WeakObject>>,
    context: RefCell<Value>,
    context_changed: Signal<Value>,
    parent_changed: Signal<()>,
    props: RefCell<HashMap<String, Value>>,
    prop_changed: Signal<PropertyChange>,
}

impl TestElement {
    /// Create a detached element with the given type label.
    pub fn new(type_name: &str) -> Rc<Self> {
        Rc::new(Self {
            type_name: type_name.to_string(),
            parent: RefCell::new(None),
            context: RefCell::new(Value::Null),
            context_changed: Signal::new(),
            parent_changed: Signal::new(),
            props: RefCell::new(HashMap::new()),
            prop_changed: Signal::new(),
        })
    }

    /// Reparent this element and notify.
    pub fn set_parent(&self, parent: Option<&ObjectRef>) {
        *self.parent.borrow_mut() = parent.map(Rc::downgrade);
        self.parent_changed.emit(&());
    }

    /// Replace the ambient data context and notify.
    pub fn set_data_context(&self, context: impl Into<Value>) {
        let context = context.into();
        *self.context.borrow_mut() = context.clone();
        self.context_changed.emit(&context);
    }

    /// Replace the ambient data context without notifying, mimicking a
    /// host whose inherited-context recomputation is silent.
    pub fn set_data_context_silently(&self, context: impl Into<Value>) {
        *self.context.borrow_mut() = context.into();
    }

    /// Seed a named property without notifying.
    pub fn insert(&self, name: &str, value: impl Into<Value>) {
        self.props.borrow_mut().insert(name.to_string(), value.into());
    }

    /// Host-side mutation: set a named property and notify.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        self.props.borrow_mut().insert(name.to_string(), value.into());
        self.prop_changed
            .emit(&PropertyChange::Named(name.to_string()));
    }

    /// Live subscriptions across all of this element's signals.
    #[must_use]
    pub fn live_subscriptions(&self) -> usize {
        self.context_changed.live_count()
            + self.parent_changed.live_count()
            + self.prop_changed.live_count()
    }
}

impl DynObject for TestElement {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::TREE | Capabilities::PROPERTIES | Capabilities::NOTIFY
    }

    fn as_reflective(&self) -> Option<&dyn Reflective> {
        Some(self)
    }

    fn as_notifying(&self) -> Option<&dyn Notifying> {
        Some(self)
    }

    fn as_element(&self) -> Option<&dyn Element> {
        Some(self)
    }
}

impl Reflective for TestElement {
    fn get_property(&self, name: &str) -> Result<Value, AccessError> {
        self.props
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| AccessError::NotFound {
                type_name: self.type_name.clone(),
                member: name.to_string(),
            })
    }

    fn set_property(&self, name: &str, value: Value) -> Result<(), AccessError> {
        if !self.props.borrow().contains_key(name) {
            return Err(AccessError::NotFound {
                type_name: self.type_name.clone(),
                member: name.to_string(),
            });
        }
        self.props.borrow_mut().insert(name.to_string(), value);
        self.prop_changed
            .emit(&PropertyChange::Named(name.to_string()));
        Ok(())
    }

    fn has_property(&self, name: &str) -> bool {
        self.props.borrow().contains_key(name)
    }
}

impl Notifying for TestElement {
    fn property_changed(&self) -> &Signal<PropertyChange> {
        &self.prop_changed
    }
}

impl Element for TestElement {
    fn parent(&self) -> Option<ObjectRef> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }

    fn data_context(&self) -> Value {
        self.context.borrow().clone()
    }

    fn data_context_changed(&self) -> &Signal<Value> {
        &self.context_changed
    }

    fn parent_changed(&self) -> &Signal<()> {
        &self.parent_changed
    }
}

// ---------------------------------------------------------------------------
// ValidatingObject — properties plus per-property validation errors
// ---------------------------------------------------------------------------

/// A notifying object that also publishes per-property validation errors.
pub struct ValidatingObject {
    type_name: String,
    props: RefCell<HashMap<String, Value>>,
    prop_changed: Signal<PropertyChange>,
    errors: RefCell<HashMap<String, Vec<String>>>,
    errors_changed: Signal<String>,
}

impl ValidatingObject {
    /// Create an empty object with the given type label.
    pub fn new(type_name: &str) -> Rc<Self> {
        Rc::new(Self {
            type_name: type_name.to_string(),
            props: RefCell::new(HashMap::new()),
            prop_changed: Signal::new(),
            errors: RefCell::new(HashMap::new()),
            errors_changed: Signal::new(),
        })
    }

    /// Seed a property without notifying.
    pub fn insert(&self, name: &str, value: impl Into<Value>) {
        self.props.borrow_mut().insert(name.to_string(), value.into());
    }

    /// Host-side validation outcome: replace a property's error set.
    pub fn set_errors(&self, property: &str, errors: Vec<String>) {
        self.errors
            .borrow_mut()
            .insert(property.to_string(), errors);
        self.errors_changed.emit(&property.to_string());
    }

    /// Live error-changed subscriptions.
    #[must_use]
    pub fn live_error_subscriptions(&self) -> usize {
        self.errors_changed.live_count()
    }

    /// Live property-changed subscriptions.
    #[must_use]
    pub fn live_property_subscriptions(&self) -> usize {
        self.prop_changed.live_count()
    }
}

impl DynObject for ValidatingObject {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PROPERTIES | Capabilities::NOTIFY | Capabilities::VALIDATES
    }

    fn as_reflective(&self) -> Option<&dyn Reflective> {
        Some(self)
    }

    fn as_notifying(&self) -> Option<&dyn Notifying> {
        Some(self)
    }

    fn as_error_notifying(&self) -> Option<&dyn ErrorNotifying> {
        Some(self)
    }
}

impl Reflective for ValidatingObject {
    fn get_property(&self, name: &str) -> Result<Value, AccessError> {
        self.props
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| AccessError::NotFound {
                type_name: self.type_name.clone(),
                member: name.to_string(),
            })
    }

    fn set_property(&self, name: &str, value: Value) -> Result<(), AccessError> {
        if !self.props.borrow().contains_key(name) {
            return Err(AccessError::NotFound {
                type_name: self.type_name.clone(),
                member: name.to_string(),
            });
        }
        self.props.borrow_mut().insert(name.to_string(), value);
        self.prop_changed
            .emit(&PropertyChange::Named(name.to_string()));
        Ok(())
    }

    fn has_property(&self, name: &str) -> bool {
        self.props.borrow().contains_key(name)
    }
}

impl Notifying for ValidatingObject {
    fn property_changed(&self) -> &Signal<PropertyChange> {
        &self.prop_changed
    }
}

impl ErrorNotifying for ValidatingObject {
    fn errors_for(&self, property: &str) -> Vec<String> {
        self.errors
            .borrow()
            .get(property)
            .cloned()
            .unwrap_or_default()
    }

    fn errors_changed(&self) -> &Signal<String> {
        &self.errors_changed
    }
}
