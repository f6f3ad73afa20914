#![forbid(unsafe_code)]

//! Name scope: a name → object registry for named-element lookup.
//!
//! Entries are held weakly; registering a name does not keep the element
//! alive. The [`NameScope::changed`] signal fires with the affected name on
//! every registration and unregistration so lookups can re-resolve.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::signal::Signal;
use crate::value::{ObjectRef, WeakObject};

/// A scoping registry resolving names to host objects.
pub struct NameScope {
    entries: RefCell<HashMap<String, WeakObject>>,
    changed: Signal<String>,
}

impl NameScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            entries: RefCell::new(HashMap::new()),
            changed: Signal::new(),
        })
    }

    /// Register `object` under `name`, replacing any previous entry.
    pub fn register(&self, name: impl Into<String>, object: &ObjectRef) {
        let name = name.into();
        self.entries
            .borrow_mut()
            .insert(name.clone(), Rc::downgrade(object));
        self.changed.emit(&name);
    }

    /// Remove the entry under `name`, if any.
    pub fn unregister(&self, name: &str) {
        if self.entries.borrow_mut().remove(name).is_some() {
            self.changed.emit(&name.to_string());
        }
    }

    /// Resolve `name` to a live object. A dead entry resolves to `None`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ObjectRef> {
        self.entries.borrow().get(name)?.upgrade()
    }

    /// Fires with the affected name on every registration change.
    #[must_use]
    pub fn changed(&self) -> &Signal<String> {
        &self.changed
    }
}

impl std::fmt::Debug for NameScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameScope")
            .field("entries", &self.entries.borrow().len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::TestObject;
    use crate::value::Value;

    #[test]
    fn register_and_resolve() {
        let scope = NameScope::new();
        let obj = TestObject::new("A");
        scope.register("a", &(obj.clone() as ObjectRef));

        let resolved = scope.resolve("a").expect("registered name resolves");
        assert_eq!(Value::Object(resolved), Value::object(&obj));
        assert!(scope.resolve("b").is_none());
    }

    #[test]
    fn entries_are_weak() {
        let scope = NameScope::new();
        let obj = TestObject::new("A");
        scope.register("a", &(obj.clone() as ObjectRef));

        drop(obj);
        assert!(scope.resolve("a").is_none());
    }

    #[test]
    fn changed_fires_with_name() {
        let scope = NameScope::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::clone(&seen);
        let _sub = scope.changed().subscribe(move |name: &String| {
            s.borrow_mut().push(name.clone());
        });

        let obj = TestObject::new("A");
        scope.register("a", &(obj.clone() as ObjectRef));
        scope.unregister("a");
        scope.unregister("a"); // absent: no notification

        assert_eq!(*seen.borrow(), vec!["a".to_string(), "a".to_string()]);
    }
}
