#![forbid(unsafe_code)]

//! Pluggable accessor strategies for reading, writing, and observing
//! members on objects of unknown shape.
//!
//! # Design
//!
//! Each plugin knows how to serve one capability family. The
//! [`AccessorRegistry`] keeps plugins in priority order and answers lookups
//! first-match-wins, so a custom adapter registered by the host shadows the
//! built-ins for the sources it claims.
//!
//! An accessor started by a plugin is bound to one `(source, member)` pair.
//! [`PropertyAccessor::subscribe`] wires change notifications only; the
//! initial read is the caller's job via [`PropertyAccessor::value`], which
//! keeps the caller in control of when the first value cascades.
//!
//! # Failure Modes
//!
//! - Dead source: reads yield [`Value::Unset`], writes fail with
//!   [`AccessError::NoSource`].
//! - Member read failure: yielded as an error-tagged [`Value`], never a
//!   panic.

pub mod keyed;
pub mod notify;
pub mod sequence;
pub mod validation;

use std::rc::Rc;

use tracing::trace;

use crate::signal::Subscription;
use crate::value::{BindingError, ObjectRef, Value, WeakObject};
use crate::object::AccessError;

pub use keyed::KeyedPlugin;
pub use notify::NotifyPropertyPlugin;
pub use sequence::SequenceIndexerPlugin;
pub use validation::ErrorNotifyingValidationPlugin;

/// Observer invoked by an accessor when the observed member changes.
pub type ValueObserver = Rc<dyn Fn(&Value)>;

/// Sink for validation errors pushed by a [`ValidationPlugin`].
pub type ValidationSink = Rc<dyn Fn(BindingError)>;

/// A started accessor bound to one member of one (weakly-held) source.
pub trait PropertyAccessor {
    /// The member this accessor serves, for diagnostics.
    fn property_name(&self) -> &str;

    /// Read the current value. A dead source reads as [`Value::Unset`];
    /// read failures are error-tagged values.
    fn value(&self) -> Value;

    /// Write through to the source.
    fn write(&self, _value: Value) -> Result<(), AccessError> {
        Err(AccessError::NotSupported)
    }

    /// Whether this accessor supports writes against its current source.
    fn can_write(&self) -> bool {
        false
    }

    /// Wire change notifications to `observer`. Sources without
    /// notification support return [`Subscription::noop`].
    fn subscribe(&self, observer: ValueObserver) -> Subscription;
}

/// Strategy serving named-property access for matching sources.
pub trait AccessorPlugin {
    /// Plugin name for diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this plugin can serve `property` on `source`.
    fn matches(&self, source: &ObjectRef, property: &str) -> bool;

    /// Start an accessor for `property` on the weakly-held `source`.
    fn start(&self, source: &WeakObject, property: &str) -> Option<Box<dyn PropertyAccessor>>;
}

/// Strategy serving indexer access for matching sources.
pub trait IndexerPlugin {
    /// Plugin name for diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this plugin can index into `source`.
    fn matches(&self, source: &ObjectRef) -> bool;

    /// Start an accessor for the element addressed by `args`.
    fn start(&self, source: &WeakObject, args: &[Value]) -> Option<Box<dyn PropertyAccessor>>;
}

/// Strategy observing validation errors for a member of matching sources.
pub trait ValidationPlugin {
    /// Plugin name for diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this plugin can observe validation state of `property` on
    /// `source`.
    fn matches(&self, source: &ObjectRef, property: &str) -> bool;

    /// Start observing; errors are pushed into `sink`. The returned guard
    /// detaches the observer when dropped.
    fn start(
        &self,
        source: &WeakObject,
        property: &str,
        sink: ValidationSink,
    ) -> Option<Subscription>;
}

/// Ordered plugin lists tried first-match-wins.
pub struct AccessorRegistry {
    properties: Vec<Rc<dyn AccessorPlugin>>,
    indexers: Vec<Rc<dyn IndexerPlugin>>,
    validators: Vec<Rc<dyn ValidationPlugin>>,
}

impl AccessorRegistry {
    /// A registry with no plugins installed.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            properties: Vec::new(),
            indexers: Vec::new(),
            validators: Vec::new(),
        }
    }

    /// A registry with the built-in adapters installed, in priority order:
    /// notification-aware reflective properties, then dictionary entries;
    /// sequence indexing; validation-error observation.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.properties.push(Rc::new(NotifyPropertyPlugin));
        registry.properties.push(Rc::new(KeyedPlugin));
        registry.indexers.push(Rc::new(SequenceIndexerPlugin));
        registry
            .validators
            .push(Rc::new(ErrorNotifyingValidationPlugin));
        registry
    }

    /// Install a property plugin at the highest priority.
    pub fn register_property_plugin(&mut self, plugin: Rc<dyn AccessorPlugin>) {
        self.properties.insert(0, plugin);
    }

    /// Install an indexer plugin at the highest priority.
    pub fn register_indexer_plugin(&mut self, plugin: Rc<dyn IndexerPlugin>) {
        self.indexers.insert(0, plugin);
    }

    /// Install a validation plugin at the highest priority.
    pub fn register_validation_plugin(&mut self, plugin: Rc<dyn ValidationPlugin>) {
        self.validators.insert(0, plugin);
    }

    /// First property plugin claiming `(source, property)`.
    #[must_use]
    pub fn find_property_plugin(
        &self,
        source: &ObjectRef,
        property: &str,
    ) -> Option<Rc<dyn AccessorPlugin>> {
        let Some(found) = self.properties.iter().find(|p| p.matches(source, property)) else {
            trace!(
                property,
                capabilities = ?source.capabilities(),
                "no property plugin matched"
            );
            return None;
        };
        trace!(plugin = found.name(), property, "property plugin matched");
        Some(Rc::clone(found))
    }

    /// First indexer plugin claiming `source`.
    #[must_use]
    pub fn find_indexer_plugin(&self, source: &ObjectRef) -> Option<Rc<dyn IndexerPlugin>> {
        let Some(found) = self.indexers.iter().find(|p| p.matches(source)) else {
            trace!(capabilities = ?source.capabilities(), "no indexer plugin matched");
            return None;
        };
        trace!(plugin = found.name(), "indexer plugin matched");
        Some(Rc::clone(found))
    }

    /// First validation plugin claiming `(source, property)`.
    #[must_use]
    pub fn find_validation_plugin(
        &self,
        source: &ObjectRef,
        property: &str,
    ) -> Option<Rc<dyn ValidationPlugin>> {
        let found = self
            .validators
            .iter()
            .find(|p| p.matches(source, property))?;
        trace!(plugin = found.name(), property, "validation plugin matched");
        Some(Rc::clone(found))
    }
}

impl Default for AccessorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for AccessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessorRegistry")
            .field("properties", &self.properties.len())
            .field("indexers", &self.indexers.len())
            .field("validators", &self.validators.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Keyed;
    use crate::testkit::{TestDictionary, TestList, TestObject};

    #[test]
    fn defaults_resolve_reflective_before_keyed() {
        let registry = AccessorRegistry::with_defaults();

        let obj = TestObject::new("Person");
        obj.insert("Name", "Frank");
        let handle = obj.clone() as ObjectRef;
        let plugin = registry
            .find_property_plugin(&handle, "Name")
            .expect("reflective source matches");
        assert_eq!(plugin.name(), "notify-property");

        let dict = TestDictionary::new();
        dict.set_key("Name", Value::from("Kups")).expect("insert");
        let handle = dict.clone() as ObjectRef;
        let plugin = registry
            .find_property_plugin(&handle, "Name")
            .expect("keyed source matches");
        assert_eq!(plugin.name(), "keyed");
    }

    #[test]
    fn no_plugin_for_unknown_member() {
        let registry = AccessorRegistry::with_defaults();
        let obj = TestObject::new("Person");
        let handle = obj.clone() as ObjectRef;
        assert!(registry.find_property_plugin(&handle, "Missing").is_none());
    }

    #[test]
    fn indexer_lookup() {
        let registry = AccessorRegistry::with_defaults();
        let list = TestList::new(vec![Value::Int(1)]);
        let handle = list.clone() as ObjectRef;
        assert!(registry.find_indexer_plugin(&handle).is_some());

        let obj = TestObject::new("Person");
        let handle = obj.clone() as ObjectRef;
        assert!(registry.find_indexer_plugin(&handle).is_none());
    }

    #[test]
    fn custom_plugin_shadows_builtins() {
        struct Shadow;
        impl AccessorPlugin for Shadow {
            fn name(&self) -> &'static str {
                "shadow"
            }
            fn matches(&self, _source: &ObjectRef, _property: &str) -> bool {
                true
            }
            fn start(
                &self,
                _source: &WeakObject,
                _property: &str,
            ) -> Option<Box<dyn PropertyAccessor>> {
                None
            }
        }

        let mut registry = AccessorRegistry::with_defaults();
        registry.register_property_plugin(Rc::new(Shadow));

        let obj = TestObject::new("Person");
        obj.insert("Name", "Frank");
        let handle = obj.clone() as ObjectRef;
        let plugin = registry
            .find_property_plugin(&handle, "Name")
            .expect("shadow matches everything");
        assert_eq!(plugin.name(), "shadow");
    }
}
