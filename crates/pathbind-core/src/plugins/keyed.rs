#![forbid(unsafe_code)]

//! Dictionary adapter: serves property names as keyed lookups.
//!
//! Matches sources exposing [`Keyed`] that currently contain the requested
//! key. Writes may insert new entries; notifications (when the source is
//! also notifying) use the key as the property name.

use crate::object::AccessError;
use crate::plugins::{AccessorPlugin, PropertyAccessor, ValueObserver};
use crate::signal::Subscription;
use crate::value::{BindingError, ObjectRef, Value, WeakObject};

/// Built-in adapter for keyed (dictionary-style) sources.
pub struct KeyedPlugin;

impl AccessorPlugin for KeyedPlugin {
    fn name(&self) -> &'static str {
        "keyed"
    }

    fn matches(&self, source: &ObjectRef, property: &str) -> bool {
        source.as_keyed().is_some_and(|k| k.contains_key(property))
    }

    fn start(&self, source: &WeakObject, property: &str) -> Option<Box<dyn PropertyAccessor>> {
        Some(Box::new(KeyedAccessor {
            source: source.clone(),
            key: property.to_string(),
        }))
    }
}

struct KeyedAccessor {
    source: WeakObject,
    key: String,
}

fn read(source: &WeakObject, key: &str) -> Value {
    let Some(object) = source.upgrade() else {
        return Value::Unset;
    };
    match object.as_keyed() {
        Some(keyed) => match keyed.get_key(key) {
            Ok(value) => value,
            Err(e) => Value::Error(e.into()),
        },
        None => Value::Error(BindingError::resolution(format!(
            "'{}' has no keyed entries",
            object.type_name()
        ))),
    }
}

impl PropertyAccessor for KeyedAccessor {
    fn property_name(&self) -> &str {
        &self.key
    }

    fn value(&self) -> Value {
        read(&self.source, &self.key)
    }

    fn write(&self, value: Value) -> Result<(), AccessError> {
        let object = self.source.upgrade().ok_or(AccessError::NoSource)?;
        let keyed = object.as_keyed().ok_or(AccessError::NotSupported)?;
        keyed.set_key(&self.key, value)
    }

    fn can_write(&self) -> bool {
        self.source
            .upgrade()
            .is_some_and(|o| o.as_keyed().is_some())
    }

    fn subscribe(&self, observer: ValueObserver) -> Subscription {
        let Some(object) = self.source.upgrade() else {
            return Subscription::noop();
        };
        let Some(notifying) = object.as_notifying() else {
            return Subscription::noop();
        };

        let source = self.source.clone();
        let key = self.key.clone();
        notifying.property_changed().subscribe(move |change| {
            if change.concerns(&key) {
                observer(&read(&source, &key));
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
