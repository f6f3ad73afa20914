#![forbid(unsafe_code)]

//! Reflective property adapter with change-notification support.
//!
//! Serves any source exposing [`Reflective`]; when the source is also
//! [`Notifying`], the accessor re-reads on notifications that concern its
//! property (or on [`PropertyChange::All`]) and no-ops on everything else.

use crate::object::{AccessError, Reflective};
use crate::plugins::{AccessorPlugin, PropertyAccessor, ValueObserver};
use crate::signal::Subscription;
use crate::value::{BindingError, ObjectRef, Value, WeakObject};

/// Built-in adapter for reflective, optionally notifying sources.
pub struct NotifyPropertyPlugin;

impl AccessorPlugin for NotifyPropertyPlugin {
    fn name(&self) -> &'static str {
        "notify-property"
    }

    fn matches(&self, source: &ObjectRef, property: &str) -> bool {
        source
            .as_reflective()
            .is_some_and(|r| r.has_property(property))
    }

    fn start(&self, source: &WeakObject, property: &str) -> Option<Box<dyn PropertyAccessor>> {
        Some(Box::new(NotifyAccessor {
            source: source.clone(),
            property: property.to_string(),
        }))
    }
}

struct NotifyAccessor {
    source: WeakObject,
    property: String,
}

/// Read `property` from a weakly-held source, mapping failures into the
/// value channel.
fn read(source: &WeakObject, property: &str) -> Value {
    let Some(object) = source.upgrade() else {
        return Value::Unset;
    };
    match object.as_reflective() {
        Some(reflective) => match reflective.get_property(property) {
            Ok(value) => value,
            Err(e) => Value::Error(e.into()),
        },
        None => Value::Error(BindingError::resolution(format!(
            "'{}' has no named properties",
            object.type_name()
        ))),
    }
}

impl PropertyAccessor for NotifyAccessor {
    fn property_name(&self) -> &str {
        &self.property
    }

    fn value(&self) -> Value {
        read(&self.source, &self.property)
    }

    fn write(&self, value: Value) -> Result<(), AccessError> {
        let object = self.source.upgrade().ok_or(AccessError::NoSource)?;
        let reflective = object.as_reflective().ok_or(AccessError::NotSupported)?;
        reflective.set_property(&self.property, value)
    }

    fn can_write(&self) -> bool {
        self.source
            .upgrade()
            .and_then(|o| o.as_reflective().map(|r: &dyn Reflective| {
                r.has_property(&self.property)
            }))
            .unwrap_or(false)
    }

    fn subscribe(&self, observer: ValueObserver) -> Subscription {
        let Some(object) = self.source.upgrade() else {
            return Subscription::noop();
        };
        let Some(notifying) = object.as_notifying() else {
            return Subscription::noop();
        };

        let source = self.source.clone();
        let property = self.property.clone();
        notifying.property_changed().subscribe(move |change| {
            if change.concerns(&property) {
                observer(&read(&source, &property));
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
