#![forbid(unsafe_code)]

//! Indexer adapter for sequence-shaped sources.
//!
//! Serves any source exposing [`Indexed`]. Unlike named properties, the
//! notification filter is "did any indexer-shaped property change" —
//! [`PropertyChange::Indexed`] or [`PropertyChange::All`] — because an
//! element mutation rarely names the affected index.

use std::fmt::Write as _;

use crate::object::AccessError;
use crate::plugins::{IndexerPlugin, PropertyAccessor, ValueObserver};
use crate::signal::Subscription;
use crate::value::{BindingError, ObjectRef, Value, WeakObject};

/// Built-in adapter for indexed sources.
pub struct SequenceIndexerPlugin;

impl IndexerPlugin for SequenceIndexerPlugin {
    fn name(&self) -> &'static str {
        "sequence-indexer"
    }

    fn matches(&self, source: &ObjectRef) -> bool {
        source.as_indexed().is_some()
    }

    fn start(&self, source: &WeakObject, args: &[Value]) -> Option<Box<dyn PropertyAccessor>> {
        Some(Box::new(IndexerAccessor {
            source: source.clone(),
            label: describe(args),
            args: args.to_vec(),
        }))
    }
}

/// Render indexer arguments for diagnostics, e.g. `[2]` or `[a, 2]`.
fn describe(args: &[Value]) -> String {
    let mut label = String::from("[");
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            label.push_str(", ");
        }
        let _ = write!(label, "{arg}");
    }
    label.push(']');
    label
}

struct IndexerAccessor {
    source: WeakObject,
    args: Vec<Value>,
    label: String,
}

fn read(source: &WeakObject, args: &[Value]) -> Value {
    let Some(object) = source.upgrade() else {
        return Value::Unset;
    };
    match object.as_indexed() {
        Some(indexed) => match indexed.get_index(args) {
            Ok(value) => value,
            Err(e) => Value::Error(e.into()),
        },
        None => Value::Error(BindingError::resolution(format!(
            "'{}' is not indexable",
            object.type_name()
        ))),
    }
}

impl PropertyAccessor for IndexerAccessor {
    fn property_name(&self) -> &str {
        &self.label
    }

    fn value(&self) -> Value {
        read(&self.source, &self.args)
    }

    fn write(&self, value: Value) -> Result<(), AccessError> {
        let object = self.source.upgrade().ok_or(AccessError::NoSource)?;
        let indexed = object.as_indexed().ok_or(AccessError::NotSupported)?;
        indexed.set_index(&self.args, value)
    }

    fn can_write(&self) -> bool {
        self.source
            .upgrade()
            .is_some_and(|o| o.as_indexed().is_some())
    }

    fn subscribe(&self, observer: ValueObserver) -> Subscription {
        let Some(object) = self.source.upgrade() else {
            return Subscription::noop();
        };
        let Some(notifying) = object.as_notifying() else {
            return Subscription::noop();
        };

        let source = self.source.clone();
        let args = self.args.clone();
        notifying.property_changed().subscribe(move |change| {
            if change.concerns_index() {
                observer(&read(&source, &args));
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
