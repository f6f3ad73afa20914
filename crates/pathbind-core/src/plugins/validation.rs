#![forbid(unsafe_code)]

//! Validation-error adapter for sources that publish per-property errors.
//!
//! Serves sources exposing [`ErrorNotifying`]. On start, any current
//! errors for the observed property are pushed immediately; afterwards the
//! sink receives a validation error each time the property's error set
//! becomes non-empty.

use crate::object::ErrorNotifying;
use crate::plugins::{ValidationPlugin, ValidationSink};
use crate::signal::Subscription;
use crate::value::{BindingError, ObjectRef, WeakObject};

/// Built-in validation observer over [`ErrorNotifying`] sources.
pub struct ErrorNotifyingValidationPlugin;

fn push_errors(errors: &dyn ErrorNotifying, property: &str, sink: &ValidationSink) {
    let current = errors.errors_for(property);
    if !current.is_empty() {
        sink(BindingError::validation(current.join("; ")));
    }
}

impl ValidationPlugin for ErrorNotifyingValidationPlugin {
    fn name(&self) -> &'static str {
        "error-notifying"
    }

    fn matches(&self, source: &ObjectRef, _property: &str) -> bool {
        source.as_error_notifying().is_some()
    }

    fn start(
        &self,
        source: &WeakObject,
        property: &str,
        sink: ValidationSink,
    ) -> Option<Subscription> {
        let object = source.upgrade()?;
        let errors = object.as_error_notifying()?;

        let weak = source.clone();
        let observed = property.to_string();
        let sink_for_changes = sink.clone();
        let subscription = errors.errors_changed().subscribe(move |changed: &String| {
            if *changed != observed {
                return;
            }
            if let Some(object) = weak.upgrade() {
                if let Some(errors) = object.as_error_notifying() {
                    push_errors(errors, &observed, &sink_for_changes);
                }
            }
        });

        push_errors(errors, property, &sink);
        Some(subscription)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
