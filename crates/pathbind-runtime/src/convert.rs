#![forbid(unsafe_code)]

//! Output conversion policy: value conversion, fallback substitution,
//! target-shape coercion, and string formatting.
//!
//! The policy runs once per publish, in a fixed order: the configured
//! converter first (which may suppress the publish entirely), then
//! fallback substitution for unresolved values, then formatting or
//! coercion. Error-tagged values bypass the converter, the formatter, and
//! coercion — they are delivered tagged so the subscriber can distinguish
//! a fault from data.

use std::rc::Rc;

use pathbind_core::value::{BindingError, Value};

/// The shape the subscriber wants values coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetShape {
    /// Deliver values as they resolve.
    #[default]
    Any,
    /// Coerce to a boolean.
    Boolean,
    /// Coerce to an integer.
    Integer,
    /// Coerce to a float.
    Float,
    /// Coerce to text.
    Text,
}

/// Result of a [`ValueConverter`] application.
#[derive(Debug, Clone, PartialEq)]
pub enum Converted {
    /// Continue publishing with this value.
    Value(Value),
    /// Skip this publish entirely.
    Suppress,
}

/// A caller-supplied value conversion applied before coercion.
pub trait ValueConverter {
    /// Convert `value` for delivery. Returning [`Converted::Suppress`]
    /// skips the publish.
    fn convert(&self, value: &Value, target: TargetShape, parameter: Option<&Value>) -> Converted;
}

/// Coerce `value` to `shape`.
///
/// `Null`, `Unset`, and error values pass through untouched; a failed
/// coercion yields a conversion-error value.
#[must_use]
pub fn coerce(value: Value, shape: TargetShape) -> Value {
    if value.is_null() || value.is_unset() || value.is_error() {
        return value;
    }
    match shape {
        TargetShape::Any => value,
        TargetShape::Text => Value::Str(value.to_string()),
        TargetShape::Boolean => match value.truthiness() {
            Some(b) => Value::Bool(b),
            None => conversion_error(&value, "boolean"),
        },
        TargetShape::Integer => match &value {
            Value::Int(_) => value,
            Value::Float(f) => Value::Int(*f as i64),
            Value::Bool(b) => Value::Int(i64::from(*b)),
            Value::Str(s) => match s.trim().parse::<i64>() {
                Ok(i) => Value::Int(i),
                Err(_) => conversion_error(&value, "integer"),
            },
            _ => conversion_error(&value, "integer"),
        },
        TargetShape::Float => match &value {
            Value::Float(_) => value,
            Value::Int(i) => Value::Float(*i as f64),
            Value::Str(s) => match s.trim().parse::<f64>() {
                Ok(f) => Value::Float(f),
                Err(_) => conversion_error(&value, "float"),
            },
            _ => conversion_error(&value, "float"),
        },
    }
}

fn conversion_error(value: &Value, shape: &str) -> Value {
    Value::Error(BindingError::conversion(format!(
        "cannot coerce {} value '{}' to {}",
        value.type_label(),
        value,
        shape
    )))
}

/// Substitute `value` into a `{}` template, producing text.
#[must_use]
pub fn format_text(template: &str, value: &Value) -> Value {
    Value::Str(template.replace("{}", &value.to_string()))
}

/// A value as delivered to the subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    /// The delivered value.
    pub value: Value,
    /// Whether the value is plain data: not a fallback substitute, not
    /// null, not unresolved, and not error-tagged.
    pub plain: bool,
}

/// The session's output conversion configuration.
#[derive(Default)]
pub struct ConvertPolicy {
    /// Optional converter applied before everything else.
    pub converter: Option<Rc<dyn ValueConverter>>,
    /// Opaque parameter handed to the converter.
    pub parameter: Option<Value>,
    /// Substitute published when resolution yields `Unset`.
    pub fallback: Option<Value>,
    /// Shape the subscriber wants.
    pub target: TargetShape,
    /// `{}` template applied when the target shape is textual.
    pub format: Option<String>,
}

impl ConvertPolicy {
    /// Run the publish pipeline on a raw chain value. `None` means the
    /// converter suppressed this publish.
    #[must_use]
    pub fn apply(&self, raw: Value) -> Option<Published> {
        let mut value = raw;

        if let Some(converter) = &self.converter {
            if !value.is_error() {
                match converter.convert(&value, self.target, self.parameter.as_ref()) {
                    Converted::Suppress => return None,
                    Converted::Value(converted) => value = converted,
                }
            }
        }

        if value.is_unset() {
            // The subscriber never sees the unresolved sentinel.
            let substitute = self.fallback.clone().unwrap_or(Value::Null);
            return Some(Published {
                value: substitute,
                plain: false,
            });
        }

        if value.is_error() || value.is_null() {
            return Some(Published {
                value,
                plain: false,
            });
        }

        let value = match (&self.format, self.target) {
            (Some(template), TargetShape::Text | TargetShape::Any) => {
                format_text(template, &value)
            }
            _ => coerce(value, self.target),
        };

        let plain = !value.is_error();
        Some(Published { value, plain })
    }
}

impl std::fmt::Debug for ConvertPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvertPolicy")
            .field("converter", &self.converter.is_some())
            .field("fallback", &self.fallback)
            .field("target", &self.target)
            .field("format", &self.format)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
