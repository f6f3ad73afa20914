#![forbid(unsafe_code)]

//! Boolean negation node.
//!
//! A pure value transform: negates any boolean-interpretable input. A null
//! input yields no value; an uninterpretable input yields a
//! conversion-error value.

use pathbind_core::value::{BindingError, Value};

use super::{NodeCore, PathNode};

/// A node negating a boolean-interpretable source value.
pub struct NegateNode {
    core: NodeCore,
}

impl NegateNode {
    /// Create a negation node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: NodeCore::new(),
        }
    }
}

impl Default for NegateNode {
    fn default() -> Self {
        Self::new()
    }
}

impl PathNode for NegateNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn on_source_changed(&self, _old: &Value, new: &Value) {
        match new {
            Value::Null | Value::Unset => self.clear_value(),
            other => match other.truthiness() {
                Some(b) => self.set_value(Value::Bool(!b)),
                None => self.set_error(BindingError::conversion(format!(
                    "unable to interpret {} value '{}' as a boolean",
                    other.type_label(),
                    other
                ))),
            },
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

    #[test]
    fn negates_booleans() {
        let node = NegateNode::new();
        node.set_source(Value::Bool(true));
        assert_eq!(node.value(), Value::Bool(false));

        node.set_source(Value::Bool(false));
        assert_eq!(node.value(), Value::Bool(true));
    }

    #[test]
    fn negates_convertible_scalars() {
        let node = NegateNode::new();
        node.set_source(Value::Int(0));
        assert_eq!(node.value(), Value::Bool(true));

        node.set_source(Value::from("true"));
        assert_eq!(node.value(), Value::Bool(false));
    }

    #[test]
    fn null_input_yields_no_value() {
        let node = NegateNode::new();
        node.set_source(Value::Bool(true));
        node.set_source(Value::Null);
        assert_eq!(node.value(), Value::Unset);
    }

    #[test]
    fn non_convertible_input_is_a_conversion_error() {
        let node = NegateNode::new();
        let obj = TestObject::new("Person");
        node.set_source(Value::object(&obj));
        match node.value() {
            Value::Error(e) => {
                assert_eq!(e.kind(), pathbind_core::value::ErrorKind::Conversion);
            }
            other => panic!("expected conversion error, got {other:?}"),
        }
    }
}
