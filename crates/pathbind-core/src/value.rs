#![forbid(unsafe_code)]

//! Dynamically-shaped values flowing through a binding chain.
//!
//! A binding resolves against objects whose shape is discovered only at
//! binding time, so everything a chain carries is a [`Value`]: scalars,
//! strings, shared host objects, a resolved `Null`, the [`Value::Unset`]
//! sentinel, or an error-tagged [`Value::Error`].
//!
//! # Invariants
//!
//! 1. `Unset` means "no value / not yet resolved" and is never equal to a
//!    legitimately null resolved value (`Null`).
//! 2. Object values compare by identity (`Rc::ptr_eq`), scalars compare
//!    structurally, errors compare by kind and message. This is the
//!    consumer-visible equality used for change coalescing.
//! 3. A [`WeakValue`] fails to upgrade only when a held object has been
//!    reclaimed; scalar payloads always upgrade.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::object::DynObject;

/// Shared handle to a host object of unknown shape.
pub type ObjectRef = Rc<dyn DynObject>;

/// Non-owning handle to a host object, with a first-class liveness query
/// (`Weak::upgrade`).
pub type WeakObject = Weak<dyn DynObject>;

/// Classifies a [`BindingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A node could not compute a value from its current source.
    Resolution,
    /// A value could not be interpreted as the requested shape.
    Conversion,
    /// A data-validation rule rejected the value.
    Validation,
    /// A write through the chain failed.
    Write,
}

/// An error carried through the normal value channel.
///
/// Resolution and conversion faults are recovered locally at the node that
/// encountered them and travel downstream as [`Value::Error`]; they are
/// never raised as panics across node boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingError {
    kind: ErrorKind,
    message: String,
}

impl BindingError {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A resolution fault (missing member, type mismatch, dead source).
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resolution, message)
    }

    /// A conversion fault.
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conversion, message)
    }

    /// A data-validation fault.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// A write-back fault.
    pub fn write(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Write, message)
    }

    /// The error's classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Resolution => write!(f, "resolution error: {}", self.message),
            ErrorKind::Conversion => write!(f, "conversion error: {}", self.message),
            ErrorKind::Validation => write!(f, "validation error: {}", self.message),
            ErrorKind::Write => write!(f, "write error: {}", self.message),
        }
    }
}

impl std::error::Error for BindingError {}

/// A value produced or consumed by a binding chain.
#[derive(Clone)]
pub enum Value {
    /// Not yet resolved. Distinct from a resolved [`Value::Null`].
    Unset,
    /// A legitimately null resolved value.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating-point scalar.
    Float(f64),
    /// Owned string.
    Str(String),
    /// Shared host object.
    Object(ObjectRef),
    /// Error-tagged value travelling through the normal value channel.
    Error(BindingError),
}

impl Value {
    /// Wrap a concrete host object.
    pub fn object<T: DynObject>(object: &Rc<T>) -> Self {
        let handle: ObjectRef = object.clone();
        Self::Object(handle)
    }

    /// Whether this is the [`Value::Unset`] sentinel.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Whether this is a resolved null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value is error-tagged.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Short label for the value's shape, used in diagnostics.
    #[must_use]
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Object(_) => "object",
            Self::Error(_) => "error",
        }
    }

    /// Boolean interpretation: `Bool` as-is, nonzero numerics, and the
    /// strings "true"/"false" (case-insensitive). Everything else has no
    /// boolean interpretation.
    #[must_use]
    pub fn truthiness(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            Self::Float(f) => Some(*f != 0.0),
            Self::Str(s) => {
                if s.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unset, Self::Unset) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Error(a), Self::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "Unset"),
            Self::Null => write!(f, "Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::Float(x) => write!(f, "Float({x})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Object(o) => write!(f, "Object({})", o.type_name()),
            Self::Error(e) => write!(f, "Error({e})"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset | Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Object(o) => write!(f, "{}", o.type_name()),
            Self::Error(e) => write!(f, "{e}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<BindingError> for Value {
    fn from(e: BindingError) -> Self {
        Self::Error(e)
    }
}

/// A weak holder for a cached [`Value`].
///
/// Scalars are held inline; objects are downgraded so a cached value never
/// keeps a host object alive. [`WeakValue::upgrade`] answers the liveness
/// question: it returns `None` only when a held object has been reclaimed.
#[derive(Clone)]
pub enum WeakValue {
    /// No value held.
    Unset,
    /// Held null.
    Null,
    /// Held boolean.
    Bool(bool),
    /// Held integer.
    Int(i64),
    /// Held float.
    Float(f64),
    /// Held string.
    Str(String),
    /// Weakly-held object.
    Object(WeakObject),
    /// Held error.
    Error(BindingError),
}

impl WeakValue {
    /// Take a weak hold of `value`.
    #[must_use]
    pub fn hold(value: &Value) -> Self {
        match value {
            Value::Unset => Self::Unset,
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Int(i) => Self::Int(*i),
            Value::Float(f) => Self::Float(*f),
            Value::Str(s) => Self::Str(s.clone()),
            Value::Object(o) => Self::Object(Rc::downgrade(o)),
            Value::Error(e) => Self::Error(e.clone()),
        }
    }

    /// Recover the held value. Returns `None` only when a held object has
    /// been reclaimed.
    #[must_use]
    pub fn upgrade(&self) -> Option<Value> {
        match self {
            Self::Unset => Some(Value::Unset),
            Self::Null => Some(Value::Null),
            Self::Bool(b) => Some(Value::Bool(*b)),
            Self::Int(i) => Some(Value::Int(*i)),
            Self::Float(f) => Some(Value::Float(*f)),
            Self::Str(s) => Some(Value::Str(s.clone())),
            Self::Object(o) => o.upgrade().map(Value::Object),
            Self::Error(e) => Some(Value::Error(e.clone())),
        }
    }

    /// Whether nothing is held.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

impl fmt::Debug for WeakValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(v) => write!(f, "WeakValue({v:?})"),
            None => write!(f, "WeakValue(<reclaimed>)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::TestObject;

    #[test]
    fn unset_is_not_null() {
        assert_ne!(Value::Unset, Value::Null);
        assert!(Value::Unset.is_unset());
        assert!(!Value::Null.is_unset());
        assert!(Value::Null.is_null());
    }

    #[test]
    fn scalar_equality_is_structural() {
        assert_eq!(Value::Int(3), Value::Int(3));
        assert_ne!(Value::Int(3), Value::Int(4));
        assert_eq!(Value::from("abc"), Value::from("abc"));
        assert_ne!(Value::Int(1), Value::Bool(true));
    }

    #[test]
    fn object_equality_is_identity() {
        let a = TestObject::new("A");
        let b = TestObject::new("A");
        assert_eq!(Value::object(&a), Value::object(&a));
        assert_ne!(Value::object(&a), Value::object(&b));
    }

    #[test]
    fn error_equality_by_kind_and_message() {
        let a = Value::Error(BindingError::resolution("missing"));
        let b = Value::Error(BindingError::resolution("missing"));
        let c = Value::Error(BindingError::conversion("missing"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn error_display_includes_kind() {
        assert_eq!(
            BindingError::resolution("missing member").to_string(),
            "resolution error: missing member"
        );
        assert_eq!(
            BindingError::write("setter rejected").to_string(),
            "write error: setter rejected"
        );
    }

    #[test]
    fn truthiness_rules() {
        assert_eq!(Value::Bool(true).truthiness(), Some(true));
        assert_eq!(Value::Int(0).truthiness(), Some(false));
        assert_eq!(Value::Int(7).truthiness(), Some(true));
        assert_eq!(Value::Float(0.0).truthiness(), Some(false));
        assert_eq!(Value::from("TRUE").truthiness(), Some(true));
        assert_eq!(Value::from("false").truthiness(), Some(false));
        assert_eq!(Value::from("maybe").truthiness(), None);
        assert_eq!(Value::Null.truthiness(), None);
        assert_eq!(Value::Unset.truthiness(), None);
    }

    #[test]
    fn weak_value_scalars_always_upgrade() {
        let held = WeakValue::hold(&Value::Int(42));
        assert_eq!(held.upgrade(), Some(Value::Int(42)));

        let held = WeakValue::hold(&Value::Null);
        assert_eq!(held.upgrade(), Some(Value::Null));
    }

    #[test]
    fn weak_value_object_dies_with_object() {
        let obj = TestObject::new("A");
        let held = WeakValue::hold(&Value::object(&obj));
        assert!(held.upgrade().is_some());

        drop(obj);
        assert!(held.upgrade().is_none());
    }

    #[test]
    fn display_for_formatting() {
        assert_eq!(Value::from("x").to_string(), "x");
        assert_eq!(Value::Int(5).to_string(), "5");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Unset.to_string(), "");
    }
}
