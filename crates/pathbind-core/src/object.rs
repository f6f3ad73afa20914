#![forbid(unsafe_code)]

//! Capability model for host objects of unknown shape.
//!
//! A binding resolves against objects it has never seen before, so instead
//! of reflection the engine asks each object what it can do: a
//! [`DynObject`] advertises its [`Capabilities`] and hands out capability
//! views (`as_reflective`, `as_notifying`, ...), each defaulting to `None`.
//! Accessor plugins match on these views.
//!
//! # Invariants
//!
//! 1. A capability view, when present, stays present for the object's
//!    lifetime (capabilities are structural, not stateful).
//! 2. Capability methods never panic on bad input; member-access failures
//!    are reported as [`AccessError`] values.

use std::fmt;

use bitflags::bitflags;

use crate::signal::Signal;
use crate::value::{BindingError, ObjectRef, Value};

bitflags! {
    /// Capability set advertised by a [`DynObject`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        /// Named properties readable/writable by string name.
        const PROPERTIES = 1 << 0;
        /// Emits property-changed notifications.
        const NOTIFY = 1 << 1;
        /// Supports indexer-style access with argument lists.
        const INDEXED = 1 << 2;
        /// Dictionary-style access by string key.
        const KEYED = 1 << 3;
        /// Participates in a host hierarchy with ambient context.
        const TREE = 1 << 4;
        /// Publishes per-property validation errors.
        const VALIDATES = 1 << 5;
    }
}

/// A property-changed notification payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyChange {
    /// A named property changed.
    Named(String),
    /// Some indexer-shaped property changed.
    Indexed,
    /// Unspecified change; observers should re-read everything.
    All,
}

impl PropertyChange {
    /// Whether a notification concerns the named property.
    #[must_use]
    pub fn concerns(&self, property: &str) -> bool {
        match self {
            Self::Named(name) => name == property,
            Self::Indexed => false,
            Self::All => true,
        }
    }

    /// Whether a notification concerns indexer-shaped properties.
    #[must_use]
    pub fn concerns_index(&self) -> bool {
        matches!(self, Self::Indexed | Self::All)
    }
}

/// Member-access failure raised by a capability implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The named member does not exist on the source.
    NotFound {
        /// Source type label.
        type_name: String,
        /// The missing member.
        member: String,
    },
    /// The member exists but rejects writes.
    ReadOnly {
        /// The read-only member.
        member: String,
    },
    /// The argument or value shape does not fit the member.
    TypeMismatch {
        /// The member involved.
        member: String,
        /// What went wrong.
        detail: String,
    },
    /// An indexer argument is outside the source's range.
    OutOfBounds {
        /// What went wrong.
        detail: String,
    },
    /// The source is gone or was never set.
    NoSource,
    /// The operation is not supported by this accessor.
    NotSupported,
    /// Any other failure.
    Other(String),
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { type_name, member } => {
                write!(f, "member '{member}' not found on '{type_name}'")
            }
            Self::ReadOnly { member } => write!(f, "member '{member}' is read-only"),
            Self::TypeMismatch { member, detail } => {
                write!(f, "type mismatch on '{member}': {detail}")
            }
            Self::OutOfBounds { detail } => write!(f, "index out of bounds: {detail}"),
            Self::NoSource => write!(f, "no source"),
            Self::NotSupported => write!(f, "not supported"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for AccessError {}

impl From<AccessError> for BindingError {
    fn from(e: AccessError) -> Self {
        BindingError::resolution(e.to_string())
    }
}

/// A host object of unknown shape.
///
/// Implementations advertise capabilities and hand out views; every view
/// method defaults to `None` so an object implements only what it has.
pub trait DynObject: 'static {
    /// Type label used for diagnostics and ancestor matching.
    fn type_name(&self) -> &str;

    /// The capability set this object advertises.
    fn capabilities(&self) -> Capabilities;

    /// Named-property access, if supported.
    fn as_reflective(&self) -> Option<&dyn Reflective> {
        None
    }

    /// Property-changed notification, if supported.
    fn as_notifying(&self) -> Option<&dyn Notifying> {
        None
    }

    /// Indexer access, if supported.
    fn as_indexed(&self) -> Option<&dyn Indexed> {
        None
    }

    /// Dictionary access, if supported.
    fn as_keyed(&self) -> Option<&dyn Keyed> {
        None
    }

    /// Hierarchy participation, if supported.
    fn as_element(&self) -> Option<&dyn Element> {
        None
    }

    /// Validation-error notification, if supported.
    fn as_error_notifying(&self) -> Option<&dyn ErrorNotifying> {
        None
    }
}

/// Named-property access by string name.
pub trait Reflective {
    /// Read a property.
    fn get_property(&self, name: &str) -> Result<Value, AccessError>;

    /// Write a property.
    fn set_property(&self, name: &str, value: Value) -> Result<(), AccessError>;

    /// Whether the named property exists.
    fn has_property(&self, name: &str) -> bool;
}

/// Property-changed notification.
pub trait Notifying {
    /// The object's change signal.
    fn property_changed(&self) -> &Signal<PropertyChange>;
}

/// Indexer-style access with an argument list.
pub trait Indexed {
    /// Read the element addressed by `args`.
    fn get_index(&self, args: &[Value]) -> Result<Value, AccessError>;

    /// Write the element addressed by `args`.
    fn set_index(&self, args: &[Value], value: Value) -> Result<(), AccessError>;
}

/// Dictionary-style access by string key.
pub trait Keyed {
    /// Read the entry under `key`.
    fn get_key(&self, key: &str) -> Result<Value, AccessError>;

    /// Write the entry under `key`.
    fn set_key(&self, key: &str, value: Value) -> Result<(), AccessError>;

    /// Whether an entry exists under `key`.
    fn contains_key(&self, key: &str) -> bool;
}

/// Participation in a host hierarchy with an ambient data context.
pub trait Element {
    /// The parent element, if attached.
    fn parent(&self) -> Option<ObjectRef>;

    /// The ambient data context visible at this element.
    fn data_context(&self) -> Value;

    /// Fires with the new context whenever [`Element::data_context`] changes.
    fn data_context_changed(&self) -> &Signal<Value>;

    /// Fires whenever this element's parent link changes.
    fn parent_changed(&self) -> &Signal<()>;
}

/// Per-property validation errors.
pub trait ErrorNotifying {
    /// Current validation errors for `property` (empty when valid).
    fn errors_for(&self, property: &str) -> Vec<String>;

    /// Fires with the property name whenever its error set changes.
    fn errors_changed(&self) -> &Signal<String>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
