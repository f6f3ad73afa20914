#![forbid(unsafe_code)]

//! Core: values, signals, and object capabilities for pathbind.
//!
//! # Role in pathbind
//! `pathbind-core` is the host-facing layer. It defines the dynamic
//! [`Value`](value::Value) model a binding chain carries, the
//! change-notification primitives ([`Signal`](signal::Signal),
//! [`Subscription`](signal::Subscription)), the capability traits a host
//! object implements to become bindable, and the pluggable accessor layer
//! that reads, writes, and observes members on objects of unknown shape.
//!
//! # Primary responsibilities
//! - **Value model**: `Unset` sentinel, resolved `Null`, scalars, shared
//!   objects, and error-tagged values; weak holders with liveness queries.
//! - **Signals**: RAII-guarded publish/subscribe, plus `ValueCell` for
//!   observable binding roots.
//! - **Capabilities**: `DynObject` and its capability views, matched by
//!   accessor plugins instead of reflection.
//! - **Plugins**: ordered, first-match-wins adapter registry for named
//!   properties, indexers, and validation observation.
//!
//! # How it fits in the system
//! The runtime (`pathbind-runtime`) builds path-node chains on top of these
//! primitives; host applications implement the capability traits once per
//! object family and register custom adapters where the built-ins fall
//! short.

pub mod object;
pub mod plugins;
pub mod scope;
pub mod signal;
pub mod value;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testkit;

pub use object::{
    AccessError, Capabilities, DynObject, Element, ErrorNotifying, Indexed, Keyed, Notifying,
    PropertyChange, Reflective,
};
pub use plugins::{
    AccessorPlugin, AccessorRegistry, IndexerPlugin, PropertyAccessor, ValidationPlugin,
    ValidationSink, ValueObserver,
};
pub use scope::NameScope;
pub use signal::{Signal, Subscription, ValueCell};
pub use value::{BindingError, ErrorKind, ObjectRef, Value, WeakObject, WeakValue};
