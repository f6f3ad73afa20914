#![forbid(unsafe_code)]

//! Incremental property-path binding for live object graphs.
//!
//! `pathbind` resolves a dotted/indexed path expression (for example
//! `Pet.Name` or `Items[2]`) against objects whose shape is discovered at
//! binding time, keeps the resolved value continuously up to date as any
//! link in the chain changes, and supports writing a new value back
//! through the chain. Observed objects are held weakly throughout: a
//! binding is never the reason a host object stays alive.
//!
//! # Quick start
//!
//! ```ignore
//! use pathbind::{BindingBuilder, PathSegment, Value};
//! use pathbind_core::testkit::TestObject;
//!
//! let pet = TestObject::new("Dog");
//! pet.insert("Name", "Fido");
//! let owner = TestObject::new("Person");
//! owner.insert("Pet", Value::object(&pet));
//!
//! let session = BindingBuilder::for_root(Value::object(&owner))
//!     .path([PathSegment::property("Pet"), PathSegment::property("Name")])
//!     .finish();
//!
//! let _handle = session.subscribe(|value| println!("published {value:?}"));
//! pet.set("Name", "Rover"); // publishes "Rover"
//! ```
//!
//! The facade re-exports the full public API of `pathbind-core` (values,
//! signals, capability traits, accessor plugins) and `pathbind-runtime`
//! (nodes, sessions, conversion policy).

pub use pathbind_core::{
    AccessError, AccessorPlugin, AccessorRegistry, BindingError, Capabilities, DynObject, Element,
    ErrorKind, ErrorNotifying, Indexed, IndexerPlugin, Keyed, NameScope, Notifying, ObjectRef,
    PropertyAccessor, PropertyChange, Reflective, Signal, Subscription, ValidationPlugin,
    ValidationSink, Value, ValueCell, ValueObserver, WeakObject, WeakValue,
};
pub use pathbind_runtime::{
    AncestorNode, BindingBuilder, BindingHandle, BindingSession, ContextNode, Converted,
    ConvertPolicy, IndexNode, NamedNode, NegateNode, NodeCore, PathNode, PathSegment, Published,
    PropertyNode, TargetShape, TransformNode, ValidationTarget, ValueConverter, build_nodes,
    coerce, format_text,
};

/// The commonly-used subset, for glob imports.
pub mod prelude {
    pub use crate::{
        BindingBuilder, BindingHandle, BindingSession, NameScope, PathSegment, TargetShape, Value,
        ValueCell,
    };
}
