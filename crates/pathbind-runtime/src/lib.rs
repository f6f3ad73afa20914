#![forbid(unsafe_code)]

//! Runtime: path-node chains, propagation, and binding sessions.
//!
//! # Role in pathbind
//! `pathbind-runtime` turns an ordered list of path-segment descriptors
//! into a live chain of nodes that tracks a dotted/indexed path expression
//! through an object graph, keeps the resolved value up to date as any
//! link changes, and writes new values back through the chain.
//!
//! # Primary responsibilities
//! - **Nodes**: one resolved segment each — property, indexer, ambient
//!   context, tree ancestor, named element, negation, transform.
//! - **Session**: lifecycle (`Created → Started → Stopped`), synchronous
//!   depth-first propagation with at most one publish per upstream change,
//!   the output conversion pipeline, and the `set_value` write path.
//! - **Conversion**: value converters (with publish suppression), fallback
//!   substitution, target-shape coercion, and string formatting.
//!
//! # How it fits in the system
//! A parser (external) produces [`PathSegment`](segment::PathSegment)
//! lists; host objects implement the `pathbind-core` capability traits.
//! This crate wires the two together and exposes a push-style
//! single-subscriber value stream to the host.

pub mod convert;
pub mod nodes;
pub mod segment;
pub mod session;

pub use convert::{Converted, ConvertPolicy, Published, TargetShape, ValueConverter, coerce, format_text};
pub use nodes::{
    AncestorNode, ContextNode, IndexNode, NamedNode, NegateNode, NodeCore, PathNode, PropertyNode,
    TransformNode, ValidationTarget,
};
pub use segment::{PathSegment, build_nodes};
pub use session::{BindingBuilder, BindingHandle, BindingSession};
