#![forbid(unsafe_code)]

//! Path-segment descriptors and the node factory.
//!
//! A parser (external to this crate) turns a path expression into an
//! ordered [`PathSegment`] list; the factory maps each descriptor to one
//! node. The engine never re-parses text itself.

use std::rc::Rc;

use pathbind_core::plugins::AccessorRegistry;
use pathbind_core::scope::NameScope;
use pathbind_core::value::Value;

use crate::nodes::{
    AncestorNode, ContextNode, IndexNode, NamedNode, NegateNode, PathNode, PropertyNode,
    TransformNode,
};

/// One abstract step of a binding path, as produced by a parser.
#[derive(Clone)]
pub enum PathSegment {
    /// Read a named property.
    Property(String),
    /// Read an indexed element.
    Index(Vec<Value>),
    /// Read the ambient data context of an element.
    DataContext,
    /// Find a tree ancestor by optional type name, skipping `level`
    /// matches (0 selects the nearest).
    Ancestor {
        /// Required ancestor type name, or `None` for any.
        type_name: Option<String>,
        /// Number of matching ancestors to skip.
        level: usize,
    },
    /// Resolve a name against the binding's name scope.
    Named(String),
    /// Negate a boolean-interpretable value.
    Not,
    /// Apply a caller-supplied pure function.
    Transform(Rc<dyn Fn(&Value) -> Value>),
}

impl std::fmt::Debug for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Property(name) => write!(f, "Property({name})"),
            Self::Index(args) => write!(f, "Index({args:?})"),
            Self::DataContext => write!(f, "DataContext"),
            Self::Ancestor { type_name, level } => {
                write!(f, "Ancestor({type_name:?}, level {level})")
            }
            Self::Named(name) => write!(f, "Named({name})"),
            Self::Not => write!(f, "Not"),
            Self::Transform(_) => write!(f, "Transform(..)"),
        }
    }
}

impl PathSegment {
    /// Shorthand for a property segment.
    pub fn property(name: impl Into<String>) -> Self {
        Self::Property(name.into())
    }

    /// Shorthand for a single-integer index segment.
    #[must_use]
    pub fn index(index: i64) -> Self {
        Self::Index(vec![Value::Int(index)])
    }
}

/// Build one node per segment, in order.
///
/// # Panics
///
/// Panics when a [`PathSegment::Named`] segment appears without a name
/// scope — the binding cannot be constructed, a usage fault.
pub fn build_nodes(
    segments: &[PathSegment],
    registry: &Rc<AccessorRegistry>,
    name_scope: Option<&Rc<NameScope>>,
) -> Vec<Box<dyn PathNode>> {
    segments
        .iter()
        .map(|segment| build_node(segment, registry, name_scope))
        .collect()
}

pub(crate) fn build_node(
    segment: &PathSegment,
    registry: &Rc<AccessorRegistry>,
    name_scope: Option<&Rc<NameScope>>,
) -> Box<dyn PathNode> {
    match segment {
        PathSegment::Property(name) => {
            Box::new(PropertyNode::new(name.clone(), Rc::clone(registry)))
        }
        PathSegment::Index(args) => Box::new(IndexNode::new(args.clone(), Rc::clone(registry))),
        PathSegment::DataContext => Box::new(ContextNode::new()),
        PathSegment::Ancestor { type_name, level } => {
            Box::new(AncestorNode::new(type_name.clone(), *level))
        }
        PathSegment::Named(name) => {
            let scope = name_scope
                .expect("a named path segment requires a name scope on the binding");
            Box::new(NamedNode::new(scope, name.clone()))
        }
        PathSegment::Not => Box::new(NegateNode::new()),
        PathSegment::Transform(transform) => {
            Box::new(TransformNode::new(Rc::clone(transform)))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_one_node_per_segment() {
        let registry = Rc::new(AccessorRegistry::with_defaults());
        let segments = [
            PathSegment::property("Pet"),
            PathSegment::index(2),
            PathSegment::Not,
        ];
        let nodes = build_nodes(&segments, &registry, None);
        assert_eq!(nodes.len(), 3);
    }

    #[test]
    #[should_panic(expected = "requires a name scope")]
    fn named_segment_without_scope_is_a_usage_fault() {
        let registry = Rc::new(AccessorRegistry::with_defaults());
        let _ = build_nodes(&[PathSegment::Named("ok".into())], &registry, None);
    }

    #[test]
    fn debug_labels() {
        let segment = PathSegment::property("Name");
        assert_eq!(format!("{segment:?}"), "Property(Name)");
        let segment = PathSegment::Transform(Rc::new(|v: &Value| v.clone()));
        assert_eq!(format!("{segment:?}"), "Transform(..)");
    }
}
