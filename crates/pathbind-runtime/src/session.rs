#![forbid(unsafe_code)]

//! Binding sessions: chain lifecycle, propagation, publish, and write-back.
//!
//! # Design
//!
//! A [`BindingSession`] owns an ordered node chain, a root source (a
//! weakly-held value or an observable [`ValueCell`] stream), an output
//! [`ConvertPolicy`], and at most one subscriber. The session moves
//! through `Created → Started → Stopped`; `Stopped` is terminal, and a new
//! session must be built to bind again.
//!
//! Propagation is synchronous and depth-first: when node *i* reports a new
//! value, the session either feeds node *i + 1* or — for the terminal
//! node — runs the publish pipeline. A single upstream change therefore
//! cascades through the remaining chain and produces at most one publish
//! before control returns to the notifier.
//!
//! # Invariants
//!
//! 1. Exactly one subscriber; a second subscribe, or a subscribe after
//!    stop, is a usage fault and panics.
//! 2. Stop is idempotent and safe reentrantly from inside a change
//!    notification. The subscriber is cleared before nodes reset, so
//!    teardown cascades cannot publish.
//! 3. After stop, every node has released its observation hooks; no
//!    observed source retains a subscription originating from this
//!    session.
//! 4. The subscriber never receives the unresolved sentinel: `Unset`
//!    becomes the configured fallback, or `Null` without one.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Resolution fault mid-chain | Error-tagged value published once |
//! | Write to an empty chain | `set_value` returns `false` |
//! | Write fault | `false`; surfaced as a validation error value when validation is enabled |
//! | Dead weak root at start | Chain seeded with `Null` |

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use pathbind_core::object::AccessError;
use pathbind_core::plugins::{AccessorRegistry, ValidationSink};
use pathbind_core::scope::NameScope;
use pathbind_core::signal::{Subscription, ValueCell};
use pathbind_core::value::{BindingError, Value, WeakValue};
use tracing::{debug, trace};

use crate::convert::{ConvertPolicy, Published, TargetShape, ValueConverter};
use crate::nodes::{PathNode, bind_owner};
use crate::segment::{PathSegment, build_node};

/// Where the chain's first node gets its source.
enum RootSource {
    /// A weakly-held root value.
    Value(WeakValue),
    /// An observable stream of root values; the session owns the
    /// subscription, not the streamed objects.
    Stream(ValueCell),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Created,
    Started,
    Stopped,
}

pub(crate) struct SessionCore {
    this: RefCell<Weak<SessionCore>>,
    root: RootSource,
    nodes: Vec<Box<dyn PathNode>>,
    policy: ConvertPolicy,
    registry: Rc<AccessorRegistry>,
    validate: bool,
    state: Cell<SessionState>,
    subscriber: RefCell<Option<Rc<dyn Fn(&Value)>>>,
    root_subscription: RefCell<Option<Subscription>>,
    validation: RefCell<Option<Subscription>>,
}

impl SessionCore {
    /// Called by a node in this session's chain when its value changes.
    pub(crate) fn on_node_value_changed(&self, index: usize, value: Value) {
        if self.state.get() != SessionState::Started {
            return;
        }
        if index + 1 == self.nodes.len() {
            self.publish();
        } else {
            self.nodes[index + 1].set_source(value);
        }
    }

    fn start(&self) {
        self.state.set(SessionState::Started);
        debug!(nodes = self.nodes.len(), "binding session started");

        match &self.root {
            RootSource::Stream(cell) => {
                let weak = self.this.borrow().clone();
                let subscription = cell.changes().subscribe(move |value: &Value| {
                    if let Some(session) = weak.upgrade() {
                        session.on_root_changed(value);
                    }
                });
                *self.root_subscription.borrow_mut() = Some(subscription);
                self.on_root_changed(&cell.get());
            }
            RootSource::Value(weak_value) => {
                let root = weak_value.upgrade().unwrap_or(Value::Null);
                self.on_root_changed(&root);
            }
        }
    }

    fn on_root_changed(&self, root: &Value) {
        if self.state.get() != SessionState::Started {
            return;
        }
        trace!(root = ?root, "root source changed");
        if self.nodes.is_empty() {
            self.publish_pipeline(root.clone());
        } else {
            self.nodes[0].set_source(root.clone());
        }
    }

    pub(crate) fn stop(&self) {
        if self.state.get() == SessionState::Stopped {
            return;
        }
        let was_started = self.state.get() == SessionState::Started;
        self.state.set(SessionState::Stopped);

        // Clear the subscriber before resetting nodes: teardown must not
        // publish.
        self.subscriber.borrow_mut().take();
        self.root_subscription.borrow_mut().take();
        self.validation.borrow_mut().take();

        if was_started {
            for node in &self.nodes {
                node.reset();
            }
        }
        debug!("binding session stopped");
    }

    fn publish(&self) {
        let raw = match self.nodes.last() {
            Some(node) => node.value(),
            None => Value::Null,
        };
        self.publish_pipeline(raw);
    }

    fn publish_pipeline(&self, raw: Value) {
        if self.state.get() != SessionState::Started {
            return;
        }
        let Some(published) = self.policy.apply(raw) else {
            trace!("publish suppressed by converter");
            return;
        };
        trace!(value = ?published.value, "publishing");
        self.emit(&published.value);

        // The subscriber may have stopped us from inside the emission.
        if self.state.get() == SessionState::Started {
            self.refresh_validation(&published);
        }
    }

    fn emit(&self, value: &Value) {
        let observer = self.subscriber.borrow().clone();
        if let Some(observer) = observer {
            observer(value);
        }
    }

    fn refresh_validation(&self, published: &Published) {
        // Detach the previous observer first; it may watch a stale target.
        self.validation.borrow_mut().take();
        if !self.validate || !published.plain {
            return;
        }
        let Some(terminal) = self.nodes.last() else {
            return;
        };
        let Some(target) = terminal.validation_target() else {
            return;
        };
        let Some(source) = target.source.upgrade() else {
            return;
        };
        let Some(plugin) = self
            .registry
            .find_validation_plugin(&source, &target.property)
        else {
            return;
        };

        let weak = self.this.borrow().clone();
        let sink: ValidationSink = Rc::new(move |error: BindingError| {
            if let Some(session) = weak.upgrade() {
                session.emit(&Value::Error(error));
            }
        });
        if let Some(subscription) = plugin.start(&target.source, &target.property, sink) {
            *self.validation.borrow_mut() = Some(subscription);
        }
    }

    pub(crate) fn set_value(&self, value: Value) -> bool {
        let Some(terminal) = self.nodes.last() else {
            return false;
        };
        match terminal.write_value(value) {
            Ok(()) => true,
            Err(AccessError::NotSupported | AccessError::NoSource) => false,
            Err(error) => {
                debug!(%error, "write through binding failed");
                if self.validate {
                    self.emit(&Value::Error(BindingError::validation(error.to_string())));
                }
                false
            }
        }
    }
}

/// One item of a chain under construction.
enum ChainItem {
    Segment(PathSegment),
    Node(Box<dyn PathNode>),
}

/// Builder assembling a [`BindingSession`].
pub struct BindingBuilder {
    root: RootSource,
    items: Vec<ChainItem>,
    registry: Rc<AccessorRegistry>,
    name_scope: Option<Rc<NameScope>>,
    converter: Option<Rc<dyn ValueConverter>>,
    parameter: Option<Value>,
    fallback: Option<Value>,
    target: TargetShape,
    format: Option<String>,
    validate: bool,
}

impl BindingBuilder {
    /// Bind against a root value, held weakly.
    pub fn for_root(root: impl Into<Value>) -> Self {
        Self::with_root(RootSource::Value(WeakValue::hold(&root.into())))
    }

    /// Bind against an observable stream of root values. The session owns
    /// the stream subscription; the streamed objects stay weakly observed.
    #[must_use]
    pub fn for_stream(cell: &ValueCell) -> Self {
        Self::with_root(RootSource::Stream(cell.clone()))
    }

    fn with_root(root: RootSource) -> Self {
        Self {
            root,
            items: Vec::new(),
            registry: Rc::new(AccessorRegistry::with_defaults()),
            name_scope: None,
            converter: None,
            parameter: None,
            fallback: None,
            target: TargetShape::Any,
            format: None,
            validate: false,
        }
    }

    /// Append path segments, resolved to nodes when the session is built.
    #[must_use]
    pub fn path(mut self, segments: impl IntoIterator<Item = PathSegment>) -> Self {
        self.items
            .extend(segments.into_iter().map(ChainItem::Segment));
        self
    }

    /// Append a single path segment.
    #[must_use]
    pub fn segment(mut self, segment: PathSegment) -> Self {
        self.items.push(ChainItem::Segment(segment));
        self
    }

    /// Append a pre-built node (custom variants included).
    #[must_use]
    pub fn node(mut self, node: Box<dyn PathNode>) -> Self {
        self.items.push(ChainItem::Node(node));
        self
    }

    /// Use a custom accessor registry instead of the built-in defaults.
    #[must_use]
    pub fn registry(mut self, registry: Rc<AccessorRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Provide the name scope consulted by named segments.
    #[must_use]
    pub fn name_scope(mut self, scope: &Rc<NameScope>) -> Self {
        self.name_scope = Some(Rc::clone(scope));
        self
    }

    /// Apply a value converter before coercion.
    #[must_use]
    pub fn converter(mut self, converter: Rc<dyn ValueConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Opaque parameter handed to the converter.
    #[must_use]
    pub fn converter_parameter(mut self, parameter: impl Into<Value>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    /// Publish this value when resolution yields nothing.
    #[must_use]
    pub fn fallback(mut self, fallback: impl Into<Value>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// Coerce published values to this shape.
    #[must_use]
    pub fn target(mut self, target: TargetShape) -> Self {
        self.target = target;
        self
    }

    /// Apply a `{}` template to textual publishes.
    #[must_use]
    pub fn format(mut self, template: impl Into<String>) -> Self {
        self.format = Some(template.into());
        self
    }

    /// Observe validation state of the written member and surface write
    /// faults through the publish channel.
    #[must_use]
    pub fn validate(mut self, enable: bool) -> Self {
        self.validate = enable;
        self
    }

    /// Assemble the session. Each node is assigned its chain position and
    /// owner exactly once; reusing a node across two sessions panics.
    pub fn finish(self) -> BindingSession {
        let Self {
            root,
            items,
            registry,
            name_scope,
            converter,
            parameter,
            fallback,
            target,
            format,
            validate,
        } = self;

        let nodes: Vec<Box<dyn PathNode>> = items
            .into_iter()
            .map(|item| match item {
                ChainItem::Segment(segment) => {
                    build_node(&segment, &registry, name_scope.as_ref())
                }
                ChainItem::Node(node) => node,
            })
            .collect();

        let core = Rc::new(SessionCore {
            this: RefCell::new(Weak::new()),
            root,
            nodes,
            policy: ConvertPolicy {
                converter,
                parameter,
                fallback,
                target,
                format,
            },
            registry,
            validate,
            state: Cell::new(SessionState::Created),
            subscriber: RefCell::new(None),
            root_subscription: RefCell::new(None),
            validation: RefCell::new(None),
        });
        *core.this.borrow_mut() = Rc::downgrade(&core);

        for (index, node) in core.nodes.iter().enumerate() {
            bind_owner(node.as_ref(), &core, index);
        }

        BindingSession { core }
    }
}

impl std::fmt::Debug for BindingBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingBuilder")
            .field("segments", &self.items.len())
            .field("validate", &self.validate)
            .finish()
    }
}

/// A bound path expression serving one subscriber.
pub struct BindingSession {
    core: Rc<SessionCore>,
}

impl BindingSession {
    /// Attach the session's single subscriber and start resolution. The
    /// current value is published synchronously before this returns.
    ///
    /// # Panics
    ///
    /// Panics when the session is already serving a subscriber or has been
    /// stopped — both usage faults.
    pub fn subscribe(&self, observer: impl Fn(&Value) + 'static) -> BindingHandle {
        match self.core.state.get() {
            SessionState::Created => {}
            SessionState::Started => {
                panic!("a binding session serves exactly one subscriber")
            }
            SessionState::Stopped => {
                panic!("a stopped binding session cannot be restarted")
            }
        }

        *self.core.subscriber.borrow_mut() = Some(Rc::new(observer));
        self.core.start();
        BindingHandle {
            core: Rc::clone(&self.core),
        }
    }

    /// Write `value` back through the chain's terminal node. Returns
    /// whether the write succeeded; an empty or broken chain writes
    /// nothing and returns `false`.
    pub fn set_value(&self, value: impl Into<Value>) -> bool {
        self.core.set_value(value.into())
    }

    /// Stop the session, releasing every observation hook. Idempotent.
    pub fn stop(&self) {
        self.core.stop();
    }

    /// Whether the session has been stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.core.state.get() == SessionState::Stopped
    }
}

impl std::fmt::Debug for BindingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingSession")
            .field("nodes", &self.core.nodes.len())
            .field("state", &self.core.state.get())
            .finish()
    }
}

/// Disposable returned by [`BindingSession::subscribe`]; dropping it stops
/// the session.
pub struct BindingHandle {
    core: Rc<SessionCore>,
}

impl BindingHandle {
    /// Stop the session now. Equivalent to dropping the handle.
    pub fn stop(&self) {
        self.core.stop();
    }
}

impl Drop for BindingHandle {
    fn drop(&mut self) {
        self.core.stop();
    }
}

impl std::fmt::Debug for BindingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingHandle")
            .field("state", &self.core.state.get())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
