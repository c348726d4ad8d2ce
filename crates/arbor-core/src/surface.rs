//! The mutable UI surface that virtual trees are realized onto.
//!
//! A surface owns real nodes and hands out [`NodeId`] handles. The engine
//! only talks to it through [`Surface`], so a browser DOM binding, a
//! terminal backend and the in-memory [`MemorySurface`](crate::MemorySurface)
//! are interchangeable.

use std::rc::Rc;

use serde_json::Value;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    Missing { id: NodeId },
    TypeMismatch { id: NodeId, expected: &'static str },
    NotAChild { parent: NodeId, child: NodeId },
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeError::Missing { id } => write!(f, "node {id} missing"),
            NodeError::TypeMismatch { id, expected } => {
                write!(f, "node {id} type mismatch; expected {expected}")
            }
            NodeError::NotAChild { parent, child } => {
                write!(f, "node {child} is not a child of node {parent}")
            }
        }
    }
}

impl std::error::Error for NodeError {}

/// Flags a listener hands back to the surface after handling an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerResponse {
    pub stop_propagation: bool,
    pub prevent_default: bool,
}

/// A native event listener. Receives the raw event payload.
pub type Listener = Rc<dyn Fn(&Value) -> ListenerResponse>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// A passive listener promises never to prevent the default action.
    pub passive: bool,
}

/// Owned description of a single real node, used to adopt existing markup.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeView {
    Text(String),
    Element {
        tag: String,
        namespace: Option<String>,
        attributes: Vec<(String, String)>,
        namespaced_attributes: Vec<NamespacedAttribute>,
        styles: Vec<(String, String)>,
    },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacedAttribute {
    pub namespace: String,
    pub name: String,
    pub value: String,
}

pub trait Surface {
    fn create_text(&mut self, text: &str) -> NodeId;
    fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> NodeId;

    /// Frees a node and its whole subtree. The node must already be detached.
    fn remove_node(&mut self, id: NodeId) -> Result<(), NodeError>;

    fn parent(&self, id: NodeId) -> Result<Option<NodeId>, NodeError>;
    fn child_at(&self, id: NodeId, index: usize) -> Result<Option<NodeId>, NodeError>;
    fn children(&self, id: NodeId) -> Result<Vec<NodeId>, NodeError>;

    /// Inserts `child` before `before`, or at the end when `before` is `None`.
    /// A child that already has a parent is detached first.
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), NodeError>;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.insert_before(parent, child, None)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError>;
    fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId)
        -> Result<(), NodeError>;

    fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), NodeError>;

    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), NodeError>;
    fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), NodeError>;
    fn set_attribute_ns(
        &mut self,
        id: NodeId,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> Result<(), NodeError>;
    fn remove_attribute_ns(
        &mut self,
        id: NodeId,
        namespace: &str,
        name: &str,
    ) -> Result<(), NodeError>;

    /// Sets an inline style. An empty value removes it.
    fn set_style(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), NodeError>;

    fn property(&self, id: NodeId, name: &str) -> Result<Option<Value>, NodeError>;
    fn set_property(&mut self, id: NodeId, name: &str, value: Value) -> Result<(), NodeError>;

    fn add_listener(
        &mut self,
        id: NodeId,
        event: &str,
        listener: Listener,
        options: ListenerOptions,
    ) -> Result<(), NodeError>;
    fn remove_listener(&mut self, id: NodeId, event: &str) -> Result<(), NodeError>;

    fn describe(&self, id: NodeId) -> Result<NodeView, NodeError>;
}

/// Result of delivering one event through a surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub handled: usize,
    pub propagation_stopped: bool,
    pub default_prevented: bool,
}

/// Surfaces that can deliver native events to registered listeners.
pub trait EventSource {
    fn dispatch_event(
        &self,
        target: NodeId,
        event: &str,
        payload: &Value,
    ) -> Result<DispatchOutcome, NodeError>;
}
