//! Immutable virtual tree nodes.

use std::any::Any;
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use crate::event::Mapper;
use crate::facts::{Fact, Facts};
use crate::sanitize;
use crate::surface::{NodeError, NodeId, Surface};

/// A cheap, shared handle to one node of a virtual tree.
///
/// Two handles are "the same node" for the differ only when they point at the
/// same allocation, see [`VNode::ptr_eq`]. Cloning a handle never copies the
/// subtree.
pub struct VNode<M>(Rc<VNodeKind<M>>);

impl<M> Clone for VNode<M> {
    fn clone(&self) -> Self {
        VNode(Rc::clone(&self.0))
    }
}

pub enum VNodeKind<M> {
    Text(String),
    Element(ElementNode<M>),
    Keyed(KeyedNode<M>),
    Widget(WidgetNode<M>),
    Mapped(MappedNode<M>),
    Cached(CachedNode<M>),
}

pub struct ElementNode<M> {
    pub tag: String,
    pub namespace: Option<String>,
    pub facts: Facts<M>,
    pub children: Vec<VNode<M>>,
    pub descendants: usize,
}

pub struct KeyedNode<M> {
    pub tag: String,
    pub namespace: Option<String>,
    pub facts: Facts<M>,
    pub children: Vec<(String, VNode<M>)>,
    pub descendants: usize,
}

pub struct WidgetNode<M> {
    pub facts: Facts<M>,
    pub widget: Rc<dyn Widget>,
}

pub struct MappedNode<M> {
    pub mapper: Mapper<M>,
    pub child: VNode<M>,
    pub descendants: usize,
}

pub struct CachedNode<M> {
    pub identity: Vec<Rc<dyn CacheArg>>,
    thunk: Rc<dyn Fn() -> VNode<M>>,
    result: OnceCell<VNode<M>>,
}

/// Opaque data handed from [`Widget::diff`] to [`Widget::apply`].
pub struct WidgetPatch(pub Box<dyn Any>);

impl WidgetPatch {
    pub fn new<T: Any>(data: T) -> Self {
        WidgetPatch(Box::new(data))
    }

    pub fn downcast<T: Any>(self) -> Option<T> {
        self.0.downcast::<T>().ok().map(|data| *data)
    }
}

impl fmt::Debug for WidgetPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WidgetPatch(..)")
    }
}

/// A custom-rendered leaf that manages its own real node.
///
/// Two widgets are reconciled against each other only when they have the same
/// concrete type; otherwise the node is redrawn.
pub trait Widget: Any {
    fn realize(&self, surface: &mut dyn Surface) -> Result<NodeId, NodeError>;

    /// Returns the change needed to go from `previous` to `self`, if any.
    /// `previous` is always of the same concrete type as `self`.
    fn diff(&self, previous: &dyn Widget) -> Option<WidgetPatch>;

    /// Applies a patch produced by [`Widget::diff`]. Returns the node that now
    /// represents the widget, which may differ from `node`.
    fn apply(
        &self,
        surface: &mut dyn Surface,
        node: NodeId,
        patch: WidgetPatch,
    ) -> Result<NodeId, NodeError>;

    fn as_any(&self) -> &dyn Any;
}

/// One input of a cached subtree. Compared by value.
pub trait CacheArg: Any {
    fn same_as(&self, other: &dyn CacheArg) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: PartialEq + 'static> CacheArg for T {
    fn same_as(&self, other: &dyn CacheArg) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<M> CachedNode<M> {
    /// Evaluates the thunk on first use and returns the memoized tree.
    pub fn force(&self) -> &VNode<M> {
        self.result.get_or_init(|| (self.thunk)())
    }

    pub fn is_forced(&self) -> bool {
        self.result.get().is_some()
    }

    pub fn same_identity(&self, other: &CachedNode<M>) -> bool {
        self.identity.len() == other.identity.len()
            && self
                .identity
                .iter()
                .zip(&other.identity)
                .all(|(a, b)| (**a).same_as(&**b))
    }

    pub(crate) fn result(&self) -> Option<&VNode<M>> {
        self.result.get()
    }

    /// Seeds the memo slot with a tree forced earlier. Does nothing if this
    /// node was already forced.
    pub(crate) fn adopt(&self, tree: &VNode<M>) {
        let _ = self.result.set(tree.clone());
    }
}

fn fn_identity(address: usize) -> Rc<dyn CacheArg> {
    Rc::new(address)
}

fn arg<T: PartialEq + 'static>(value: &Rc<T>) -> Rc<dyn CacheArg> {
    value.clone()
}

fn descendants_of<'a, M: 'a>(children: impl Iterator<Item = &'a VNode<M>>) -> usize {
    children.map(|child| child.descendants() + 1).sum()
}

impl<M> VNode<M> {
    pub fn kind(&self) -> &VNodeKind<M> {
        &self.0
    }

    pub fn ptr_eq(&self, other: &VNode<M>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of nodes below this one, as addressed by patch indices.
    pub fn descendants(&self) -> usize {
        match self.kind() {
            VNodeKind::Element(node) => node.descendants,
            VNodeKind::Keyed(node) => node.descendants,
            VNodeKind::Mapped(node) => node.descendants,
            VNodeKind::Text(_) | VNodeKind::Widget(_) | VNodeKind::Cached(_) => 0,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        VNode(Rc::new(VNodeKind::Text(content.into())))
    }

    pub fn element(tag: &str, facts: Vec<Fact<M>>, children: Vec<VNode<M>>) -> Self {
        Self::build_element(tag, None, facts, children)
    }

    pub fn element_ns(
        namespace: &str,
        tag: &str,
        facts: Vec<Fact<M>>,
        children: Vec<VNode<M>>,
    ) -> Self {
        Self::build_element(tag, Some(namespace.to_owned()), facts, children)
    }

    fn build_element(
        tag: &str,
        namespace: Option<String>,
        facts: Vec<Fact<M>>,
        children: Vec<VNode<M>>,
    ) -> Self {
        let descendants = descendants_of(children.iter());
        VNode(Rc::new(VNodeKind::Element(ElementNode {
            tag: sanitize::no_script(tag).to_owned(),
            namespace,
            facts: Facts::from_declarations(facts),
            children,
            descendants,
        })))
    }

    pub fn keyed(tag: &str, facts: Vec<Fact<M>>, children: Vec<(String, VNode<M>)>) -> Self {
        Self::build_keyed(tag, None, facts, children)
    }

    pub fn keyed_ns(
        namespace: &str,
        tag: &str,
        facts: Vec<Fact<M>>,
        children: Vec<(String, VNode<M>)>,
    ) -> Self {
        Self::build_keyed(tag, Some(namespace.to_owned()), facts, children)
    }

    fn build_keyed(
        tag: &str,
        namespace: Option<String>,
        facts: Vec<Fact<M>>,
        children: Vec<(String, VNode<M>)>,
    ) -> Self {
        let descendants = descendants_of(children.iter().map(|(_, child)| child));
        VNode(Rc::new(VNodeKind::Keyed(KeyedNode {
            tag: sanitize::no_script(tag).to_owned(),
            namespace,
            facts: Facts::from_declarations(facts),
            children,
            descendants,
        })))
    }

    pub fn widget(facts: Vec<Fact<M>>, widget: impl Widget) -> Self {
        VNode(Rc::new(VNodeKind::Widget(WidgetNode {
            facts: Facts::from_declarations(facts),
            widget: Rc::new(widget),
        })))
    }

    /// Wraps this subtree so that every message it produces is passed
    /// through `mapper` on its way to the dispatcher.
    pub fn map(self, mapper: Mapper<M>) -> Self {
        let descendants = self.descendants() + 1;
        VNode(Rc::new(VNodeKind::Mapped(MappedNode {
            mapper,
            child: self,
            descendants,
        })))
    }

    pub fn cached(
        identity: Vec<Rc<dyn CacheArg>>,
        thunk: impl Fn() -> VNode<M> + 'static,
    ) -> Self {
        VNode(Rc::new(VNodeKind::Cached(CachedNode {
            identity,
            thunk: Rc::new(thunk),
            result: OnceCell::new(),
        })))
    }
}

impl<M: 'static> VNode<M> {
    /// A subtree rebuilt only when `view` or `a` change.
    pub fn lazy<A>(view: fn(&A) -> VNode<M>, a: A) -> Self
    where
        A: PartialEq + 'static,
    {
        let a = Rc::new(a);
        let identity = vec![fn_identity(view as usize), arg(&a)];
        Self::cached(identity, move || view(&a))
    }

    pub fn lazy2<A, B>(view: fn(&A, &B) -> VNode<M>, a: A, b: B) -> Self
    where
        A: PartialEq + 'static,
        B: PartialEq + 'static,
    {
        let (a, b) = (Rc::new(a), Rc::new(b));
        let identity = vec![fn_identity(view as usize), arg(&a), arg(&b)];
        Self::cached(identity, move || view(&a, &b))
    }

    pub fn lazy3<A, B, C>(view: fn(&A, &B, &C) -> VNode<M>, a: A, b: B, c: C) -> Self
    where
        A: PartialEq + 'static,
        B: PartialEq + 'static,
        C: PartialEq + 'static,
    {
        let (a, b, c) = (Rc::new(a), Rc::new(b), Rc::new(c));
        let identity = vec![fn_identity(view as usize), arg(&a), arg(&b), arg(&c)];
        Self::cached(identity, move || view(&a, &b, &c))
    }
}

impl<M> fmt::Debug for VNode<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            VNodeKind::Text(text) => write!(f, "Text({text:?})"),
            VNodeKind::Element(node) => f
                .debug_struct("Element")
                .field("tag", &node.tag)
                .field("namespace", &node.namespace)
                .field("facts", &node.facts)
                .field("children", &node.children)
                .finish(),
            VNodeKind::Keyed(node) => f
                .debug_struct("Keyed")
                .field("tag", &node.tag)
                .field("namespace", &node.namespace)
                .field("facts", &node.facts)
                .field("children", &node.children)
                .finish(),
            VNodeKind::Widget(node) => f
                .debug_struct("Widget")
                .field("facts", &node.facts)
                .finish_non_exhaustive(),
            VNodeKind::Mapped(node) => f.debug_tuple("Mapped").field(&node.child).finish(),
            VNodeKind::Cached(node) => match node.result() {
                Some(tree) => f.debug_tuple("Cached").field(tree).finish(),
                None => f.write_str("Cached(<unforced>)"),
            },
        }
    }
}

#[cfg(test)]
#[path = "tests/vnode_tests.rs"]
mod tests;
