use std::cell::{Cell, RefCell};
use std::rc::Rc;

use arbor_core::{
    diff, DispatchOutcome, Dispatcher, EventSource, Listener, ListenerOptions, MemorySurface,
    NodeError, NodeId, NodeView, Surface, VNode, VirtualDom,
};
use serde_json::Value;

/// Collects every message the engine dispatches, with its synchronous flag.
pub struct Recorder<M> {
    log: Rc<RefCell<Vec<(M, bool)>>>,
}

impl<M: 'static> Recorder<M> {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn dispatcher(&self) -> Dispatcher<M> {
        let log = Rc::clone(&self.log);
        Rc::new(move |message: M, synchronous: bool| log.borrow_mut().push((message, synchronous)))
    }

    /// Drains the recorded messages.
    pub fn take(&self) -> Vec<(M, bool)> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<M: Clone + 'static> Recorder<M> {
    pub fn messages(&self) -> Vec<M> {
        self.log
            .borrow()
            .iter()
            .map(|(message, _)| message.clone())
            .collect()
    }
}

impl<M: 'static> Default for Recorder<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Headless harness that keeps one virtual tree rendered on a
/// [`MemorySurface`] and moves it forward by diffing and patching.
pub struct ReconcileTestRule<M> {
    surface: MemorySurface,
    dom: VirtualDom<M>,
    recorder: Recorder<M>,
    current: Option<(VNode<M>, NodeId)>,
}

impl<M: 'static> ReconcileTestRule<M> {
    pub fn new() -> Self {
        let recorder = Recorder::new();
        Self {
            surface: MemorySurface::new(),
            dom: VirtualDom::new(recorder.dispatcher()),
            recorder,
            current: None,
        }
    }

    /// Render `tree` from scratch, discarding whatever was shown before.
    pub fn set_content(&mut self, tree: VNode<M>) -> Result<NodeId, NodeError> {
        self.surface = MemorySurface::new();
        let root = self.dom.render(&mut self.surface, &tree)?;
        self.current = Some((tree, root));
        Ok(root)
    }

    /// Diff the shown tree against `tree` and patch the surface. Renders
    /// from scratch when nothing is shown yet.
    pub fn update(&mut self, tree: VNode<M>) -> Result<NodeId, NodeError> {
        let Some((old, root)) = self.current.take() else {
            return self.set_content(tree);
        };
        let patches = diff(&old, &tree);
        let root = self.dom.patch(&mut self.surface, root, &old, patches)?;
        self.current = Some((tree, root));
        Ok(root)
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.current.as_ref().map(|(_, root)| *root)
    }

    pub fn tree(&self) -> Option<&VNode<M>> {
        self.current.as_ref().map(|(tree, _)| tree)
    }

    pub fn surface(&self) -> &MemorySurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut MemorySurface {
        &mut self.surface
    }

    pub fn dom(&self) -> &VirtualDom<M> {
        &self.dom
    }

    pub fn recorder(&self) -> &Recorder<M> {
        &self.recorder
    }

    pub fn dump(&self) -> String {
        self.surface.dump_tree(self.root_id())
    }

    /// Deliver an event to the real node reached by following `path` of
    /// child positions from the root.
    pub fn fire(
        &self,
        path: &[usize],
        event: &str,
        payload: &Value,
    ) -> Result<DispatchOutcome, NodeError> {
        let target = self.node_at(path)?;
        self.surface.dispatch_event(target, event, payload)
    }

    pub fn node_at(&self, path: &[usize]) -> Result<NodeId, NodeError> {
        let Some(mut node) = self.root_id() else {
            return Err(NodeError::Missing { id: 0 });
        };
        for &position in path {
            node = self
                .surface
                .child_at(node, position)?
                .ok_or(NodeError::Missing { id: node })?;
        }
        Ok(node)
    }
}

impl<M: 'static> Default for ReconcileTestRule<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `ReconcileTestRule`.
pub fn run_test_reconcile<M: 'static, R>(f: impl FnOnce(&mut ReconcileTestRule<M>) -> R) -> R {
    let mut rule = ReconcileTestRule::new();
    f(&mut rule)
}

/// Renders `tree` onto a fresh surface and returns its text dump.
pub fn render_to_string<M: 'static>(tree: &VNode<M>) -> String {
    let mut surface = MemorySurface::new();
    let dispatcher: Dispatcher<M> = Rc::new(|_: M, _: bool| {});
    let mut dom = VirtualDom::new(dispatcher);
    match dom.render(&mut surface, tree) {
        Ok(root) => surface.dump_tree(Some(root)),
        Err(err) => panic!("render failed: {err}"),
    }
}

/// Asserts that patching a rendering of `old` with `diff(old, new)` yields
/// the same tree as rendering `new` directly.
pub fn assert_confluent<M: 'static>(old: &VNode<M>, new: &VNode<M>) {
    let mut surface = MemorySurface::new();
    let dispatcher: Dispatcher<M> = Rc::new(|_: M, _: bool| {});
    let mut dom = VirtualDom::new(dispatcher);
    let root = match dom.render(&mut surface, old) {
        Ok(root) => root,
        Err(err) => panic!("render of old tree failed: {err}"),
    };
    let patches = diff(old, new);
    log::trace!("confluence check with {} top-level patches", patches.len());
    let root = match dom.patch(&mut surface, root, old, patches) {
        Ok(root) => root,
        Err(err) => panic!("patch failed: {err}"),
    };
    let patched = surface.dump_tree(Some(root));
    let expected = render_to_string(new);
    assert_eq!(
        patched, expected,
        "patched tree differs from a fresh render of the new tree"
    );
}

/// A [`MemorySurface`] that records which nodes the engine visits and
/// which properties it writes.
#[derive(Default)]
pub struct CountingSurface {
    inner: MemorySurface,
    child_lookups: Cell<usize>,
    visited: RefCell<Vec<NodeId>>,
    property_writes: RefCell<Vec<(NodeId, String)>>,
}

impl CountingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemorySurface {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut MemorySurface {
        &mut self.inner
    }

    pub fn child_lookups(&self) -> usize {
        self.child_lookups.get()
    }

    /// Parents whose children were looked up, in order.
    pub fn visited(&self) -> Vec<NodeId> {
        self.visited.borrow().clone()
    }

    pub fn property_writes(&self) -> Vec<(NodeId, String)> {
        self.property_writes.borrow().clone()
    }

    pub fn reset_counters(&self) {
        self.child_lookups.set(0);
        self.visited.borrow_mut().clear();
        self.property_writes.borrow_mut().clear();
    }
}

impl Surface for CountingSurface {
    fn create_text(&mut self, text: &str) -> NodeId {
        self.inner.create_text(text)
    }

    fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> NodeId {
        self.inner.create_element(tag, namespace)
    }

    fn remove_node(&mut self, id: NodeId) -> Result<(), NodeError> {
        self.inner.remove_node(id)
    }

    fn parent(&self, id: NodeId) -> Result<Option<NodeId>, NodeError> {
        self.inner.parent(id)
    }

    fn child_at(&self, id: NodeId, index: usize) -> Result<Option<NodeId>, NodeError> {
        self.child_lookups.set(self.child_lookups.get() + 1);
        self.visited.borrow_mut().push(id);
        self.inner.child_at(id, index)
    }

    fn children(&self, id: NodeId) -> Result<Vec<NodeId>, NodeError> {
        self.inner.children(id)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), NodeError> {
        self.inner.insert_before(parent, child, before)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.inner.remove_child(parent, child)
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new: NodeId,
        old: NodeId,
    ) -> Result<(), NodeError> {
        self.inner.replace_child(parent, new, old)
    }

    fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), NodeError> {
        self.inner.set_text(id, text)
    }

    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), NodeError> {
        self.inner.set_attribute(id, name, value)
    }

    fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), NodeError> {
        self.inner.remove_attribute(id, name)
    }

    fn set_attribute_ns(
        &mut self,
        id: NodeId,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> Result<(), NodeError> {
        self.inner.set_attribute_ns(id, namespace, name, value)
    }

    fn remove_attribute_ns(
        &mut self,
        id: NodeId,
        namespace: &str,
        name: &str,
    ) -> Result<(), NodeError> {
        self.inner.remove_attribute_ns(id, namespace, name)
    }

    fn set_style(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), NodeError> {
        self.inner.set_style(id, name, value)
    }

    fn property(&self, id: NodeId, name: &str) -> Result<Option<Value>, NodeError> {
        self.inner.property(id, name)
    }

    fn set_property(&mut self, id: NodeId, name: &str, value: Value) -> Result<(), NodeError> {
        self.property_writes.borrow_mut().push((id, name.to_owned()));
        self.inner.set_property(id, name, value)
    }

    fn add_listener(
        &mut self,
        id: NodeId,
        event: &str,
        listener: Listener,
        options: ListenerOptions,
    ) -> Result<(), NodeError> {
        self.inner.add_listener(id, event, listener, options)
    }

    fn remove_listener(&mut self, id: NodeId, event: &str) -> Result<(), NodeError> {
        self.inner.remove_listener(id, event)
    }

    fn describe(&self, id: NodeId) -> Result<NodeView, NodeError> {
        self.inner.describe(id)
    }
}

impl EventSource for CountingSurface {
    fn dispatch_event(
        &self,
        target: NodeId,
        event: &str,
        payload: &Value,
    ) -> Result<DispatchOutcome, NodeError> {
        self.inner.dispatch_event(target, event, payload)
    }
}

/// An element with `count` text children.
pub fn wide_subtree<M>(tag: &str, count: usize) -> VNode<M> {
    let children = (0..count)
        .map(|i| VNode::text(format!("item {i}")))
        .collect();
    VNode::element(tag, Vec::new(), children)
}

/// `depth` nested `div`s around `leaf`.
pub fn chain<M>(depth: usize, leaf: VNode<M>) -> VNode<M> {
    (0..depth).fold(leaf, |inner, _| {
        VNode::element("div", Vec::new(), vec![inner])
    })
}

/// A keyed `ul` whose children are `li` elements showing their key.
pub fn keyed_list<M>(keys: &[&str]) -> VNode<M> {
    let children = keys
        .iter()
        .map(|key| {
            let item = VNode::element("li", Vec::new(), vec![VNode::text(*key)]);
            ((*key).to_owned(), item)
        })
        .collect();
    VNode::keyed("ul", Vec::new(), children)
}
