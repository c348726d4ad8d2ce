use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::collections::map;
use crate::diff::unwrap_mapped;
use crate::event::{make_listener, Dispatcher, EventContext, HandlerSlot};
use crate::facts::FactsDiff;
use crate::surface::{ListenerOptions, NodeError, NodeId, Surface};
use crate::vnode::{VNode, VNodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualDomOptions {
    /// Register handlers that can never prevent the default action as
    /// passive listeners.
    pub passive_listeners: bool,
}

impl Default for VirtualDomOptions {
    fn default() -> Self {
        Self {
            passive_listeners: true,
        }
    }
}

/// Engine state owned by the application root.
///
/// Holds the root event context with the dispatcher, the mapper contexts of
/// every real node that starts a mapped subtree, and the listener slots
/// through which event handlers are swapped in place.
///
/// A real node can start several mapped layers when cached nodes separate
/// them, so its contexts form a stack, outermost first.
pub struct VirtualDom<M> {
    root: Rc<EventContext<M>>,
    pub(crate) contexts: map::HashMap<NodeId, Vec<Rc<EventContext<M>>>>,
    pub(crate) listeners: map::HashMap<NodeId, map::HashMap<String, HandlerSlot<M>>>,
    options: VirtualDomOptions,
}

fn writes_only_when_changed(name: &str) -> bool {
    name == "value" || name == "checked"
}

impl<M: 'static> VirtualDom<M> {
    pub fn new(dispatcher: Dispatcher<M>) -> Self {
        Self::with_options(dispatcher, VirtualDomOptions::default())
    }

    pub fn with_options(dispatcher: Dispatcher<M>, options: VirtualDomOptions) -> Self {
        Self {
            root: EventContext::root(dispatcher),
            contexts: map::HashMap::default(),
            listeners: map::HashMap::default(),
            options,
        }
    }

    pub fn options(&self) -> VirtualDomOptions {
        self.options
    }

    /// Routes all later events, including those of listeners that are
    /// already attached, to `dispatcher`.
    pub fn set_dispatcher(&self, dispatcher: Dispatcher<M>) {
        self.root.set_dispatcher(dispatcher);
    }

    pub(crate) fn root_context(&self) -> Rc<EventContext<M>> {
        Rc::clone(&self.root)
    }

    /// Number of real nodes that carry their own mapper context.
    pub fn mapped_node_count(&self) -> usize {
        self.contexts.len()
    }

    /// Number of real nodes with at least one listener attached by the engine.
    pub fn listening_node_count(&self) -> usize {
        self.listeners.values().filter(|slots| !slots.is_empty()).count()
    }

    /// Realizes `vnode` on the surface. The caller decides where the returned
    /// node is inserted.
    pub fn render(
        &mut self,
        surface: &mut dyn Surface,
        vnode: &VNode<M>,
    ) -> Result<NodeId, NodeError> {
        let root = self.root_context();
        self.render_node(surface, vnode, &root)
    }

    pub(crate) fn render_node(
        &mut self,
        surface: &mut dyn Surface,
        vnode: &VNode<M>,
        context: &Rc<EventContext<M>>,
    ) -> Result<NodeId, NodeError> {
        match vnode.kind() {
            VNodeKind::Text(text) => Ok(surface.create_text(text)),
            VNodeKind::Cached(cached) => self.render_node(surface, cached.force(), context),
            VNodeKind::Mapped(_) => {
                let (mappers, child) = unwrap_mapped(vnode);
                let chain = mappers.into_iter().map(Rc::clone).collect();
                let mapped = EventContext::mapped(chain, Rc::clone(context));
                let node = self.render_node(surface, child, &mapped)?;
                self.contexts.entry(node).or_default().insert(0, mapped);
                Ok(node)
            }
            VNodeKind::Widget(widget) => {
                let node = widget.widget.realize(surface)?;
                self.apply_facts(surface, node, &widget.facts.to_changes(), context)?;
                Ok(node)
            }
            VNodeKind::Element(element) => {
                let node = surface.create_element(&element.tag, element.namespace.as_deref());
                self.apply_facts(surface, node, &element.facts.to_changes(), context)?;
                for child in &element.children {
                    let child_node = self.render_node(surface, child, context)?;
                    surface.append_child(node, child_node)?;
                }
                Ok(node)
            }
            VNodeKind::Keyed(keyed) => {
                let node = surface.create_element(&keyed.tag, keyed.namespace.as_deref());
                self.apply_facts(surface, node, &keyed.facts.to_changes(), context)?;
                for (_, child) in &keyed.children {
                    let child_node = self.render_node(surface, child, context)?;
                    surface.append_child(node, child_node)?;
                }
                Ok(node)
            }
        }
    }

    pub(crate) fn apply_facts(
        &mut self,
        surface: &mut dyn Surface,
        node: NodeId,
        changes: &FactsDiff<M>,
        context: &Rc<EventContext<M>>,
    ) -> Result<(), NodeError> {
        if !changes.events.is_empty() {
            self.apply_events(surface, node, changes, context)?;
        }

        for (name, value) in &changes.styles {
            surface.set_style(node, name, value)?;
        }

        for (name, value) in &changes.attributes {
            match value {
                Some(value) => surface.set_attribute(node, name, value)?,
                None => surface.remove_attribute(node, name)?,
            }
        }

        for (name, change) in &changes.namespaced {
            match &change.value {
                Some(value) => surface.set_attribute_ns(node, &change.namespace, name, value)?,
                None => surface.remove_attribute_ns(node, &change.namespace, name)?,
            }
        }

        for (name, value) in &changes.properties {
            if writes_only_when_changed(name)
                && surface.property(node, name)?.as_ref() == Some(value)
            {
                continue;
            }
            surface.set_property(node, name, Value::clone(value))?;
        }
        Ok(())
    }

    fn apply_events(
        &mut self,
        surface: &mut dyn Surface,
        node: NodeId,
        changes: &FactsDiff<M>,
        context: &Rc<EventContext<M>>,
    ) -> Result<(), NodeError> {
        let passive_listeners = self.options.passive_listeners;
        let slots = self.listeners.entry(node).or_default();
        for (name, change) in &changes.events {
            let Some(handler) = change else {
                if slots.remove(name).is_some() {
                    surface.remove_listener(node, name)?;
                }
                continue;
            };

            if let Some(slot) = slots.get(name) {
                if slot.borrow().kind() == handler.kind() {
                    *slot.borrow_mut() = handler.clone();
                    continue;
                }
                surface.remove_listener(node, name)?;
            }

            let slot: HandlerSlot<M> = Rc::new(RefCell::new(handler.clone()));
            let options = ListenerOptions {
                passive: passive_listeners && handler.is_passive(),
            };
            let listener = make_listener(Rc::clone(context), Rc::clone(&slot));
            surface.add_listener(node, name, listener, options)?;
            slots.insert(name.clone(), slot);
        }
        if slots.is_empty() {
            self.listeners.remove(&node);
        }
        Ok(())
    }

    /// Copies the `depth` outermost mapper contexts of `from` to the bottom of
    /// the stack of `to`, which replaces it in the tree.
    pub(crate) fn inherit_contexts(&mut self, from: NodeId, to: NodeId, depth: usize) {
        let Some(stack) = self.contexts.get(&from) else {
            return;
        };
        let inherited: Vec<_> = stack.iter().take(depth).cloned().collect();
        if !inherited.is_empty() {
            self.contexts.entry(to).or_default().splice(0..0, inherited);
        }
    }

    /// Detaches and frees a subtree, dropping the engine's bookkeeping for
    /// every node in it.
    pub(crate) fn release(
        &mut self,
        surface: &mut dyn Surface,
        node: NodeId,
    ) -> Result<(), NodeError> {
        if let Some(parent) = surface.parent(node)? {
            surface.remove_child(parent, node)?;
        }
        let mut pending = vec![node];
        while let Some(next) = pending.pop() {
            self.contexts.remove(&next);
            self.listeners.remove(&next);
            pending.extend(surface.children(next)?);
        }
        surface.remove_node(node)
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
