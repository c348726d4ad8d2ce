use std::fmt::Write as _;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::surface::{
    DispatchOutcome, EventSource, Listener, ListenerOptions, NamespacedAttribute, NodeError,
    NodeId, NodeView, Surface,
};

enum Content {
    Text(String),
    Element {
        tag: String,
        namespace: Option<String>,
    },
    Comment(String),
}

struct MemoryNode {
    content: Content,
    parent: Option<NodeId>,
    children: IndexSet<NodeId>,
    attributes: IndexMap<String, String>,
    namespaced: IndexMap<(String, String), String>,
    styles: IndexMap<String, String>,
    properties: IndexMap<String, Value>,
    listeners: IndexMap<String, (Listener, ListenerOptions)>,
}

impl MemoryNode {
    fn new(content: Content) -> Self {
        Self {
            content,
            parent: None,
            children: IndexSet::new(),
            attributes: IndexMap::new(),
            namespaced: IndexMap::new(),
            styles: IndexMap::new(),
            properties: IndexMap::new(),
            listeners: IndexMap::new(),
        }
    }

    fn is_element(&self) -> bool {
        matches!(self.content, Content::Element { .. })
    }
}

/// An arena-backed surface that keeps the whole UI tree in memory.
///
/// Used by tests, benchmarks and headless hosts. Node ids are never reused,
/// so a stale id reports [`NodeError::Missing`] instead of aliasing.
#[derive(Default)]
pub struct MemorySurface {
    nodes: Vec<Option<MemoryNode>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(MemoryNode::new(Content::Comment(text.to_owned())))
    }

    fn push(&mut self, node: MemoryNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Some(node));
        id
    }

    fn node(&self, id: NodeId) -> Result<&MemoryNode, NodeError> {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(NodeError::Missing { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, NodeError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(NodeError::Missing { id })
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, NodeError> {
        let node = self.node_mut(id)?;
        if !node.is_element() {
            return Err(NodeError::TypeMismatch {
                id,
                expected: "element",
            });
        }
        Ok(node)
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).ok()?.content {
            Content::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).ok()?.content {
            Content::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).ok()?.attributes.get(name).map(String::as_str)
    }

    pub fn style(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).ok()?.styles.get(name).map(String::as_str)
    }

    pub fn listener_count(&self, id: NodeId) -> usize {
        self.node(id).map_or(0, |node| node.listeners.len())
    }

    pub fn is_passive(&self, id: NodeId, event: &str) -> Option<bool> {
        let (_, options) = self.node(id).ok()?.listeners.get(event)?;
        Some(options.passive)
    }

    /// Renders the subtree under `root` as indented text.
    ///
    /// Properties holding `null` or an empty string are omitted, since that
    /// is how a removed property reads back on a live DOM node.
    pub fn dump_tree(&self, root: Option<NodeId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_node(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        let Ok(node) = self.node(id) else {
            let _ = writeln!(output, "{indent}(missing {id})");
            return;
        };
        match &node.content {
            Content::Text(text) => {
                let _ = writeln!(output, "{indent}{text:?}");
            }
            Content::Comment(text) => {
                let _ = writeln!(output, "{indent}<!--{text}-->");
            }
            Content::Element { tag, namespace } => {
                let _ = write!(output, "{indent}<{tag}");
                if let Some(namespace) = namespace {
                    let _ = write!(output, " xmlns={namespace:?}");
                }
                let mut attributes: Vec<_> = node.attributes.iter().collect();
                attributes.sort();
                for (name, value) in attributes {
                    let _ = write!(output, " {name}={value:?}");
                }
                let mut namespaced: Vec<_> = node.namespaced.iter().collect();
                namespaced.sort();
                for ((namespace, name), value) in namespaced {
                    let _ = write!(output, " {{{namespace}}}{name}={value:?}");
                }
                let mut styles: Vec<_> = node.styles.iter().collect();
                styles.sort();
                for (name, value) in styles {
                    let _ = write!(output, " style:{name}={value:?}");
                }
                let mut properties: Vec<_> = node
                    .properties
                    .iter()
                    .filter(|(_, value)| !value.is_null() && value.as_str() != Some(""))
                    .collect();
                properties.sort_by(|a, b| a.0.cmp(b.0));
                for (name, value) in properties {
                    let _ = write!(output, " .{name}={value}");
                }
                let mut listeners: Vec<_> = node.listeners.keys().collect();
                listeners.sort();
                for name in listeners {
                    let _ = write!(output, " @{name}");
                }
                output.push_str(">\n");
                for &child in &node.children {
                    self.dump_node(output, child, depth + 1);
                }
            }
        }
    }

    fn detach(&mut self, child: NodeId) -> Result<(), NodeError> {
        if let Some(parent) = self.node(child)?.parent {
            self.node_mut(parent)?.children.shift_remove(&child);
            self.node_mut(child)?.parent = None;
        }
        Ok(())
    }

    fn position(&self, parent: NodeId, child: NodeId) -> Result<usize, NodeError> {
        self.node(parent)?
            .children
            .get_index_of(&child)
            .ok_or(NodeError::NotAChild { parent, child })
    }
}

impl Surface for MemorySurface {
    fn create_text(&mut self, text: &str) -> NodeId {
        self.push(MemoryNode::new(Content::Text(text.to_owned())))
    }

    fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> NodeId {
        self.push(MemoryNode::new(Content::Element {
            tag: tag.to_owned(),
            namespace: namespace.map(str::to_owned),
        }))
    }

    fn remove_node(&mut self, id: NodeId) -> Result<(), NodeError> {
        self.detach(id)?;
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(next).and_then(Option::take) {
                pending.extend(node.children.iter().copied());
            }
        }
        Ok(())
    }

    fn parent(&self, id: NodeId) -> Result<Option<NodeId>, NodeError> {
        Ok(self.node(id)?.parent)
    }

    fn child_at(&self, id: NodeId, index: usize) -> Result<Option<NodeId>, NodeError> {
        Ok(self.node(id)?.children.get_index(index).copied())
    }

    fn children(&self, id: NodeId) -> Result<Vec<NodeId>, NodeError> {
        Ok(self.node(id)?.children.iter().copied().collect())
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), NodeError> {
        self.element_mut(parent)?;
        self.node(child)?;
        if before == Some(child) {
            return Ok(());
        }
        self.detach(child)?;
        let index = match before {
            Some(sibling) => self.position(parent, sibling)?,
            None => self.node(parent)?.children.len(),
        };
        self.node_mut(parent)?.children.shift_insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.position(parent, child)?;
        self.detach(child)
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new: NodeId,
        old: NodeId,
    ) -> Result<(), NodeError> {
        self.position(parent, old)?;
        self.node(new)?;
        if new == old {
            return Ok(());
        }
        self.detach(new)?;
        let index = self.position(parent, old)?;
        self.detach(old)?;
        self.node_mut(parent)?.children.shift_insert(index, new);
        self.node_mut(new)?.parent = Some(parent);
        Ok(())
    }

    fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), NodeError> {
        match &mut self.node_mut(id)?.content {
            Content::Text(current) => {
                text.clone_into(current);
                Ok(())
            }
            _ => Err(NodeError::TypeMismatch { id, expected: "text" }),
        }
    }

    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), NodeError> {
        self.element_mut(id)?
            .attributes
            .insert(name.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), NodeError> {
        self.element_mut(id)?.attributes.shift_remove(name);
        Ok(())
    }

    fn set_attribute_ns(
        &mut self,
        id: NodeId,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> Result<(), NodeError> {
        self.element_mut(id)?
            .namespaced
            .insert((namespace.to_owned(), name.to_owned()), value.to_owned());
        Ok(())
    }

    fn remove_attribute_ns(
        &mut self,
        id: NodeId,
        namespace: &str,
        name: &str,
    ) -> Result<(), NodeError> {
        self.element_mut(id)?
            .namespaced
            .shift_remove(&(namespace.to_owned(), name.to_owned()));
        Ok(())
    }

    fn set_style(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), NodeError> {
        let styles = &mut self.element_mut(id)?.styles;
        if value.is_empty() {
            styles.shift_remove(name);
        } else {
            styles.insert(name.to_owned(), value.to_owned());
        }
        Ok(())
    }

    fn property(&self, id: NodeId, name: &str) -> Result<Option<Value>, NodeError> {
        Ok(self.node(id)?.properties.get(name).cloned())
    }

    fn set_property(&mut self, id: NodeId, name: &str, value: Value) -> Result<(), NodeError> {
        self.element_mut(id)?
            .properties
            .insert(name.to_owned(), value);
        Ok(())
    }

    fn add_listener(
        &mut self,
        id: NodeId,
        event: &str,
        listener: Listener,
        options: ListenerOptions,
    ) -> Result<(), NodeError> {
        self.node_mut(id)?
            .listeners
            .insert(event.to_owned(), (listener, options));
        Ok(())
    }

    fn remove_listener(&mut self, id: NodeId, event: &str) -> Result<(), NodeError> {
        self.node_mut(id)?.listeners.shift_remove(event);
        Ok(())
    }

    fn describe(&self, id: NodeId) -> Result<NodeView, NodeError> {
        let node = self.node(id)?;
        Ok(match &node.content {
            Content::Text(text) => NodeView::Text(text.clone()),
            Content::Comment(_) => NodeView::Other,
            Content::Element { tag, namespace } => NodeView::Element {
                tag: tag.clone(),
                namespace: namespace.clone(),
                attributes: node
                    .attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect(),
                namespaced_attributes: node
                    .namespaced
                    .iter()
                    .map(|((namespace, name), value)| NamespacedAttribute {
                        namespace: namespace.clone(),
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect(),
                styles: node
                    .styles
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect(),
            },
        })
    }
}

impl EventSource for MemorySurface {
    fn dispatch_event(
        &self,
        target: NodeId,
        event: &str,
        payload: &Value,
    ) -> Result<DispatchOutcome, NodeError> {
        let mut outcome = DispatchOutcome::default();
        let mut current = Some(target);
        while let Some(id) = current {
            let node = self.node(id)?;
            if let Some((listener, options)) = node.listeners.get(event) {
                let listener = listener.clone();
                let passive = options.passive;
                let response = listener(payload);
                outcome.handled += 1;
                if response.prevent_default && !passive {
                    outcome.default_prevented = true;
                }
                if response.stop_propagation {
                    outcome.propagation_stopped = true;
                    break;
                }
            }
            current = node.parent;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "tests/memory_tests.rs"]
mod tests;
