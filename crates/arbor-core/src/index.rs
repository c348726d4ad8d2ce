//! Binds each patch to the real node it targets.
//!
//! Patches are sorted by old-tree index, so one walk over the old tree and
//! the real tree together is enough. Every subtree covers the index range
//! `[low, high]`; a child is entered only when the next pending patch falls
//! inside its range, so untouched subtrees are never visited on the surface.

use std::rc::Rc;

use crate::collections::map;
use crate::diff::unwrap_mapped;
use crate::event::EventContext;
use crate::patch::{Patch, PatchKind};
use crate::surface::{NodeError, NodeId, Surface};
use crate::vnode::{VNode, VNodeKind};

struct Indexer<'a, M> {
    surface: &'a dyn Surface,
    contexts: &'a map::HashMap<NodeId, Vec<Rc<EventContext<M>>>>,
}

pub(crate) fn bind_patches<M: 'static>(
    surface: &dyn Surface,
    contexts: &map::HashMap<NodeId, Vec<Rc<EventContext<M>>>>,
    root: NodeId,
    old: &VNode<M>,
    patches: &mut [Patch<M>],
    context: &Rc<EventContext<M>>,
) -> Result<(), NodeError> {
    let indexer = Indexer { surface, contexts };
    let scope = Scope::new(context, 0);
    indexer.bind(root, old, patches, 0, Span::new(0, old.descendants()), &scope)?;
    assert_bound(patches);
    Ok(())
}

fn assert_bound<M>(patches: &[Patch<M>]) {
    for patch in patches {
        if patch.node.is_none() {
            panic!(
                "no real node found for patch at index {}: {:?}",
                patch.index, patch.kind
            );
        }
        match &patch.kind {
            PatchKind::Cached(nested) => assert_bound(nested),
            PatchKind::Reorder(reorder) => assert_bound(&reorder.patches),
            PatchKind::Remove(Some(moved)) => assert_bound(&moved.patches),
            _ => {}
        }
    }
}

/// Old-tree index range covered by one subtree.
#[derive(Clone, Copy)]
struct Span {
    low: usize,
    high: usize,
}

impl Span {
    fn new(low: usize, high: usize) -> Self {
        Self { low, high }
    }
}

/// Event context in effect at a position, plus the number of mapped layers
/// already entered on the current real node.
struct Scope<M> {
    context: Rc<EventContext<M>>,
    depth: usize,
}

impl<M> Scope<M> {
    fn new(context: &Rc<EventContext<M>>, depth: usize) -> Self {
        Self {
            context: Rc::clone(context),
            depth,
        }
    }
}

/// Index of the patch at `i`, if it still belongs to a subtree ending at `high`.
fn next_index<M>(patches: &[Patch<M>], i: usize, high: usize) -> Option<usize> {
    patches
        .get(i)
        .map(|patch| patch.index)
        .filter(|&index| index <= high)
}

impl<'a, M: 'static> Indexer<'a, M> {
    /// Context of the mapped layer `depth` on `node`, counting from the
    /// outermost layer that starts there.
    fn mapped_context(&self, node: NodeId, depth: usize) -> Rc<EventContext<M>> {
        match self.contexts.get(&node).and_then(|stack| stack.get(depth)) {
            Some(mapped) => Rc::clone(mapped),
            None => panic!("mapped node {node} has no event context at depth {depth}"),
        }
    }

    fn bind(
        &self,
        node: NodeId,
        vnode: &VNode<M>,
        patches: &mut [Patch<M>],
        mut i: usize,
        span: Span,
        scope: &Scope<M>,
    ) -> Result<usize, NodeError> {
        let Span { low, high } = span;
        let Some(mut index) = next_index(patches, i, high) else {
            return Ok(i);
        };

        while index == low {
            let patch = &mut patches[i];
            if matches!(patch.kind, PatchKind::Mappers(_)) {
                let mapped = self.mapped_context(node, scope.depth);
                patch.bind(node, &mapped, scope.depth);
            } else {
                patch.bind(node, &scope.context, scope.depth);
            }
            match &mut patch.kind {
                PatchKind::Cached(nested) => {
                    let VNodeKind::Cached(cached) = vnode.kind() else {
                        panic!("cached patch at index {low} targets a non-cached node");
                    };
                    let inner = cached.force();
                    let inner_span = Span::new(0, inner.descendants());
                    self.bind(node, inner, nested, 0, inner_span, scope)?;
                }
                PatchKind::Reorder(reorder) => {
                    self.bind(node, vnode, &mut reorder.patches, 0, span, scope)?;
                }
                PatchKind::Remove(Some(moved)) => {
                    self.bind(node, vnode, &mut moved.patches, 0, span, scope)?;
                }
                _ => {}
            }
            i += 1;
            match next_index(patches, i, high) {
                Some(next) => index = next,
                None => return Ok(i),
            }
        }

        match vnode.kind() {
            VNodeKind::Mapped(_) => {
                let (mappers, child) = unwrap_mapped(vnode);
                let context = self.mapped_context(node, scope.depth);
                let inner = Scope::new(&context, scope.depth + 1);
                let span = Span::new(low + mappers.len(), high);
                self.bind(node, child, patches, i, span, &inner)
            }
            VNodeKind::Element(element) => {
                self.bind_children(node, element.children.iter(), patches, i, span, scope)
            }
            VNodeKind::Keyed(keyed) => {
                let children = keyed.children.iter().map(|(_, child)| child);
                self.bind_children(node, children, patches, i, span, scope)
            }
            VNodeKind::Text(_) | VNodeKind::Widget(_) | VNodeKind::Cached(_) => Ok(i),
        }
    }

    fn bind_children<'v>(
        &self,
        node: NodeId,
        children: impl Iterator<Item = &'v VNode<M>>,
        patches: &mut [Patch<M>],
        mut i: usize,
        span: Span,
        scope: &Scope<M>,
    ) -> Result<usize, NodeError>
    where
        M: 'v,
    {
        let Span { mut low, high } = span;
        let Some(mut index) = next_index(patches, i, high) else {
            return Ok(i);
        };

        for (position, child) in children.enumerate() {
            low += 1;
            let next_low = low + child.descendants();
            if low <= index && index <= next_low {
                let Some(child_node) = self.surface.child_at(node, position)? else {
                    panic!("node {node} has no child at {position} for patch index {index}");
                };
                let child_scope = Scope::new(&scope.context, 0);
                let span = Span::new(low, next_low);
                i = self.bind(child_node, child, patches, i, span, &child_scope)?;
                match next_index(patches, i, high) {
                    Some(next) => index = next,
                    None => return Ok(i),
                }
            }
            low = next_low;
        }
        Ok(i)
    }
}

#[cfg(test)]
#[path = "tests/index_tests.rs"]
mod tests;
