//! Applies bound patches to the surface.

use std::rc::Rc;

use crate::event::EventContext;
use crate::index::bind_patches;
use crate::patch::{count_patches, Move, Patch, PatchKind, Reorder, ReorderEntry};
use crate::render::VirtualDom;
use crate::surface::{NodeError, NodeId, Surface};
use crate::vnode::VNode;

impl<M: 'static> VirtualDom<M> {
    /// Applies `patches`, computed by [`diff`](crate::diff) from `old`, to the
    /// real tree rooted at `root`. `root` must be the node `old` was rendered
    /// to. Returns the root afterwards, which changes when the root itself was
    /// redrawn.
    pub fn patch(
        &mut self,
        surface: &mut dyn Surface,
        root: NodeId,
        old: &VNode<M>,
        mut patches: Vec<Patch<M>>,
    ) -> Result<NodeId, NodeError> {
        if patches.is_empty() {
            return Ok(root);
        }
        log::debug!("applying {} patches", count_patches(&patches));
        let context = self.root_context();
        bind_patches(surface, &self.contexts, root, old, &mut patches, &context)?;
        self.apply_patches(surface, root, patches)
    }

    fn apply_patches(
        &mut self,
        surface: &mut dyn Surface,
        root: NodeId,
        patches: Vec<Patch<M>>,
    ) -> Result<NodeId, NodeError> {
        let mut root = root;
        for patch in patches {
            let node = patch.bound_node();
            let replacement = self.apply_patch(surface, patch)?;
            if node == root {
                root = replacement;
            }
        }
        Ok(root)
    }

    fn apply_patch(
        &mut self,
        surface: &mut dyn Surface,
        patch: Patch<M>,
    ) -> Result<NodeId, NodeError> {
        let index = patch.index;
        let node = patch.bound_node();
        let context = patch.bound_context();
        let depth = patch.depth;
        log::trace!("patch {index} on node {node}: {:?}", patch.kind);

        match patch.kind {
            PatchKind::Redraw(vnode) => self.redraw(surface, node, depth, &vnode, &context),
            PatchKind::Facts(changes) => {
                self.apply_facts(surface, node, &changes, &context)?;
                Ok(node)
            }
            PatchKind::Text(text) => {
                surface.set_text(node, &text)?;
                Ok(node)
            }
            PatchKind::Cached(nested) => self.apply_patches(surface, node, nested),
            PatchKind::Mappers(chain) => {
                context.replace_mappers(chain);
                Ok(node)
            }
            PatchKind::RemoveLast { from, count } => {
                for _ in 0..count {
                    let Some(child) = surface.child_at(node, from)? else {
                        panic!("node {node} has fewer than {} children", from + count);
                    };
                    self.release(surface, child)?;
                }
                Ok(node)
            }
            PatchKind::Append { from, children } => {
                let before = surface.child_at(node, from)?;
                for child in &children {
                    let child_node = self.render_node(surface, child, &context)?;
                    surface.insert_before(node, child_node, before)?;
                }
                Ok(node)
            }
            PatchKind::Reorder(reorder) => {
                self.apply_reorder(surface, node, reorder, &context)?;
                Ok(node)
            }
            PatchKind::Remove(_) => {
                panic!("remove patch at index {index} outside a keyed reorder")
            }
            PatchKind::Widget {
                widget,
                patch,
                facts,
            } => {
                let next = widget.apply(surface, node, patch)?;
                if next != node {
                    self.inherit_contexts(node, next, depth);
                    self.apply_facts(surface, next, &facts, &context)?;
                    if let Some(parent) = surface.parent(node)? {
                        surface.replace_child(parent, next, node)?;
                    }
                    self.release(surface, node)?;
                }
                Ok(next)
            }
        }
    }

    /// `depth` mapped layers above the redrawn position start on `node` and
    /// carry over to its replacement.
    fn redraw(
        &mut self,
        surface: &mut dyn Surface,
        node: NodeId,
        depth: usize,
        vnode: &VNode<M>,
        context: &Rc<EventContext<M>>,
    ) -> Result<NodeId, NodeError> {
        let next = self.render_node(surface, vnode, context)?;
        self.inherit_contexts(node, next, depth);
        if let Some(parent) = surface.parent(node)? {
            surface.replace_child(parent, next, node)?;
        }
        self.release(surface, node)?;
        Ok(next)
    }

    fn apply_reorder(
        &mut self,
        surface: &mut dyn Surface,
        node: NodeId,
        reorder: Reorder<M>,
        context: &Rc<EventContext<M>>,
    ) -> Result<(), NodeError> {
        let Reorder {
            patches,
            inserts,
            end_inserts,
            entries,
        } = reorder;
        let mut moved: Vec<Option<NodeId>> = vec![None; entries.len()];

        for patch in patches {
            let child = patch.bound_node();
            match patch.kind {
                PatchKind::Remove(None) => self.release(surface, child)?,
                PatchKind::Remove(Some(Move { entry, patches })) => {
                    surface.remove_child(node, child)?;
                    moved[entry] = Some(self.apply_patches(surface, child, patches)?);
                }
                kind => {
                    self.apply_patch(surface, Patch { kind, ..patch })?;
                }
            }
        }

        for (position, entry) in inserts {
            let child = self.take_entry(surface, &entries, &mut moved, entry, context)?;
            let before = surface.child_at(node, position)?;
            surface.insert_before(node, child, before)?;
        }
        for entry in end_inserts {
            let child = self.take_entry(surface, &entries, &mut moved, entry, context)?;
            surface.append_child(node, child)?;
        }
        Ok(())
    }

    fn take_entry(
        &mut self,
        surface: &mut dyn Surface,
        entries: &[ReorderEntry<M>],
        moved: &mut [Option<NodeId>],
        entry: usize,
        context: &Rc<EventContext<M>>,
    ) -> Result<NodeId, NodeError> {
        match &entries[entry] {
            ReorderEntry::Render(vnode) => self.render_node(surface, vnode, context),
            ReorderEntry::Move => match moved[entry].take() {
                Some(child) => Ok(child),
                None => panic!("moved entry {entry} was never detached"),
            },
        }
    }
}
