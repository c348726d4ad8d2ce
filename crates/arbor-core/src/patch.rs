//! Recorded mutations produced by the differ.

use std::fmt;
use std::rc::Rc;

use crate::event::{EventContext, Mapper};
use crate::facts::FactsDiff;
use crate::surface::NodeId;
use crate::vnode::{VNode, Widget, WidgetPatch};

/// One mutation, addressed by the pre-order position of the affected node
/// in the old tree. The indexer fills in `node` and `context` before the
/// patch is applied.
pub struct Patch<M> {
    pub index: usize,
    pub kind: PatchKind<M>,
    pub(crate) node: Option<NodeId>,
    pub(crate) context: Option<Rc<EventContext<M>>>,
    /// Mapped layers that start on `node` above the patched position.
    pub(crate) depth: usize,
}

pub enum PatchKind<M> {
    Redraw(VNode<M>),
    Facts(FactsDiff<M>),
    Text(String),
    /// Changes inside a cached subtree, addressed from its own root at 0.
    Cached(Vec<Patch<M>>),
    Mappers(Vec<Mapper<M>>),
    RemoveLast {
        from: usize,
        count: usize,
    },
    Append {
        from: usize,
        children: Vec<VNode<M>>,
    },
    Reorder(Reorder<M>),
    /// Only valid inside a [`Reorder`]. `None` drops the child; `Some`
    /// detaches it so an insert can place it again.
    Remove(Option<Move<M>>),
    /// `facts` are the widget's complete new facts, applied again when the
    /// widget answers with a different node.
    Widget {
        widget: Rc<dyn Widget>,
        patch: WidgetPatch,
        facts: FactsDiff<M>,
    },
}

/// Keyed child changes of one element.
pub struct Reorder<M> {
    /// Child patches in index order, including the `Remove` patches.
    pub patches: Vec<Patch<M>>,
    /// `(position, entry)` pairs, in ascending position.
    pub inserts: Vec<(usize, usize)>,
    /// Entries appended after everything else.
    pub end_inserts: Vec<usize>,
    pub entries: Vec<ReorderEntry<M>>,
}

pub enum ReorderEntry<M> {
    /// A child that did not exist before and is rendered fresh.
    Render(VNode<M>),
    /// A child detached by a `Remove` patch carrying this entry.
    Move,
}

pub struct Move<M> {
    pub entry: usize,
    /// Changes to the moved child, addressed in the old tree.
    pub patches: Vec<Patch<M>>,
}

impl<M> Patch<M> {
    pub fn new(index: usize, kind: PatchKind<M>) -> Self {
        Self {
            index,
            kind,
            node: None,
            context: None,
            depth: 0,
        }
    }

    /// The real node this patch was bound to, once indexed.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub(crate) fn bind(&mut self, node: NodeId, context: &Rc<EventContext<M>>, depth: usize) {
        self.node = Some(node);
        self.context = Some(Rc::clone(context));
        self.depth = depth;
    }

    pub(crate) fn bound_node(&self) -> NodeId {
        match self.node {
            Some(node) => node,
            None => panic!("patch at index {} was never bound to a node", self.index),
        }
    }

    pub(crate) fn bound_context(&self) -> Rc<EventContext<M>> {
        match &self.context {
            Some(context) => Rc::clone(context),
            None => panic!("patch at index {} has no event context", self.index),
        }
    }
}

impl<M> fmt::Debug for Patch<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Patch")
            .field("index", &self.index)
            .field("kind", &self.kind)
            .field("node", &self.node)
            .finish()
    }
}

impl<M> fmt::Debug for PatchKind<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchKind::Redraw(node) => f.debug_tuple("Redraw").field(node).finish(),
            PatchKind::Facts(diff) => f.debug_tuple("Facts").field(diff).finish(),
            PatchKind::Text(text) => f.debug_tuple("Text").field(text).finish(),
            PatchKind::Cached(patches) => f.debug_tuple("Cached").field(patches).finish(),
            PatchKind::Mappers(mappers) => write!(f, "Mappers({})", mappers.len()),
            PatchKind::RemoveLast { from, count } => f
                .debug_struct("RemoveLast")
                .field("from", from)
                .field("count", count)
                .finish(),
            PatchKind::Append { from, children } => f
                .debug_struct("Append")
                .field("from", from)
                .field("children", children)
                .finish(),
            PatchKind::Reorder(reorder) => f
                .debug_struct("Reorder")
                .field("patches", &reorder.patches)
                .field("inserts", &reorder.inserts)
                .field("end_inserts", &reorder.end_inserts)
                .finish(),
            PatchKind::Remove(None) => f.write_str("Remove"),
            PatchKind::Remove(Some(moved)) => f
                .debug_struct("Move")
                .field("entry", &moved.entry)
                .field("patches", &moved.patches)
                .finish(),
            PatchKind::Widget { patch, .. } => f.debug_tuple("Widget").field(patch).finish(),
        }
    }
}

/// Total number of patches, counting nested lists.
pub fn count_patches<M>(patches: &[Patch<M>]) -> usize {
    patches
        .iter()
        .map(|patch| {
            1 + match &patch.kind {
                PatchKind::Cached(nested) => count_patches(nested),
                PatchKind::Reorder(reorder) => count_patches(&reorder.patches),
                PatchKind::Remove(Some(moved)) => count_patches(&moved.patches),
                _ => 0,
            }
        })
        .sum()
}
