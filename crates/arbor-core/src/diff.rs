//! Tree differ.
//!
//! Walks the old and new trees in lockstep and records patches addressed by
//! pre-order position in the old tree. A node at `index` has its first child
//! at `index + 1`, and its next sibling at `index + descendants + 1`.

use std::rc::Rc;

use crate::event::Mapper;
use crate::facts::{diff_facts, Facts};
use crate::keyed::diff_keyed;
use crate::patch::{Patch, PatchKind};
use crate::vnode::{CachedNode, VNode, VNodeKind};

/// Computes the patches that turn `old` into `new`.
///
/// Pure apart from forcing and sharing cached subtrees.
pub fn diff<M: 'static>(old: &VNode<M>, new: &VNode<M>) -> Vec<Patch<M>> {
    let mut patches = Vec::new();
    diff_node(old, new, &mut patches, 0);
    patches
}

pub(crate) fn diff_node<M: 'static>(
    x: &VNode<M>,
    y: &VNode<M>,
    patches: &mut Vec<Patch<M>>,
    index: usize,
) {
    if x.ptr_eq(y) {
        return;
    }

    match (x.kind(), y.kind()) {
        (VNodeKind::Cached(old), VNodeKind::Cached(new)) => diff_cached(old, new, patches, index),
        (VNodeKind::Mapped(_), VNodeKind::Mapped(_)) => diff_mapped(x, y, patches, index),
        (VNodeKind::Text(old), VNodeKind::Text(new)) => {
            if old != new {
                patches.push(Patch::new(index, PatchKind::Text(new.clone())));
            }
        }
        (VNodeKind::Element(old), VNodeKind::Element(new)) => {
            if old.tag != new.tag || old.namespace != new.namespace {
                redraw(y, patches, index);
                return;
            }
            push_facts(&old.facts, &new.facts, patches, index);
            diff_children(&old.children, &new.children, patches, index);
        }
        (VNodeKind::Element(old), VNodeKind::Keyed(new)) => {
            // Compare as plain children instead of redrawing the whole list.
            if old.tag != new.tag || old.namespace != new.namespace {
                redraw(y, patches, index);
                return;
            }
            push_facts(&old.facts, &new.facts, patches, index);
            let children: Vec<VNode<M>> =
                new.children.iter().map(|(_, child)| child.clone()).collect();
            diff_children(&old.children, &children, patches, index);
        }
        (VNodeKind::Keyed(old), VNodeKind::Keyed(new)) => {
            if old.tag != new.tag || old.namespace != new.namespace {
                redraw(y, patches, index);
                return;
            }
            push_facts(&old.facts, &new.facts, patches, index);
            diff_keyed(&old.children, &new.children, patches, index);
        }
        (VNodeKind::Widget(old), VNodeKind::Widget(new)) => {
            if old.widget.as_any().type_id() != new.widget.as_any().type_id() {
                redraw(y, patches, index);
                return;
            }
            push_facts(&old.facts, &new.facts, patches, index);
            if let Some(patch) = new.widget.diff(&*old.widget) {
                patches.push(Patch::new(
                    index,
                    PatchKind::Widget {
                        widget: Rc::clone(&new.widget),
                        patch,
                        facts: new.facts.to_changes(),
                    },
                ));
            }
        }
        _ => redraw(y, patches, index),
    }
}

fn redraw<M>(y: &VNode<M>, patches: &mut Vec<Patch<M>>, index: usize) {
    patches.push(Patch::new(index, PatchKind::Redraw(y.clone())));
}

fn push_facts<M>(old: &Facts<M>, new: &Facts<M>, patches: &mut Vec<Patch<M>>, index: usize) {
    if let Some(changes) = diff_facts(old, new) {
        patches.push(Patch::new(index, PatchKind::Facts(changes)));
    }
}

fn diff_cached<M: 'static>(
    old: &CachedNode<M>,
    new: &CachedNode<M>,
    patches: &mut Vec<Patch<M>>,
    index: usize,
) {
    let previous = old.force();
    if old.same_identity(new) {
        new.adopt(previous);
        if new.force().ptr_eq(previous) {
            return;
        }
    }

    let mut nested = Vec::new();
    diff_node(previous, new.force(), &mut nested, 0);
    if !nested.is_empty() {
        patches.push(Patch::new(index, PatchKind::Cached(nested)));
    }
}

/// Flattens nested mapped wrappers into their mapper list, outermost first,
/// and the innermost child.
pub(crate) fn unwrap_mapped<M>(node: &VNode<M>) -> (Vec<&Mapper<M>>, &VNode<M>) {
    let mut mappers = Vec::new();
    let mut current = node;
    while let VNodeKind::Mapped(mapped) = current.kind() {
        mappers.push(&mapped.mapper);
        current = &mapped.child;
    }
    (mappers, current)
}

fn diff_mapped<M: 'static>(
    x: &VNode<M>,
    y: &VNode<M>,
    patches: &mut Vec<Patch<M>>,
    index: usize,
) {
    let (x_mappers, x_child) = unwrap_mapped(x);
    let (y_mappers, y_child) = unwrap_mapped(y);

    if x_mappers.len() != y_mappers.len() {
        redraw(y, patches, index);
        return;
    }

    let unchanged = x_mappers
        .iter()
        .zip(&y_mappers)
        .all(|(a, b)| Rc::ptr_eq(a, b));
    if !unchanged {
        let chain = y_mappers.into_iter().map(Rc::clone).collect();
        patches.push(Patch::new(index, PatchKind::Mappers(chain)));
    }

    diff_node(x_child, y_child, patches, index + x_mappers.len());
}

fn diff_children<M: 'static>(
    xs: &[VNode<M>],
    ys: &[VNode<M>],
    patches: &mut Vec<Patch<M>>,
    root_index: usize,
) {
    let (x_len, y_len) = (xs.len(), ys.len());
    if x_len > y_len {
        patches.push(Patch::new(
            root_index,
            PatchKind::RemoveLast {
                from: y_len,
                count: x_len - y_len,
            },
        ));
    } else if x_len < y_len {
        patches.push(Patch::new(
            root_index,
            PatchKind::Append {
                from: x_len,
                children: ys[x_len..].to_vec(),
            },
        ));
    }

    let mut index = root_index;
    for (x, y) in xs.iter().zip(ys) {
        index += 1;
        diff_node(x, y, patches, index);
        index += x.descendants();
    }
}

#[cfg(test)]
#[path = "tests/diff_tests.rs"]
mod tests;
