//! Keyed child reconciliation.
//!
//! Walks both child lists with one element of look-ahead on each side, which
//! recognizes single insertions, removals and adjacent swaps in place. When
//! neither look-ahead helps the walk stops, the remaining old children are
//! removed and the remaining new children appended. A removal and an
//! insertion under the same key are merged into a move, whichever comes
//! first, so a child that changes position keeps its real node.

use crate::collections::map;
use crate::diff::diff_node;
use crate::patch::{Move, Patch, PatchKind, Reorder, ReorderEntry};
use crate::vnode::VNode;

/// Appended to a key that is already in use on the same side.
pub const DUPLICATE_KEY_SUFFIX: &str = "_arbor_dup";

enum Pending<M> {
    /// Inserted first; waiting for a matching removal.
    Inserted { vnode: VNode<M>, entry: usize },
    /// Removed first; `slot` is the position of its `Remove` patch.
    Removed {
        vnode: VNode<M>,
        index: usize,
        slot: usize,
    },
    Moved,
}

struct KeyedDiff<M> {
    local: Vec<Patch<M>>,
    changes: map::HashMap<String, Pending<M>>,
    inserts: Vec<(usize, usize)>,
    end_inserts: Vec<usize>,
    entries: Vec<ReorderEntry<M>>,
}

enum InsertAt {
    Position(usize),
    End,
}

impl<M: 'static> KeyedDiff<M> {
    fn new() -> Self {
        Self {
            local: Vec::new(),
            changes: map::HashMap::default(),
            inserts: Vec::new(),
            end_inserts: Vec::new(),
            entries: Vec::new(),
        }
    }

    fn push_insert(&mut self, at: InsertAt, entry: usize) {
        match at {
            InsertAt::Position(position) => self.inserts.push((position, entry)),
            InsertAt::End => self.end_inserts.push(entry),
        }
    }

    fn insert(&mut self, key: &str, vnode: &VNode<M>, at: InsertAt) {
        let mut key = key.to_owned();
        loop {
            match self.changes.get(&key) {
                None => {
                    let entry = self.entries.len();
                    self.entries.push(ReorderEntry::Render(vnode.clone()));
                    self.push_insert(at, entry);
                    let pending = Pending::Inserted {
                        vnode: vnode.clone(),
                        entry,
                    };
                    self.changes.insert(key, pending);
                    return;
                }
                Some(Pending::Removed { .. }) => {
                    let Some(Pending::Removed {
                        vnode: old,
                        index,
                        slot,
                    }) = self.changes.insert(key, Pending::Moved)
                    else {
                        unreachable!("pending removal vanished");
                    };
                    let entry = self.entries.len();
                    self.entries.push(ReorderEntry::Move);
                    self.push_insert(at, entry);
                    let mut patches = Vec::new();
                    diff_node(&old, vnode, &mut patches, index);
                    self.local[slot].kind = PatchKind::Remove(Some(Move { entry, patches }));
                    return;
                }
                Some(_) => key.push_str(DUPLICATE_KEY_SUFFIX),
            }
        }
    }

    fn remove(&mut self, key: &str, vnode: &VNode<M>, index: usize) {
        let mut key = key.to_owned();
        loop {
            match self.changes.get(&key) {
                None => {
                    let slot = self.local.len();
                    self.local.push(Patch::new(index, PatchKind::Remove(None)));
                    let pending = Pending::Removed {
                        vnode: vnode.clone(),
                        index,
                        slot,
                    };
                    self.changes.insert(key, pending);
                    return;
                }
                Some(Pending::Inserted { .. }) => {
                    let Some(Pending::Inserted { vnode: new, entry }) =
                        self.changes.insert(key, Pending::Moved)
                    else {
                        unreachable!("pending insertion vanished");
                    };
                    self.entries[entry] = ReorderEntry::Move;
                    let mut patches = Vec::new();
                    diff_node(vnode, &new, &mut patches, index);
                    self.local.push(Patch::new(
                        index,
                        PatchKind::Remove(Some(Move { entry, patches })),
                    ));
                    return;
                }
                Some(_) => key.push_str(DUPLICATE_KEY_SUFFIX),
            }
        }
    }
}

pub(crate) fn diff_keyed<M: 'static>(
    xs: &[(String, VNode<M>)],
    ys: &[(String, VNode<M>)],
    patches: &mut Vec<Patch<M>>,
    root_index: usize,
) {
    let mut state = KeyedDiff::new();
    let (x_len, y_len) = (xs.len(), ys.len());
    let (mut x_index, mut y_index) = (0, 0);
    let mut index = root_index;

    while x_index < x_len && y_index < y_len {
        let (x_key, x_node) = (&xs[x_index].0, &xs[x_index].1);
        let (y_key, y_node) = (&ys[y_index].0, &ys[y_index].1);

        if x_key == y_key {
            index += 1;
            diff_node(x_node, y_node, &mut state.local, index);
            index += x_node.descendants();
            x_index += 1;
            y_index += 1;
            continue;
        }

        let x_next = xs.get(x_index + 1);
        let y_next = ys.get(y_index + 1);
        let old_match = x_next.map_or(false, |(key, _)| key == y_key);
        let new_match = y_next.map_or(false, |(key, _)| key == x_key);

        match (x_next, y_next) {
            // Adjacent swap: y moves up from behind x.
            (Some((_, x_next_node)), Some((_, y_next_node))) if old_match && new_match => {
                index += 1;
                diff_node(x_node, y_next_node, &mut state.local, index);
                state.insert(y_key, y_node, InsertAt::Position(y_index));
                index += x_node.descendants();
                index += 1;
                state.remove(y_key, x_next_node, index);
                index += x_next_node.descendants();
                x_index += 2;
                y_index += 2;
            }
            (_, Some((_, y_next_node))) if new_match => {
                index += 1;
                state.insert(y_key, y_node, InsertAt::Position(y_index));
                diff_node(x_node, y_next_node, &mut state.local, index);
                index += x_node.descendants();
                x_index += 1;
                y_index += 2;
            }
            (Some((_, x_next_node)), _) if old_match => {
                index += 1;
                state.remove(x_key, x_node, index);
                index += x_node.descendants();
                index += 1;
                diff_node(x_next_node, y_node, &mut state.local, index);
                index += x_next_node.descendants();
                x_index += 2;
                y_index += 1;
            }
            (Some((x_next_key, x_next_node)), Some((y_next_key, y_next_node)))
                if x_next_key == y_next_key =>
            {
                index += 1;
                state.remove(x_key, x_node, index);
                state.insert(y_key, y_node, InsertAt::Position(y_index));
                index += x_node.descendants();
                index += 1;
                diff_node(x_next_node, y_next_node, &mut state.local, index);
                index += x_next_node.descendants();
                x_index += 2;
                y_index += 2;
            }
            _ => break,
        }
    }

    for (key, node) in &xs[x_index..] {
        index += 1;
        state.remove(key, node, index);
        index += node.descendants();
    }
    for (key, node) in &ys[y_index..] {
        state.insert(key, node, InsertAt::End);
    }

    if !state.local.is_empty() || !state.inserts.is_empty() || !state.end_inserts.is_empty() {
        patches.push(Patch::new(
            root_index,
            PatchKind::Reorder(Reorder {
                patches: state.local,
                inserts: state.inserts,
                end_inserts: state.end_inserts,
                entries: state.entries,
            }),
        ));
    }
}

#[cfg(test)]
#[path = "tests/keyed_tests.rs"]
mod tests;
