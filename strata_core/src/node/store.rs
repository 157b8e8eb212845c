// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, child lists, and per-node
//! layout/paint state.

use std::any::Any;
use std::collections::HashMap;

use kurbo::{Size, Vec2};

use super::behavior::{ParentData, RenderBox};
use super::intrinsics::IntrinsicDimension;
use super::traverse::{Children, Descendants};
use crate::constraints::BoxConstraints;
use crate::id::{INVALID, LayerId, NodeId};

/// Per-node dirty and lifecycle flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct NodeFlags {
    pub(crate) alive: bool,
    pub(crate) attached: bool,
    pub(crate) needs_layout: bool,
    pub(crate) needs_paint: bool,
    pub(crate) needs_compositing_bits_update: bool,
    pub(crate) needs_compositing: bool,
    pub(crate) is_repaint_boundary: bool,
    pub(crate) sized_by_parent: bool,
    /// Set while the node's own layout callbacks run.
    pub(crate) doing_layout: bool,
    /// Set while the node runs a layout callback that may mutate its subtree.
    pub(crate) doing_layout_with_callback: bool,
    /// Set while the node's own paint callback runs.
    pub(crate) doing_paint: bool,
    /// Whether the parent asked to read this node's size during its last layout.
    pub(crate) parent_uses_size: bool,
}

impl NodeFlags {
    fn fresh(behavior: &dyn RenderBox) -> Self {
        let is_repaint_boundary = behavior.is_repaint_boundary();
        Self {
            alive: true,
            needs_layout: true,
            needs_paint: true,
            needs_compositing_bits_update: false,
            needs_compositing: is_repaint_boundary || behavior.always_needs_compositing(),
            is_repaint_boundary,
            sized_by_parent: behavior.sized_by_parent(),
            ..Self::default()
        }
    }
}

/// Cached intrinsic dimensions and baselines, cleared on every
/// [`mark_needs_layout`](crate::pipeline::PipelineOwner::mark_needs_layout).
#[derive(Clone, Debug, Default)]
pub(crate) struct MeasureCache {
    pub(crate) intrinsics: HashMap<(IntrinsicDimension, u64), f64>,
    /// Indexed by [`TextBaseline`](super::behavior::TextBaseline); the outer
    /// `Option` distinguishes "not computed" from "no baseline".
    pub(crate) baselines: [Option<Option<f64>>; 2],
}

impl MeasureCache {
    pub(crate) fn clear(&mut self) {
        self.intrinsics.clear();
        self.baselines = [None; 2];
    }
}

/// Struct-of-arrays storage for all render nodes.
///
/// Nodes are addressed by [`NodeId`] handles. Each node occupies a slot in
/// parallel arrays; destroyed nodes are recycled via a free list, and
/// generation counters prevent stale handle access. Child lists are intrusive:
/// every node carries its parent, first/last child and sibling indices.
///
/// The store is read-only from outside the crate. Structural edits go through
/// [`PipelineOwner`](crate::pipeline::PipelineOwner), which keeps the dirty
/// queues and attachment state consistent.
#[derive(Debug)]
pub struct NodeStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) last_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,
    pub(crate) child_count: Vec<u32>,
    pub(crate) depth: Vec<u32>,

    // -- Layout and paint state --
    pub(crate) flags: Vec<NodeFlags>,
    pub(crate) constraints: Vec<Option<BoxConstraints>>,
    pub(crate) size: Vec<Option<Size>>,
    pub(crate) relayout_boundary: Vec<u32>,
    pub(crate) layer: Vec<Option<LayerId>>,
    pub(crate) parent_data: Vec<ParentData>,
    pub(crate) measure: Vec<MeasureCache>,

    // -- Behavior --
    pub(crate) behavior: Vec<Option<Box<dyn RenderBox>>>,
    pub(crate) type_name: Vec<&'static str>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    /// Creates an empty node store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            last_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            child_count: Vec::new(),
            depth: Vec::new(),
            flags: Vec::new(),
            constraints: Vec::new(),
            size: Vec::new(),
            relayout_boundary: Vec::new(),
            layer: Vec::new(),
            parent_data: Vec::new(),
            measure: Vec::new(),
            behavior: Vec::new(),
            type_name: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    // -- Allocation --

    /// Allocates a slot for `behavior`. The node starts detached, parentless,
    /// and dirty for layout and paint.
    pub(crate) fn insert(&mut self, behavior: Box<dyn RenderBox>) -> NodeId {
        let flags = NodeFlags::fresh(behavior.as_ref());
        let type_name = behavior.type_name();
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.last_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.child_count[i] = 0;
            self.depth[i] = 0;
            self.flags[i] = flags;
            self.constraints[i] = None;
            self.size[i] = None;
            self.relayout_boundary[i] = INVALID;
            self.layer[i] = None;
            self.parent_data[i] = ParentData::default();
            self.measure[i].clear();
            self.behavior[i] = Some(behavior);
            self.type_name[i] = type_name;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.last_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.child_count.push(0);
            self.depth.push(0);
            self.flags.push(flags);
            self.constraints.push(None);
            self.size.push(None);
            self.relayout_boundary.push(INVALID);
            self.layer.push(None);
            self.parent_data.push(ParentData::default());
            self.measure.push(MeasureCache::default());
            self.behavior.push(Some(behavior));
            self.type_name.push(type_name);
            self.generation.push(0);
            idx
        };
        self.id_at(idx)
    }

    /// Releases a slot. The node must already be unlinked from its parent and
    /// have no children.
    pub(crate) fn free(&mut self, id: NodeId) -> Option<Box<dyn RenderBox>> {
        self.validate(id);
        let i = id.idx as usize;
        debug_assert!(
            self.parent[i] == INVALID && self.first_child[i] == INVALID,
            "freed node must be unlinked"
        );
        self.flags[i] = NodeFlags::default();
        self.layer[i] = None;
        self.parent_data[i] = ParentData::default();
        self.measure[i].clear();
        self.generation[i] += 1;
        self.free_list.push(id.idx);
        self.behavior[i].take()
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.flags[id.idx as usize].alive
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology queries --

    /// Returns the parent of `id`, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.opt_id(self.parent[id.idx as usize])
    }

    /// Returns the first child of `id`.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.opt_id(self.first_child[id.idx as usize])
    }

    /// Returns the last child of `id`.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.opt_id(self.last_child[id.idx as usize])
    }

    /// Returns the sibling before `child` in its parent's child list.
    #[must_use]
    pub fn child_before(&self, child: NodeId) -> Option<NodeId> {
        self.validate(child);
        self.opt_id(self.prev_sibling[child.idx as usize])
    }

    /// Returns the sibling after `child` in its parent's child list.
    #[must_use]
    pub fn child_after(&self, child: NodeId) -> Option<NodeId> {
        self.validate(child);
        self.opt_id(self.next_sibling[child.idx as usize])
    }

    /// Returns the number of children of `id`.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.validate(id);
        self.child_count[id.idx as usize] as usize
    }

    /// Returns an iterator over the children of `id`, first to last.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns an iterator over `id` and all of its descendants in
    /// depth-first pre-order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        self.validate(id);
        Descendants::new(self, id.idx)
    }

    /// Returns the depth of `id`: zero for a parentless node, otherwise one
    /// more than its parent.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> u32 {
        self.validate(id);
        self.depth[id.idx as usize]
    }

    // -- State queries --

    /// Returns the constraints from the node's most recent layout.
    #[must_use]
    pub fn constraints(&self, id: NodeId) -> Option<BoxConstraints> {
        self.validate(id);
        self.constraints[id.idx as usize]
    }

    /// Returns the size from the node's most recent layout.
    #[must_use]
    pub fn size(&self, id: NodeId) -> Option<Size> {
        self.validate(id);
        self.size[id.idx as usize]
    }

    /// Returns the paint offset stored in the node's parent data.
    #[must_use]
    pub fn offset(&self, id: NodeId) -> Vec2 {
        self.validate(id);
        self.parent_data[id.idx as usize].offset
    }

    /// Returns the parent-specific payload stored for `id`, if it has type `T`.
    #[must_use]
    pub fn parent_data<T: Any>(&self, id: NodeId) -> Option<&T> {
        self.validate(id);
        self.parent_data[id.idx as usize].get::<T>()
    }

    /// Returns the nearest relayout boundary at or above `id`, if the node
    /// has been laid out.
    #[must_use]
    pub fn relayout_boundary(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.opt_id(self.relayout_boundary[id.idx as usize])
    }

    /// Returns the offset layer owned by a repaint boundary.
    #[must_use]
    pub fn layer(&self, id: NodeId) -> Option<LayerId> {
        self.validate(id);
        self.layer[id.idx as usize]
    }

    /// Whether the node must be laid out before the next paint.
    #[must_use]
    pub fn needs_layout(&self, id: NodeId) -> bool {
        self.validate(id);
        self.flags[id.idx as usize].needs_layout
    }

    /// Whether the node must be repainted.
    #[must_use]
    pub fn needs_paint(&self, id: NodeId) -> bool {
        self.validate(id);
        self.flags[id.idx as usize].needs_paint
    }

    /// Whether the node's compositing bits are stale.
    #[must_use]
    pub fn needs_compositing_bits_update(&self, id: NodeId) -> bool {
        self.validate(id);
        self.flags[id.idx as usize].needs_compositing_bits_update
    }

    /// Whether the node or a descendant paints into its own layer.
    #[must_use]
    pub fn needs_compositing(&self, id: NodeId) -> bool {
        self.validate(id);
        self.flags[id.idx as usize].needs_compositing
    }

    /// Whether the node is a repaint boundary.
    #[must_use]
    pub fn is_repaint_boundary(&self, id: NodeId) -> bool {
        self.validate(id);
        self.flags[id.idx as usize].is_repaint_boundary
    }

    /// Whether the node's size depends only on its constraints.
    #[must_use]
    pub fn sized_by_parent(&self, id: NodeId) -> bool {
        self.validate(id);
        self.flags[id.idx as usize].sized_by_parent
    }

    /// Whether the node is attached to its pipeline owner.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.validate(id);
        self.flags[id.idx as usize].attached
    }

    /// Returns the node's behavior, or `None` while one of its own callbacks
    /// is running.
    #[must_use]
    pub fn behavior(&self, id: NodeId) -> Option<&dyn RenderBox> {
        self.validate(id);
        self.behavior[id.idx as usize].as_deref()
    }

    /// Returns the node's behavior downcast to `T`.
    #[must_use]
    pub fn behavior_as<T: RenderBox>(&self, id: NodeId) -> Option<&T> {
        let behavior: &dyn Any = self.behavior(id)?;
        behavior.downcast_ref::<T>()
    }

    /// Returns the short type name of the node's behavior.
    #[must_use]
    pub fn type_name(&self, id: NodeId) -> &'static str {
        self.validate(id);
        self.type_name[id.idx as usize]
    }

    // -- Internal helpers --

    /// Builds a handle for a live slot index.
    #[inline]
    pub(crate) fn id_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    #[inline]
    pub(crate) fn opt_id(&self, idx: u32) -> Option<NodeId> {
        (idx != INVALID).then(|| self.id_at(idx))
    }

    /// Panics if `id` is stale.
    #[inline]
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            id.idx < self.len
                && self.generation[id.idx as usize] == id.generation
                && self.flags[id.idx as usize].alive,
            "stale NodeId: {id:?} (current gen: {})",
            self.generation.get(id.idx as usize).copied().unwrap_or(0)
        );
    }

    /// Inserts `child` into `parent`'s child list after `after`, or at the
    /// front when `after` is [`INVALID`]. Depth is not updated here.
    pub(crate) fn link_child(&mut self, parent: u32, child: u32, after: u32) {
        let (p, c) = (parent as usize, child as usize);
        assert!(self.parent[c] == INVALID, "child already has a parent");
        assert!(parent != child, "a node cannot be its own child");
        self.parent[c] = parent;
        if after == INVALID {
            let first = self.first_child[p];
            self.prev_sibling[c] = INVALID;
            self.next_sibling[c] = first;
            if first == INVALID {
                self.last_child[p] = child;
            } else {
                self.prev_sibling[first as usize] = child;
            }
            self.first_child[p] = child;
        } else {
            assert!(
                self.parent[after as usize] == parent,
                "insertion point is not a child of this parent"
            );
            let next = self.next_sibling[after as usize];
            self.prev_sibling[c] = after;
            self.next_sibling[c] = next;
            self.next_sibling[after as usize] = child;
            if next == INVALID {
                self.last_child[p] = child;
            } else {
                self.prev_sibling[next as usize] = child;
            }
        }
        self.child_count[p] += 1;
    }

    /// Detaches `child` from its parent's child list.
    pub(crate) fn unlink_child(&mut self, child: u32) {
        let c = child as usize;
        let p = self.parent[c];
        assert!(p != INVALID, "node has no parent");
        let prev = self.prev_sibling[c];
        let next = self.next_sibling[c];
        if prev == INVALID {
            self.first_child[p as usize] = next;
        } else {
            self.next_sibling[prev as usize] = next;
        }
        if next == INVALID {
            self.last_child[p as usize] = prev;
        } else {
            self.prev_sibling[next as usize] = prev;
        }
        self.parent[c] = INVALID;
        self.prev_sibling[c] = INVALID;
        self.next_sibling[c] = INVALID;
        self.child_count[p as usize] -= 1;
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub(crate) fn is_self_or_ancestor(&self, ancestor: u32, node: u32) -> bool {
        let mut cursor = node;
        while cursor != INVALID {
            if cursor == ancestor {
                return true;
            }
            cursor = self.parent[cursor as usize];
        }
        false
    }

    /// Removes the behavior from its slot for the duration of a callback.
    pub(crate) fn take_behavior(&mut self, id: NodeId) -> Option<Box<dyn RenderBox>> {
        self.validate(id);
        self.behavior[id.idx as usize].take()
    }

    pub(crate) fn restore_behavior(&mut self, id: NodeId, behavior: Box<dyn RenderBox>) {
        debug_assert!(
            self.behavior[id.idx as usize].is_none(),
            "behavior slot already occupied"
        );
        self.behavior[id.idx as usize] = Some(behavior);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Leaf;

    fn store_with(n: usize) -> (NodeStore, Vec<NodeId>) {
        let mut store = NodeStore::new();
        let ids = (0..n)
            .map(|_| store.insert(Box::new(Leaf::new(Size::ZERO))))
            .collect();
        (store, ids)
    }

    #[test]
    fn insert_and_free() {
        let (mut store, ids) = store_with(1);
        assert!(store.is_alive(ids[0]));
        assert_eq!(store.node_count(), 1);
        assert!(store.free(ids[0]).is_some());
        assert!(!store.is_alive(ids[0]));
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let (mut store, ids) = store_with(1);
        store.free(ids[0]);
        let reused = store.insert(Box::new(Leaf::new(Size::ZERO)));
        assert_eq!(reused.index(), ids[0].index());
        assert_ne!(reused.generation(), ids[0].generation());
        assert!(!store.is_alive(ids[0]));
        assert!(store.is_alive(reused));
    }

    #[test]
    fn link_maintains_order_and_ends() {
        let (mut store, ids) = store_with(4);
        let [p, a, b, c] = [ids[0], ids[1], ids[2], ids[3]];
        store.link_child(p.idx, b.idx, INVALID);
        store.link_child(p.idx, a.idx, INVALID);
        store.link_child(p.idx, c.idx, b.idx);

        let kids: Vec<_> = store.children(p).collect();
        assert_eq!(kids, vec![a, b, c]);
        assert_eq!(store.first_child(p), Some(a));
        assert_eq!(store.last_child(p), Some(c));
        assert_eq!(store.child_before(b), Some(a));
        assert_eq!(store.child_after(b), Some(c));
        assert_eq!(store.child_count(p), 3);
    }

    #[test]
    fn unlink_middle_and_ends() {
        let (mut store, ids) = store_with(4);
        let [p, a, b, c] = [ids[0], ids[1], ids[2], ids[3]];
        store.link_child(p.idx, a.idx, INVALID);
        store.link_child(p.idx, b.idx, a.idx);
        store.link_child(p.idx, c.idx, b.idx);

        store.unlink_child(b.idx);
        assert_eq!(store.children(p).collect::<Vec<_>>(), vec![a, c]);
        store.unlink_child(c.idx);
        assert_eq!(store.last_child(p), Some(a));
        store.unlink_child(a.idx);
        assert_eq!(store.first_child(p), None);
        assert_eq!(store.last_child(p), None);
        assert_eq!(store.child_count(p), 0);
        assert_eq!(store.parent(a), None);
    }

    #[test]
    fn descendants_visit_pre_order() {
        let (mut store, ids) = store_with(5);
        let [r, a, b, a1, a2] = [ids[0], ids[1], ids[2], ids[3], ids[4]];
        store.link_child(r.idx, a.idx, INVALID);
        store.link_child(r.idx, b.idx, a.idx);
        store.link_child(a.idx, a1.idx, INVALID);
        store.link_child(a.idx, a2.idx, a1.idx);

        let order: Vec<_> = store.descendants(r).collect();
        assert_eq!(order, vec![r, a, a1, a2, b]);
        let sub: Vec<_> = store.descendants(a).collect();
        assert_eq!(sub, vec![a, a1, a2]);
    }

    #[test]
    #[should_panic(expected = "child already has a parent")]
    fn double_link_panics() {
        let (mut store, ids) = store_with(3);
        store.link_child(ids[0].idx, ids[2].idx, INVALID);
        store.link_child(ids[1].idx, ids[2].idx, INVALID);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn stale_handle_panics_on_query() {
        let (mut store, ids) = store_with(1);
        store.free(ids[0]);
        let _ = store.size(ids[0]);
    }

    #[test]
    fn behavior_downcast() {
        let (store, ids) = store_with(1);
        assert!(store.behavior_as::<Leaf>(ids[0]).is_some());
        assert_eq!(store.type_name(ids[0]), "Leaf");
    }
}
