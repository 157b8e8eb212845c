// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node creation, destruction, child-list edits, and attachment.

use super::NodeId;
use super::behavior::{ParentData, RenderBox};
use crate::dirty;
use crate::id::INVALID;
use crate::pipeline::PipelineOwner;

impl PipelineOwner {
    /// Creates a detached, parentless node.
    pub fn create_node(&mut self, behavior: impl RenderBox) -> NodeId {
        self.create_node_boxed(Box::new(behavior))
    }

    /// Creates a detached, parentless node from a boxed behavior.
    pub fn create_node_boxed(&mut self, behavior: Box<dyn RenderBox>) -> NodeId {
        let id = self.nodes.insert(behavior);
        tracing::trace!(node = id.idx, type_name = self.nodes.type_name(id), "node created");
        id
    }

    /// Destroys a parentless node and its whole subtree, releasing their
    /// layers and removing them from the dirty queues. Handles to destroyed
    /// nodes become stale.
    ///
    /// # Panics
    ///
    /// Panics if the node still has a parent.
    pub fn destroy_node(&mut self, id: NodeId) {
        self.nodes.validate(id);
        assert!(
            self.nodes.parent[id.idx as usize] == INVALID,
            "{} must be removed from its parent before it is destroyed",
            self.describe_node(id)
        );
        if self.root == Some(id) {
            self.set_root(None);
        }
        let subtree: Vec<NodeId> = self.nodes.descendants(id).collect();
        for node in subtree.into_iter().rev() {
            let i = node.idx as usize;
            if self.nodes.parent[i] != INVALID {
                self.nodes.unlink_child(node.idx);
            }
            self.dirty.remove_key(node.idx);
            if let Some(layer) = self.nodes.layer[i].take() {
                self.release_layer(layer);
            }
            self.nodes.free(node);
        }
        tracing::trace!(node = id.idx, "subtree destroyed");
    }

    fn release_layer(&mut self, layer: crate::id::LayerId) {
        if !self.layers.is_alive(layer) {
            return;
        }
        if self.layers.parent(layer).is_some() {
            self.layers.remove(layer);
        } else if self.layers.is_attached(layer) {
            self.layers.detach(layer);
        }
        self.layers.remove_all_children(layer);
        self.layers.destroy_layer(layer);
    }

    /// Appends `child` to `parent`'s child list.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        let after = self.nodes.last_child(parent);
        self.insert_child(parent, child, after);
    }

    /// Inserts `child` into `parent`'s child list after `after`, or first
    /// when `after` is `None`.
    ///
    /// # Panics
    ///
    /// Panics if `child` already has a parent, if `after` is not a child of
    /// `parent`, or if `child` is `parent` or one of its ancestors.
    pub fn insert_child(&mut self, parent: NodeId, child: NodeId, after: Option<NodeId>) {
        self.nodes.validate(parent);
        self.nodes.validate(child);
        assert!(
            !self.nodes.is_self_or_ancestor(child.idx, parent.idx),
            "cannot insert {} into its own subtree",
            self.describe_node(child)
        );
        let after = after.map_or(INVALID, |a| {
            self.nodes.validate(a);
            a.idx
        });
        self.nodes.link_child(parent.idx, child.idx, after);
        self.adopt_child(parent, child);
    }

    /// Removes `child` from `parent`. The child keeps its subtree and can be
    /// added elsewhere or destroyed.
    ///
    /// # Panics
    ///
    /// Panics if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes.validate(parent);
        self.nodes.validate(child);
        assert!(
            self.nodes.parent[child.idx as usize] == parent.idx,
            "{} is not a child of {}",
            self.describe_node(child),
            self.describe_node(parent)
        );
        self.nodes.unlink_child(child.idx);
        self.drop_child(parent, child);
    }

    /// Removes every child of `parent`.
    pub fn remove_all_children(&mut self, parent: NodeId) {
        let children: Vec<NodeId> = self.nodes.children(parent).collect();
        for child in children {
            self.remove_child(parent, child);
        }
    }

    /// Moves `child` within `parent`'s child list so that it follows
    /// `after`, or comes first when `after` is `None`.
    pub fn move_child(&mut self, parent: NodeId, child: NodeId, after: Option<NodeId>) {
        self.nodes.validate(parent);
        self.nodes.validate(child);
        assert!(
            self.nodes.parent[child.idx as usize] == parent.idx,
            "{} is not a child of {}",
            self.describe_node(child),
            self.describe_node(parent)
        );
        let current = self.nodes.opt_id(self.nodes.prev_sibling[child.idx as usize]);
        if current == after {
            return;
        }
        self.nodes.unlink_child(child.idx);
        self.nodes.link_child(parent.idx, child.idx, after.map_or(INVALID, |a| a.idx));
        self.mark_needs_layout(parent);
    }

    fn adopt_child(&mut self, parent: NodeId, child: NodeId) {
        self.mark_needs_layout(parent);
        self.mark_needs_compositing_bits_update(parent);
        self.redepth(child.idx, self.nodes.depth[parent.idx as usize] + 1);
        if self.nodes.flags[parent.idx as usize].attached {
            self.attach_subtree(child.idx);
        }
    }

    fn drop_child(&mut self, parent: NodeId, child: NodeId) {
        self.clean_relayout_boundary(child.idx);
        self.nodes.parent_data[child.idx as usize] = ParentData::default();
        self.redepth(child.idx, 0);
        if self.nodes.flags[child.idx as usize].attached {
            self.detach_subtree(child.idx);
        }
        self.mark_needs_layout(parent);
        self.mark_needs_compositing_bits_update(parent);
    }

    fn redepth(&mut self, idx: u32, depth: u32) {
        let mut stack = vec![(idx, depth)];
        while let Some((n, d)) = stack.pop() {
            self.nodes.depth[n as usize] = d;
            let mut child = self.nodes.first_child[n as usize];
            while child != INVALID {
                stack.push((child, d + 1));
                child = self.nodes.next_sibling[child as usize];
            }
        }
    }

    /// Attaches a parentless node and its subtree to this owner. Pending
    /// dirty marks are re-queued.
    ///
    /// # Panics
    ///
    /// Panics if the node has a parent; attachment follows the parent.
    pub fn attach(&mut self, id: NodeId) {
        self.nodes.validate(id);
        assert!(
            self.nodes.parent[id.idx as usize] == INVALID,
            "only parentless nodes can be attached directly"
        );
        self.attach_subtree(id.idx);
    }

    /// Detaches a parentless node and its subtree. Detached nodes are kept
    /// out of the dirty queues until they are attached again.
    ///
    /// # Panics
    ///
    /// Panics if the node has a parent.
    pub fn detach(&mut self, id: NodeId) {
        self.nodes.validate(id);
        assert!(
            self.nodes.parent[id.idx as usize] == INVALID,
            "only parentless nodes can be detached directly"
        );
        self.detach_subtree(id.idx);
    }

    fn attach_subtree(&mut self, idx: u32) {
        let subtree: Vec<NodeId> = self.nodes.descendants(self.nodes.id_at(idx)).collect();
        for node in subtree {
            let i = node.idx as usize;
            if self.nodes.flags[i].attached {
                continue;
            }
            self.nodes.flags[i].attached = true;
            let flags = self.nodes.flags[i];
            if flags.needs_layout && self.nodes.relayout_boundary[i] != INVALID {
                self.nodes.flags[i].needs_layout = false;
                self.mark_needs_layout(node);
            }
            if flags.needs_compositing_bits_update {
                self.nodes.flags[i].needs_compositing_bits_update = false;
                self.mark_needs_compositing_bits_update(node);
            }
            if flags.needs_paint && self.nodes.layer[i].is_some() {
                self.nodes.flags[i].needs_paint = false;
                self.mark_needs_paint(node);
            }
        }
    }

    fn detach_subtree(&mut self, idx: u32) {
        let subtree: Vec<NodeId> = self.nodes.descendants(self.nodes.id_at(idx)).collect();
        for node in subtree {
            self.nodes.flags[node.idx as usize].attached = false;
            self.dirty.remove_key(node.idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Size;

    use crate::pipeline::PipelineOwner;
    use crate::testing::{self, Column, Leaf};

    #[test]
    fn insert_and_move_keep_order() {
        let mut owner = PipelineOwner::new();
        let parent = owner.create_node(Column::new());
        let a = owner.create_node(Leaf::new(Size::ZERO));
        let b = owner.create_node(Leaf::new(Size::ZERO));
        let c = owner.create_node(Leaf::new(Size::ZERO));
        owner.add_child(parent, a);
        owner.add_child(parent, c);
        owner.insert_child(parent, b, Some(a));
        assert_eq!(owner.nodes().children(parent).collect::<Vec<_>>(), vec![a, b, c]);
        assert_eq!(owner.nodes().depth(b), 1);

        owner.move_child(parent, c, None);
        assert_eq!(owner.nodes().children(parent).collect::<Vec<_>>(), vec![c, a, b]);

        owner.remove_child(parent, a);
        assert_eq!(owner.nodes().parent(a), None);
        assert_eq!(owner.nodes().depth(a), 0);
        assert_eq!(owner.nodes().child_count(parent), 2);
    }

    #[test]
    #[should_panic(expected = "into its own subtree")]
    fn cycles_are_rejected() {
        let mut owner = PipelineOwner::new();
        let a = owner.create_node(Column::new());
        let b = owner.create_node(Column::new());
        owner.add_child(a, b);
        owner.add_child(b, a);
    }

    #[test]
    fn moved_child_is_laid_out_at_new_position() {
        let mut owner = PipelineOwner::new();
        let root = testing::view(&mut owner, Size::new(100.0, 100.0));
        let column = owner.create_node(Column::new());
        let a = owner.create_node(Leaf::new(Size::new(10.0, 10.0)));
        let b = owner.create_node(Leaf::new(Size::new(10.0, 20.0)));
        owner.add_child(root, column);
        owner.add_child(column, a);
        owner.add_child(column, b);
        testing::frame(&mut owner);
        assert_eq!(owner.nodes().offset(b).y, 10.0);

        owner.move_child(column, b, None);
        testing::frame(&mut owner);
        assert_eq!(owner.nodes().offset(b).y, 0.0);
        assert_eq!(owner.nodes().offset(a).y, 20.0);
    }

    #[test]
    fn destroyed_subtree_handles_are_stale() {
        let mut owner = PipelineOwner::new();
        let root = testing::view(&mut owner, Size::new(100.0, 100.0));
        let column = owner.create_node(Column::boundary());
        let leaf = owner.create_node(Leaf::new(Size::new(10.0, 10.0)));
        owner.add_child(root, column);
        owner.add_child(column, leaf);
        testing::frame(&mut owner);
        let layer = owner.nodes().layer(column);
        assert!(layer.is_some_and(|l| owner.layers().is_alive(l)));

        owner.remove_child(root, column);
        owner.destroy_node(column);
        assert!(!owner.nodes().is_alive(column));
        assert!(!owner.nodes().is_alive(leaf));
        assert!(layer.is_some_and(|l| !owner.layers().is_alive(l)));
        testing::frame(&mut owner);
        assert_eq!(owner.nodes().node_count(), 1);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn stale_handle_panics() {
        let mut owner = PipelineOwner::new();
        let leaf = owner.create_node(Leaf::new(Size::ZERO));
        owner.destroy_node(leaf);
        owner.mark_needs_layout(leaf);
    }

    #[test]
    fn reattached_subtree_requeues_pending_work() {
        let mut owner = PipelineOwner::new();
        let root = testing::view(&mut owner, Size::new(100.0, 100.0));
        let column = owner.create_node(Column::boundary());
        let leaf = owner.create_node(Leaf::new(Size::new(10.0, 10.0)));
        owner.add_child(root, column);
        owner.add_child(column, leaf);
        testing::frame(&mut owner);

        // A detached subtree keeps its marks but is not flushed.
        owner.remove_child(root, column);
        assert!(!owner.nodes().is_attached(leaf));
        owner.mark_needs_layout(column);
        owner.mark_needs_paint(column);
        assert_eq!(owner.flush_layout(), 1, "only the root, dirtied by the removal");
        assert!(owner.nodes().needs_layout(column));

        // Re-attaching puts the column back in the queues; its layer
        // survives because the node still holds it.
        owner.add_child(root, column);
        assert!(owner.nodes().is_attached(leaf));
        testing::frame(&mut owner);
        assert!(!owner.nodes().needs_layout(column));
        assert!(!owner.nodes().needs_paint(column));
        assert!(owner.nodes().layer(column).is_some_and(|l| owner.layers().is_attached(l)));
    }
}
