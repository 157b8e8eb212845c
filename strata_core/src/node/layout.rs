// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layout protocol: relayout boundaries, dirty marking, and the context
//! handed to [`RenderBox::perform_layout`](super::RenderBox::perform_layout).

use std::any::Any;

use kurbo::{Size, Vec2};

use super::behavior::{ParentData, TextBaseline};
use super::store::NodeStore;
use crate::constraints::BoxConstraints;
use crate::diagnostics::{ContractViolation, NodeError};
use crate::dirty;
use crate::id::{INVALID, NodeId};
use crate::pipeline::PipelineOwner;
use crate::trace::PhaseKind;

/// Which callback a [`LayoutCx`] was created for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LayoutMode {
    /// `perform_resize` of a node sized by its parent.
    Resize,
    /// `perform_layout` of a node that sizes itself.
    Layout,
    /// `perform_layout` of a node sized by its parent; the size is fixed.
    LayoutSizedByParent,
}

/// Context passed to [`perform_layout`](super::RenderBox::perform_layout)
/// and [`perform_resize`](super::RenderBox::perform_resize).
///
/// Gives the node its constraints, lets it set its size, and lays out its
/// children.
pub struct LayoutCx<'a> {
    owner: &'a mut PipelineOwner,
    node: NodeId,
    mode: LayoutMode,
}

impl std::fmt::Debug for LayoutCx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutCx")
            .field("node", &self.node)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl<'a> LayoutCx<'a> {
    pub(crate) fn new(owner: &'a mut PipelineOwner, node: NodeId, mode: LayoutMode) -> Self {
        Self { owner, node, mode }
    }

    /// The node being laid out.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Read access to the node tree.
    #[must_use]
    pub fn nodes(&self) -> &NodeStore {
        &self.owner.nodes
    }

    /// The constraints the node is being laid out with.
    #[must_use]
    pub fn constraints(&self) -> BoxConstraints {
        self.owner.nodes.constraints[self.node.idx as usize].unwrap_or_default()
    }

    /// The node's current size, if it has one.
    #[must_use]
    pub fn size(&self) -> Option<Size> {
        self.owner.nodes.size[self.node.idx as usize]
    }

    /// Sets the node's size.
    ///
    /// Nodes sized by their parent set it in `perform_resize`; every other
    /// node sets it in `perform_layout`.
    pub fn set_size(&mut self, size: Size) {
        if cfg!(debug_assertions) && self.mode == LayoutMode::LayoutSizedByParent {
            panic!(
                "{}",
                ContractViolation::SizeSetOutsidePhase {
                    node: self.owner.describe_node(self.node),
                    detail: "A node that is sized by its parent must set its size in perform_resize.",
                }
            );
        }
        self.owner.nodes.size[self.node.idx as usize] = Some(size);
    }

    /// The node's children, first to last.
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        self.owner.nodes.children(self.node).collect()
    }

    /// The node's first child.
    #[must_use]
    pub fn first_child(&self) -> Option<NodeId> {
        self.owner.nodes.first_child(self.node)
    }

    /// The sibling after `child`.
    #[must_use]
    pub fn child_after(&self, child: NodeId) -> Option<NodeId> {
        self.owner.nodes.child_after(child)
    }

    /// Number of children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.owner.nodes.child_count(self.node)
    }

    /// Lays out `child` with `constraints`.
    ///
    /// Pass `parent_uses_size = true` when this node's layout reads the
    /// child's size; otherwise the child becomes a relayout boundary and
    /// [`child_size`](Self::child_size) must not be called for it.
    ///
    /// # Panics
    ///
    /// Panics if `child` is not a child of this node.
    pub fn layout_child(&mut self, child: NodeId, constraints: BoxConstraints, parent_uses_size: bool) {
        self.assert_is_child(child);
        self.owner.layout_node(child, constraints, parent_uses_size);
    }

    /// The size of a child laid out with `parent_uses_size = true`.
    #[must_use]
    pub fn child_size(&self, child: NodeId) -> Size {
        self.assert_is_child(child);
        self.debug_assert_can_use_child_size(child);
        self.owner.nodes.size[child.idx as usize].unwrap_or(Size::ZERO)
    }

    /// Sets where the child is painted, relative to this node.
    pub fn set_child_offset(&mut self, child: NodeId, offset: Vec2) {
        self.assert_is_child(child);
        self.owner.nodes.parent_data[child.idx as usize].offset = offset;
    }

    /// The child's paint offset.
    #[must_use]
    pub fn child_offset(&self, child: NodeId) -> Vec2 {
        self.owner.nodes.offset(child)
    }

    /// The parent data this node keeps on `child`.
    pub fn parent_data_mut(&mut self, child: NodeId) -> &mut ParentData {
        self.assert_is_child(child);
        &mut self.owner.nodes.parent_data[child.idx as usize]
    }

    /// The typed payload this node keeps on `child`.
    #[must_use]
    pub fn parent_data<T: Any>(&self, child: NodeId) -> Option<&T> {
        self.owner.nodes.parent_data(child)
    }

    /// See [`PipelineOwner::min_intrinsic_width`].
    pub fn child_min_intrinsic_width(&mut self, child: NodeId, height: f64) -> f64 {
        self.owner.min_intrinsic_width(child, height)
    }

    /// See [`PipelineOwner::max_intrinsic_width`].
    pub fn child_max_intrinsic_width(&mut self, child: NodeId, height: f64) -> f64 {
        self.owner.max_intrinsic_width(child, height)
    }

    /// See [`PipelineOwner::min_intrinsic_height`].
    pub fn child_min_intrinsic_height(&mut self, child: NodeId, width: f64) -> f64 {
        self.owner.min_intrinsic_height(child, width)
    }

    /// See [`PipelineOwner::max_intrinsic_height`].
    pub fn child_max_intrinsic_height(&mut self, child: NodeId, width: f64) -> f64 {
        self.owner.max_intrinsic_height(child, width)
    }

    /// Baseline of a child laid out with `parent_uses_size = true`.
    pub fn child_distance_to_baseline(
        &mut self,
        child: NodeId,
        baseline: TextBaseline,
        only_real: bool,
    ) -> Option<f64> {
        self.assert_is_child(child);
        self.debug_assert_can_use_child_size(child);
        self.owner.get_distance_to_baseline(child, baseline, only_real)
    }

    /// Runs `callback` with mutable access to the pipeline while the
    /// subtree of this node may be mutated: children may be created, added,
    /// removed, and marked as needing layout.
    pub fn invoke_layout_callback<R>(
        &mut self,
        callback: impl FnOnce(&mut PipelineOwner, NodeId) -> R,
    ) -> R {
        let i = self.node.idx as usize;
        let previous = std::mem::replace(&mut self.owner.allow_mutations_root, self.node.idx);
        self.owner.nodes.flags[i].doing_layout_with_callback = true;
        let result = callback(self.owner, self.node);
        self.owner.nodes.flags[i].doing_layout_with_callback = false;
        self.owner.allow_mutations_root = previous;
        result
    }

    fn assert_is_child(&self, child: NodeId) {
        self.owner.nodes.validate(child);
        assert!(
            self.owner.nodes.parent[child.idx as usize] == self.node.idx,
            "{} is not a child of {}",
            self.owner.describe_node(child),
            self.owner.describe_node(self.node)
        );
    }

    fn debug_assert_can_use_child_size(&self, child: NodeId) {
        if cfg!(debug_assertions) && !self.owner.nodes.flags[child.idx as usize].parent_uses_size {
            panic!(
                "{}",
                ContractViolation::ChildSizeNotUsable {
                    parent: self.owner.describe_node(self.node),
                    child: self.owner.describe_node(child),
                }
            );
        }
    }
}

impl PipelineOwner {
    /// Marks the node as needing layout.
    ///
    /// Clears its intrinsic and baseline caches. A node that is its own
    /// relayout boundary is queued for the next [`flush_layout`]; any other
    /// node propagates the mark to its parent. If the cleared caches were in
    /// use, the parent depended on them and is marked as well.
    ///
    /// # Panics
    ///
    /// In debug builds, panics when called during a flush, unless the node
    /// is inside the subtree of a running
    /// [`invoke_layout_callback`](LayoutCx::invoke_layout_callback).
    ///
    /// [`flush_layout`]: Self::flush_layout
    pub fn mark_needs_layout(&mut self, id: NodeId) {
        self.nodes.validate(id);
        self.debug_assert_can_mutate(id);
        let i = id.idx as usize;
        let measure = &mut self.nodes.measure[i];
        let had_cache = !measure.intrinsics.is_empty() || measure.baselines.iter().any(Option::is_some);
        measure.clear();
        if had_cache && self.nodes.parent[i] != INVALID {
            self.mark_parent_needs_layout(id);
            return;
        }

        if self.nodes.flags[i].needs_layout {
            return;
        }
        if self.nodes.relayout_boundary[i] != id.idx {
            if self.nodes.parent[i] == INVALID {
                self.nodes.flags[i].needs_layout = true;
            } else {
                self.mark_parent_needs_layout(id);
            }
            return;
        }
        self.nodes.flags[i].needs_layout = true;
        if self.nodes.flags[i].attached {
            tracing::trace!(node = id.idx, "relayout boundary queued for layout");
            self.dirty.mark(id.idx, dirty::LAYOUT);
            self.request_visual_update();
        }
    }

    /// Marks the node as needing layout and its parent as needing layout
    /// too, regardless of relayout boundaries.
    ///
    /// While the node runs a layout callback, its parent is not marked: the
    /// parent is the node currently being laid out.
    pub fn mark_parent_needs_layout(&mut self, id: NodeId) {
        self.nodes.validate(id);
        let i = id.idx as usize;
        self.nodes.flags[i].needs_layout = true;
        let p = self.nodes.parent[i];
        if p == INVALID {
            return;
        }
        if !self.nodes.flags[i].doing_layout_with_callback {
            let parent = self.nodes.id_at(p);
            self.mark_needs_layout(parent);
        }
    }

    /// Re-reads the node's [`sized_by_parent`](super::RenderBox::sized_by_parent)
    /// answer and schedules the layout that a change requires.
    pub fn mark_needs_layout_for_sized_by_parent_change(&mut self, id: NodeId) {
        self.nodes.validate(id);
        let i = id.idx as usize;
        if let Some(behavior) = self.nodes.behavior[i].as_deref() {
            self.nodes.flags[i].sized_by_parent = behavior.sized_by_parent();
        }
        self.mark_needs_layout(id);
        self.mark_parent_needs_layout(id);
    }

    fn debug_assert_can_mutate(&self, id: NodeId) {
        if !cfg!(debug_assertions) {
            return;
        }
        let Some(phase) = self.phase else {
            return;
        };
        let in_window = phase == PhaseKind::Layout
            && self.allow_mutations_root != INVALID
            && self.nodes.is_self_or_ancestor(self.allow_mutations_root, id.idx);
        if !in_window {
            panic!(
                "{}",
                ContractViolation::MutationDuringFlush {
                    node: self.describe_node(id),
                    phase: phase.label(),
                }
            );
        }
    }

    /// Lays out a node with the given constraints, skipping the work when
    /// nothing it depends on changed.
    pub(crate) fn layout_node(&mut self, id: NodeId, constraints: BoxConstraints, parent_uses_size: bool) {
        self.nodes.validate(id);
        let i = id.idx as usize;
        if cfg!(debug_assertions) {
            if let Err(error) = constraints.debug_assert_is_valid(true) {
                panic!(
                    "{}",
                    ContractViolation::InvalidConstraints {
                        node: self.describe_node(id),
                        error: error.to_string(),
                    }
                );
            }
        }

        let flags = self.nodes.flags[i];
        let parent = self.nodes.parent[i];
        let boundary = if !parent_uses_size || flags.sized_by_parent || constraints.is_tight() || parent == INVALID {
            id.idx
        } else {
            self.nodes.relayout_boundary[parent as usize]
        };
        self.nodes.flags[i].parent_uses_size = parent_uses_size;

        let old_boundary = self.nodes.relayout_boundary[i];
        if !flags.needs_layout && self.nodes.constraints[i] == Some(constraints) && boundary == old_boundary {
            return;
        }

        self.nodes.constraints[i] = Some(constraints);
        if old_boundary != INVALID && boundary != old_boundary {
            let mut child = self.nodes.first_child[i];
            while child != INVALID {
                self.clean_relayout_boundary(child);
                child = self.nodes.next_sibling[child as usize];
            }
        }
        self.nodes.relayout_boundary[i] = boundary;
        tracing::trace!(
            node = id.idx,
            %constraints,
            relayout_boundary = boundary == id.idx,
            "layout"
        );
        self.run_layout(id, true);
    }

    /// Re-runs `perform_layout` of a dirty relayout boundary with its
    /// previous constraints. The root is laid out with the root constraints.
    pub(crate) fn layout_without_resize(&mut self, id: NodeId) {
        if self.root == Some(id) {
            let constraints = self.root_constraints;
            self.layout_node(id, constraints, false);
            return;
        }
        let i = id.idx as usize;
        if self.nodes.constraints[i].is_none() {
            // Never laid out; its parent's layout will reach it.
            return;
        }
        debug_assert_eq!(
            self.nodes.relayout_boundary[i], id.idx,
            "only relayout boundaries are queued for layout"
        );
        tracing::trace!(node = id.idx, "relayout");
        self.run_layout(id, false);
    }

    /// Invalidates the relayout boundary of `idx` and its descendants that
    /// inherited it.
    pub(crate) fn clean_relayout_boundary(&mut self, idx: u32) {
        let mut stack = vec![idx];
        while let Some(n) = stack.pop() {
            let i = n as usize;
            if self.nodes.relayout_boundary[i] == n {
                continue;
            }
            self.nodes.relayout_boundary[i] = INVALID;
            self.nodes.flags[i].needs_layout = true;
            let mut child = self.nodes.first_child[i];
            while child != INVALID {
                stack.push(child);
                child = self.nodes.next_sibling[child as usize];
            }
        }
    }

    fn run_layout(&mut self, id: NodeId, resize: bool) {
        let i = id.idx as usize;
        let Some(mut behavior) = self.nodes.take_behavior(id) else {
            panic!(
                "{}",
                ContractViolation::Reentrant {
                    node: self.describe_node(id),
                    phase: "layout",
                }
            );
        };
        let sized_by_parent = self.nodes.flags[i].sized_by_parent;
        let previous_size = if resize || !sized_by_parent {
            self.nodes.size[i].take()
        } else {
            self.nodes.size[i]
        };

        self.nodes.flags[i].doing_layout = true;
        let mut result = Ok(());
        if sized_by_parent && resize {
            let mut cx = LayoutCx::new(self, id, LayoutMode::Resize);
            result = behavior.perform_resize(&mut cx);
        }
        if result.is_ok() {
            let mode = if sized_by_parent {
                LayoutMode::LayoutSizedByParent
            } else {
                LayoutMode::Layout
            };
            let mut cx = LayoutCx::new(self, id, mode);
            result = behavior.perform_layout(&mut cx);
        }
        self.nodes.flags[i].doing_layout = false;
        self.nodes.restore_behavior(id, behavior);
        self.stats.laid_out += 1;

        match result {
            Ok(()) => self.debug_assert_does_meet_constraints(id),
            Err(error) => self.recover_from_failed_layout(id, previous_size, error),
        }
        self.nodes.flags[i].needs_layout = false;
        #[cfg(feature = "trace-rich")]
        self.changes.push(crate::trace::NodeChange {
            node_index: id.idx,
            kind: crate::trace::NodeChangeKind::Layout,
        });
        self.mark_needs_paint(id);
    }

    /// A failed node keeps a size that satisfies its constraints, so its
    /// parent can continue.
    fn recover_from_failed_layout(&mut self, id: NodeId, previous: Option<Size>, error: NodeError) {
        let i = id.idx as usize;
        let constraints = self.nodes.constraints[i].unwrap_or_default();
        let fallback = self.nodes.size[i].or(previous).unwrap_or_else(|| constraints.smallest());
        self.nodes.size[i] = Some(constraints.constrain(fallback));
        self.report_error(PhaseKind::Layout, id, error);
    }

    /// Checks that the node set a size that satisfies its constraints and,
    /// when enabled, that its intrinsic dimensions are sane.
    pub(crate) fn debug_assert_does_meet_constraints(&mut self, id: NodeId) {
        if !cfg!(debug_assertions) {
            return;
        }
        let i = id.idx as usize;
        let constraints = self.nodes.constraints[i].unwrap_or_default();
        let Some(size) = self.nodes.size[i] else {
            panic!(
                "{}",
                ContractViolation::SizeNotSet {
                    node: self.describe_node(id),
                }
            );
        };
        if !constraints.is_satisfied_by(size) {
            panic!(
                "{}",
                ContractViolation::SizeViolatesConstraints {
                    node: self.describe_node(id),
                    constraints,
                    size,
                }
            );
        }
        if self.options.check_intrinsic_sizes {
            self.debug_check_intrinsic_sizes(id);
        }
    }
}
