// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Intrinsic dimensions and baselines, with per-node caches.

use kurbo::{Size, Vec2};

use super::behavior::TextBaseline;
use super::store::NodeStore;
use crate::diagnostics::ContractViolation;
use crate::id::NodeId;
use crate::pipeline::PipelineOwner;

/// One of the four intrinsic dimensions of a box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntrinsicDimension {
    /// Minimum width for a given height.
    MinWidth,
    /// Maximum width for a given height.
    MaxWidth,
    /// Minimum height for a given width.
    MinHeight,
    /// Maximum height for a given width.
    MaxHeight,
}

impl IntrinsicDimension {
    /// All dimensions, in declaration order.
    pub const ALL: [Self; 4] = [Self::MinWidth, Self::MaxWidth, Self::MinHeight, Self::MaxHeight];

    /// Name of the getter, used in diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MinWidth => "min_intrinsic_width",
            Self::MaxWidth => "max_intrinsic_width",
            Self::MinHeight => "min_intrinsic_height",
            Self::MaxHeight => "max_intrinsic_height",
        }
    }
}

/// Context passed to intrinsic-dimension and baseline callbacks.
///
/// Gives access to the children's intrinsics and baselines, which are cached
/// on the children.
pub struct IntrinsicCx<'a> {
    owner: &'a mut PipelineOwner,
    node: NodeId,
}

impl std::fmt::Debug for IntrinsicCx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntrinsicCx")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

impl<'a> IntrinsicCx<'a> {
    pub(crate) fn new(owner: &'a mut PipelineOwner, node: NodeId) -> Self {
        Self { owner, node }
    }

    /// The node being measured.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Read access to the node tree.
    #[must_use]
    pub fn nodes(&self) -> &NodeStore {
        &self.owner.nodes
    }

    /// The node's size from its last layout. Only meaningful for baselines,
    /// which are measured after layout.
    #[must_use]
    pub fn size(&self) -> Size {
        self.owner.nodes.size[self.node.idx as usize].unwrap_or(Size::ZERO)
    }

    /// The node's children, first to last.
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        self.owner.nodes.children(self.node).collect()
    }

    /// The paint offset of `child`.
    #[must_use]
    pub fn child_offset(&self, child: NodeId) -> Vec2 {
        self.owner.nodes.offset(child)
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

    /// Distance from the top of `child` to its actual baseline, if it has
    /// one.
    pub fn child_distance_to_actual_baseline(
        &mut self,
        child: NodeId,
        baseline: TextBaseline,
    ) -> Option<f64> {
        self.owner.distance_to_actual_baseline(child, baseline)
    }
}

impl PipelineOwner {
    /// The smallest width the node can have without failing to paint its
    /// contents, at the given height.
    ///
    /// Results are cached per argument until the node is next marked as
    /// needing layout.
    pub fn min_intrinsic_width(&mut self, id: NodeId, height: f64) -> f64 {
        self.intrinsic(id, IntrinsicDimension::MinWidth, height)
    }

    /// The smallest width beyond which more width does not reduce the
    /// preferred height.
    pub fn max_intrinsic_width(&mut self, id: NodeId, height: f64) -> f64 {
        self.intrinsic(id, IntrinsicDimension::MaxWidth, height)
    }

    /// The smallest height the node can have at the given width.
    pub fn min_intrinsic_height(&mut self, id: NodeId, width: f64) -> f64 {
        self.intrinsic(id, IntrinsicDimension::MinHeight, width)
    }

    /// The smallest height beyond which more height does not reduce the
    /// preferred width.
    pub fn max_intrinsic_height(&mut self, id: NodeId, width: f64) -> f64 {
        self.intrinsic(id, IntrinsicDimension::MaxHeight, width)
    }

    fn intrinsic(&mut self, id: NodeId, dimension: IntrinsicDimension, argument: f64) -> f64 {
        self.nodes.validate(id);
        let i = id.idx as usize;
        if cfg!(debug_assertions) && argument < 0.0 {
            panic!(
                "{}",
                ContractViolation::NegativeIntrinsicArgument {
                    node: self.describe_node(id),
                    dimension: dimension.label(),
                    argument,
                }
            );
        }
        let key = (dimension, argument.to_bits());
        if let Some(&cached) = self.nodes.measure[i].intrinsics.get(&key) {
            return cached;
        }

        let Some(behavior) = self.nodes.take_behavior(id) else {
            panic!(
                "{}",
                ContractViolation::Reentrant {
                    node: self.describe_node(id),
                    phase: "intrinsic sizing",
                }
            );
        };
        let value = {
            let mut cx = IntrinsicCx::new(self, id);
            match dimension {
                IntrinsicDimension::MinWidth => behavior.compute_min_intrinsic_width(&mut cx, argument),
                IntrinsicDimension::MaxWidth => behavior.compute_max_intrinsic_width(&mut cx, argument),
                IntrinsicDimension::MinHeight => behavior.compute_min_intrinsic_height(&mut cx, argument),
                IntrinsicDimension::MaxHeight => behavior.compute_max_intrinsic_height(&mut cx, argument),
            }
        };
        self.nodes.restore_behavior(id, behavior);

        if !self.debug_checking_intrinsics {
            self.nodes.measure[i].intrinsics.insert(key, value);
        }
        value
    }

    /// Distance from the node's top edge to the given baseline.
    ///
    /// When the node has no such baseline, returns `None` if `only_real`,
    /// otherwise the node's height.
    ///
    /// # Panics
    ///
    /// Panics if the node has not been laid out.
    pub fn get_distance_to_baseline(
        &mut self,
        id: NodeId,
        baseline: TextBaseline,
        only_real: bool,
    ) -> Option<f64> {
        self.nodes.validate(id);
        let i = id.idx as usize;
        assert!(
            !self.nodes.flags[i].needs_layout,
            "baseline of {} queried before layout",
            self.describe_node(id)
        );
        let result = self.distance_to_actual_baseline(id, baseline);
        if result.is_none() && !only_real {
            return self.nodes.size[i].map(|s| s.height);
        }
        result
    }

    /// Cached [`compute_distance_to_actual_baseline`].
    ///
    /// [`compute_distance_to_actual_baseline`]: super::RenderBox::compute_distance_to_actual_baseline
    pub(crate) fn distance_to_actual_baseline(
        &mut self,
        id: NodeId,
        baseline: TextBaseline,
    ) -> Option<f64> {
        self.nodes.validate(id);
        let i = id.idx as usize;
        if let Some(cached) = self.nodes.measure[i].baselines[baseline.index()] {
            return cached;
        }
        let Some(behavior) = self.nodes.take_behavior(id) else {
            panic!(
                "{}",
                ContractViolation::Reentrant {
                    node: self.describe_node(id),
                    phase: "baseline measurement",
                }
            );
        };
        let value = {
            let mut cx = IntrinsicCx::new(self, id);
            behavior.compute_distance_to_actual_baseline(&mut cx, baseline)
        };
        self.nodes.restore_behavior(id, behavior);
        self.nodes.measure[i].baselines[baseline.index()] = Some(value);
        value
    }

    /// Re-runs every intrinsic getter of a freshly laid out node without
    /// touching the caches, and checks the results.
    pub(crate) fn debug_check_intrinsic_sizes(&mut self, id: NodeId) {
        let previous = std::mem::replace(&mut self.debug_checking_intrinsics, true);
        let mut values = [0.0; 4];
        for (slot, dimension) in values.iter_mut().zip(IntrinsicDimension::ALL) {
            let key = (dimension, f64::INFINITY.to_bits());
            // Bypass the cache so the check observes a fresh computation.
            let cached = self.nodes.measure[id.idx as usize].intrinsics.remove(&key);
            let value = self.intrinsic(id, dimension, f64::INFINITY);
            if let Some(cached) = cached {
                self.nodes.measure[id.idx as usize].intrinsics.insert(key, cached);
            }
            if !value.is_finite() || value < 0.0 {
                panic!(
                    "{}",
                    ContractViolation::InvalidIntrinsic {
                        node: self.describe_node(id),
                        dimension: dimension.label(),
                        value,
                    }
                );
            }
            *slot = value;
        }
        self.debug_checking_intrinsics = previous;

        for (axis, min, max) in [("width", values[0], values[1]), ("height", values[2], values[3])] {
            if min > max {
                panic!(
                    "{}",
                    ContractViolation::IntrinsicOrder {
                        node: self.describe_node(id),
                        axis,
                        min,
                        max,
                    }
                );
            }
        }
    }
}
