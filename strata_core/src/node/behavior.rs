// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`RenderBox`] trait implemented by concrete node behaviors, and the
//! parent-data side table.

use std::any::Any;
use std::fmt;

use kurbo::{Point, Rect, Size, Vec2};

use super::hit_test::HitTestCx;
use super::intrinsics::IntrinsicCx;
use super::layout::LayoutCx;
use crate::diagnostics::StrataResult;
use crate::hit_test::BoxHitTestResult;
use crate::id::NodeId;
use crate::painting::PaintingContext;
use crate::transform::Transform3d;

/// Which baseline to measure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextBaseline {
    /// The line along which most alphabetic glyphs sit.
    Alphabetic,
    /// The line used by ideographic scripts.
    Ideographic,
}

impl TextBaseline {
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Alphabetic => 0,
            Self::Ideographic => 1,
        }
    }
}

/// Data a parent stores on each of its children.
///
/// Every child carries a paint offset. Parents that need more (flex factors,
/// alignment, etc.) store a typed payload alongside it. Parent data is reset
/// when the child is dropped from its parent.
#[derive(Default)]
pub struct ParentData {
    /// Where the parent paints this child, relative to the parent's origin.
    pub offset: Vec2,
    data: Option<Box<dyn Any>>,
}

impl ParentData {
    /// Returns the payload if it has type `T`.
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.data.as_ref()?.downcast_ref()
    }

    /// Returns the payload mutably if it has type `T`.
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.data.as_mut()?.downcast_mut()
    }

    /// Replaces the payload.
    pub fn set<T: Any>(&mut self, data: T) {
        self.data = Some(Box::new(data));
    }

    /// Returns the payload, inserting `T::default()` when it is missing or has
    /// another type.
    pub fn get_or_default<T: Any + Default>(&mut self) -> &mut T {
        if !self.data.as_ref().is_some_and(|d| d.is::<T>()) {
            self.data = Some(Box::new(T::default()));
        }
        match self.data.as_mut().and_then(|d| d.downcast_mut()) {
            Some(data) => data,
            None => unreachable!("payload was just set to T"),
        }
    }
}

impl fmt::Debug for ParentData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentData")
            .field("offset", &self.offset)
            .field("has_data", &self.data.is_some())
            .finish()
    }
}

/// The behavior of a node in the render tree: how it sizes itself, lays out
/// and paints its children, and answers hit tests.
///
/// Implementations are stored in the [`NodeStore`](super::NodeStore) and
/// receive a context for every callback; they never hold references to other
/// nodes. All methods except [`perform_layout`](Self::perform_layout) have
/// defaults.
///
/// [`is_repaint_boundary`](Self::is_repaint_boundary) and
/// [`sized_by_parent`](Self::sized_by_parent) are read once when the node is
/// created.
pub trait RenderBox: Any + fmt::Debug {
    /// Whether the node's size depends only on its incoming constraints.
    ///
    /// Such nodes compute their size in [`perform_resize`](Self::perform_resize)
    /// and are always relayout boundaries.
    fn sized_by_parent(&self) -> bool {
        false
    }

    /// Whether the node paints into its own layer.
    fn is_repaint_boundary(&self) -> bool {
        false
    }

    /// Whether the node pushes layers even when nothing below it does.
    ///
    /// Call [`PipelineOwner::mark_needs_compositing_bits_update`] when the
    /// answer changes.
    ///
    /// [`PipelineOwner::mark_needs_compositing_bits_update`]: crate::pipeline::PipelineOwner::mark_needs_compositing_bits_update
    fn always_needs_compositing(&self) -> bool {
        false
    }

    /// Computes the size from the constraints alone. Only called when
    /// [`sized_by_parent`](Self::sized_by_parent) is true; defaults to the
    /// smallest size the constraints allow.
    fn perform_resize(&mut self, cx: &mut LayoutCx<'_>) -> StrataResult<()> {
        let size = cx.constraints().smallest();
        cx.set_size(size);
        Ok(())
    }

    /// Lays out the children and, unless the node is sized by its parent,
    /// sets the node's size.
    fn perform_layout(&mut self, cx: &mut LayoutCx<'_>) -> StrataResult<()>;

    /// Paints the node and its children at `offset` in the context's
    /// coordinate space.
    fn paint(&mut self, cx: &mut PaintingContext<'_>, offset: Vec2) -> StrataResult<()> {
        cx.paint_children(offset);
        Ok(())
    }

    /// Whether `position` (in local coordinates, already inside the bounds)
    /// hits the node itself.
    fn hit_test_self(&self, position: Point) -> bool {
        _ = position;
        false
    }

    /// Hit tests the children. Defaults to testing them last to first using
    /// their paint offsets.
    fn hit_test_children(
        &self,
        cx: &HitTestCx<'_>,
        result: &mut BoxHitTestResult,
        position: Point,
    ) -> bool {
        cx.default_hit_test_children(result, position)
    }

    /// Smallest width the node can be painted at without clipping its
    /// contents, given `height`.
    fn compute_min_intrinsic_width(&self, cx: &mut IntrinsicCx<'_>, height: f64) -> f64 {
        _ = (cx, height);
        0.0
    }

    /// Smallest width beyond which increasing the width never decreases the
    /// preferred height.
    fn compute_max_intrinsic_width(&self, cx: &mut IntrinsicCx<'_>, height: f64) -> f64 {
        _ = (cx, height);
        0.0
    }

    /// Minimum height the node could be painted at for `width`.
    fn compute_min_intrinsic_height(&self, cx: &mut IntrinsicCx<'_>, width: f64) -> f64 {
        _ = (cx, width);
        0.0
    }

    /// Smallest height beyond which increasing the height never decreases the
    /// preferred width.
    fn compute_max_intrinsic_height(&self, cx: &mut IntrinsicCx<'_>, width: f64) -> f64 {
        _ = (cx, width);
        0.0
    }

    /// Distance from the top of the node to the given baseline, or `None`
    /// when the node has no such baseline.
    fn compute_distance_to_actual_baseline(
        &self,
        cx: &mut IntrinsicCx<'_>,
        baseline: TextBaseline,
    ) -> Option<f64> {
        _ = (cx, baseline);
        None
    }

    /// Applies the transform used to paint `child` to `transform`.
    ///
    /// `child_offset` is the child's parent-data offset. The default
    /// translates by it, which is correct for any box that paints children
    /// with `cx.paint_child(child, offset + child_offset)`.
    fn apply_paint_transform(&self, child: NodeId, child_offset: Vec2, transform: &mut Transform3d) {
        _ = child;
        *transform = transform.pre_translate(child_offset);
    }

    /// Bounds this node paints into, in local coordinates.
    fn paint_bounds(&self, size: Size) -> Rect {
        size.to_rect()
    }

    /// Bounds used by accessibility collaborators.
    fn semantic_bounds(&self, size: Size) -> Rect {
        size.to_rect()
    }

    /// Short type name used in diagnostics and tree dumps.
    fn type_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Strips the module path and generic arguments from a type name.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_type_name_strips_path_and_generics() {
        assert_eq!(short_type_name("a::b::Flex"), "Flex");
        assert_eq!(short_type_name("a::Wrap<b::Inner>"), "Wrap");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn parent_data_payload_is_typed() {
        #[derive(Default, Debug, PartialEq)]
        struct Flex(u32);

        let mut data = ParentData::default();
        assert!(data.get::<Flex>().is_none());
        data.get_or_default::<Flex>().0 = 3;
        assert_eq!(data.get::<Flex>(), Some(&Flex(3)));
        assert!(data.get::<u8>().is_none());
        data.set(7_u8);
        assert!(data.get::<Flex>().is_none());
        assert_eq!(data.get_mut::<u8>().copied(), Some(7));
    }
}
