// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node behaviors and helpers shared by the unit tests.

use std::cell::Cell;

use kurbo::{BezPath, Point, Rect, RoundedRect, Size, Vec2};

use crate::constraints::BoxConstraints;
use crate::diagnostics::{NodeError, StrataResult};
use crate::id::{LayerId, NodeId};
use crate::layer::{EngineLayer, PhysicalShape, SceneBuilder};
use crate::node::{IntrinsicCx, LayoutCx, RenderBox, TextBaseline};
use crate::painting::{Clip, Color, ColorFilter, ImageFilter, Paint, PaintingContext, Picture};
use crate::pipeline::PipelineOwner;
use crate::transform::Transform3d;
use crate::view::RenderView;

/// Behaviors that count their layouts.
pub(crate) trait Counted {
    fn layouts(&self) -> u32;
}

/// A box of a fixed preferred size that paints one rectangle.
#[derive(Debug)]
pub(crate) struct Leaf {
    pub(crate) size: Size,
    pub(crate) color: Color,
    pub(crate) baseline: Option<f64>,
    pub(crate) always_composite: bool,
    pub(crate) layouts: u32,
    pub(crate) paints: u32,
    pub(crate) intrinsic_queries: Cell<u32>,
}

impl Leaf {
    pub(crate) fn new(size: Size) -> Self {
        Self {
            size,
            color: Color::BLACK,
            baseline: None,
            always_composite: false,
            layouts: 0,
            paints: 0,
            intrinsic_queries: Cell::new(0),
        }
    }

    pub(crate) fn with_baseline(mut self, baseline: f64) -> Self {
        self.baseline = Some(baseline);
        self
    }

    pub(crate) fn composited(mut self) -> Self {
        self.always_composite = true;
        self
    }

    fn query(&self) {
        self.intrinsic_queries.set(self.intrinsic_queries.get() + 1);
    }
}

impl Counted for Leaf {
    fn layouts(&self) -> u32 {
        self.layouts
    }
}

impl RenderBox for Leaf {
    fn always_needs_compositing(&self) -> bool {
        self.always_composite
    }

    fn perform_layout(&mut self, cx: &mut LayoutCx<'_>) -> StrataResult<()> {
        self.layouts += 1;
        let size = cx.constraints().constrain(self.size);
        cx.set_size(size);
        Ok(())
    }

    fn paint(&mut self, cx: &mut PaintingContext<'_>, offset: Vec2) -> StrataResult<()> {
        self.paints += 1;
        let rect = cx.size().to_rect() + offset;
        let paint = Paint::fill(self.color);
        cx.canvas().draw_rect(rect, &paint);
        Ok(())
    }

    fn hit_test_self(&self, _position: Point) -> bool {
        true
    }

    fn compute_min_intrinsic_width(&self, _cx: &mut IntrinsicCx<'_>, _height: f64) -> f64 {
        self.query();
        self.size.width
    }

    fn compute_max_intrinsic_width(&self, _cx: &mut IntrinsicCx<'_>, _height: f64) -> f64 {
        self.query();
        self.size.width
    }

    fn compute_min_intrinsic_height(&self, _cx: &mut IntrinsicCx<'_>, _width: f64) -> f64 {
        self.query();
        self.size.height
    }

    fn compute_max_intrinsic_height(&self, _cx: &mut IntrinsicCx<'_>, _width: f64) -> f64 {
        self.query();
        self.size.height
    }

    fn compute_distance_to_actual_baseline(
        &self,
        _cx: &mut IntrinsicCx<'_>,
        _baseline: TextBaseline,
    ) -> Option<f64> {
        self.baseline
    }
}

/// Stacks its children vertically under loosened constraints.
#[derive(Debug)]
pub(crate) struct Column {
    pub(crate) parent_uses_size: bool,
    pub(crate) repaint_boundary: bool,
    pub(crate) layouts: u32,
    pub(crate) paints: u32,
}

impl Column {
    pub(crate) fn new() -> Self {
        Self {
            parent_uses_size: true,
            repaint_boundary: false,
            layouts: 0,
            paints: 0,
        }
    }

    /// Lays children out at the origin without reading their sizes, and
    /// takes the biggest size allowed.
    pub(crate) fn ignoring_child_sizes() -> Self {
        Self {
            parent_uses_size: false,
            ..Self::new()
        }
    }

    pub(crate) fn boundary() -> Self {
        Self {
            repaint_boundary: true,
            ..Self::new()
        }
    }
}

impl Counted for Column {
    fn layouts(&self) -> u32 {
        self.layouts
    }
}

impl RenderBox for Column {
    fn is_repaint_boundary(&self) -> bool {
        self.repaint_boundary
    }

    fn perform_layout(&mut self, cx: &mut LayoutCx<'_>) -> StrataResult<()> {
        self.layouts += 1;
        let constraints = cx.constraints();
        let loose = constraints.loosen();
        let mut width: f64 = 0.0;
        let mut y = 0.0;
        for child in cx.children() {
            cx.layout_child(child, loose, self.parent_uses_size);
            if self.parent_uses_size {
                let size = cx.child_size(child);
                cx.set_child_offset(child, Vec2::new(0.0, y));
                width = width.max(size.width);
                y += size.height;
            } else {
                cx.set_child_offset(child, Vec2::ZERO);
            }
        }
        let size = if self.parent_uses_size {
            constraints.constrain(Size::new(width, y))
        } else {
            constraints.biggest()
        };
        cx.set_size(size);
        Ok(())
    }

    fn paint(&mut self, cx: &mut PaintingContext<'_>, offset: Vec2) -> StrataResult<()> {
        self.paints += 1;
        cx.paint_children(offset);
        Ok(())
    }

    fn compute_min_intrinsic_width(&self, cx: &mut IntrinsicCx<'_>, height: f64) -> f64 {
        cx.children()
            .into_iter()
            .map(|c| cx.child_min_intrinsic_width(c, height))
            .fold(0.0, f64::max)
    }

    fn compute_max_intrinsic_width(&self, cx: &mut IntrinsicCx<'_>, height: f64) -> f64 {
        cx.children()
            .into_iter()
            .map(|c| cx.child_max_intrinsic_width(c, height))
            .fold(0.0, f64::max)
    }

    fn compute_min_intrinsic_height(&self, cx: &mut IntrinsicCx<'_>, width: f64) -> f64 {
        cx.children()
            .into_iter()
            .map(|c| cx.child_min_intrinsic_height(c, width))
            .sum()
    }

    fn compute_max_intrinsic_height(&self, cx: &mut IntrinsicCx<'_>, width: f64) -> f64 {
        cx.children()
            .into_iter()
            .map(|c| cx.child_max_intrinsic_height(c, width))
            .sum()
    }

    fn compute_distance_to_actual_baseline(
        &self,
        cx: &mut IntrinsicCx<'_>,
        baseline: TextBaseline,
    ) -> Option<f64> {
        let first = cx.children().into_iter().next()?;
        let offset = cx.child_offset(first);
        cx.child_distance_to_actual_baseline(first, baseline)
            .map(|d| d + offset.y)
    }
}

/// Sized by its parent: fills the constraints and gives its children
/// loose constraints of that size.
#[derive(Debug, Default)]
pub(crate) struct Expand {
    pub(crate) resizes: u32,
    pub(crate) layouts: u32,
}

impl Counted for Expand {
    fn layouts(&self) -> u32 {
        self.layouts
    }
}

impl RenderBox for Expand {
    fn sized_by_parent(&self) -> bool {
        true
    }

    fn perform_resize(&mut self, cx: &mut LayoutCx<'_>) -> StrataResult<()> {
        self.resizes += 1;
        let size = cx.constraints().biggest();
        cx.set_size(size);
        Ok(())
    }

    fn perform_layout(&mut self, cx: &mut LayoutCx<'_>) -> StrataResult<()> {
        self.layouts += 1;
        let size = cx.size().unwrap_or_default();
        for child in cx.children() {
            cx.layout_child(child, BoxConstraints::loose(size), true);
        }
        Ok(())
    }
}

/// Returns an error from layout or from paint.
#[derive(Debug)]
pub(crate) struct Failing {
    in_layout: bool,
}

impl Failing {
    pub(crate) fn layout() -> Self {
        Self { in_layout: true }
    }

    pub(crate) fn paint() -> Self {
        Self { in_layout: false }
    }
}

impl RenderBox for Failing {
    fn perform_layout(&mut self, cx: &mut LayoutCx<'_>) -> StrataResult<()> {
        if self.in_layout {
            return Err(NodeError::msg("layout exploded"));
        }
        let size = cx.constraints().smallest();
        cx.set_size(size);
        Ok(())
    }

    fn paint(&mut self, _cx: &mut PaintingContext<'_>, _offset: Vec2) -> StrataResult<()> {
        Err(NodeError::msg("paint exploded"))
    }
}

/// Fills its constraints and clips its children to its bounds.
#[derive(Debug, Default)]
pub(crate) struct Clipper {
    pub(crate) layer: Option<LayerId>,
}

impl RenderBox for Clipper {
    fn perform_layout(&mut self, cx: &mut LayoutCx<'_>) -> StrataResult<()> {
        let size = cx.constraints().biggest();
        cx.set_size(size);
        for child in cx.children() {
            cx.layout_child(child, BoxConstraints::loose(size), true);
        }
        Ok(())
    }

    fn paint(&mut self, cx: &mut PaintingContext<'_>, offset: Vec2) -> StrataResult<()> {
        let bounds = cx.size().to_rect();
        let needs_compositing = cx.needs_compositing();
        self.layer = cx.push_clip_rect(
            needs_compositing,
            offset,
            bounds,
            |cx, offset| {
                cx.paint_children(offset);
                Ok(())
            },
            Clip::HardEdge,
            self.layer,
        )?;
        Ok(())
    }
}

/// Ways of breaking the node protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Misbehavior {
    NoSize,
    Oversize,
    SizeInLayoutWhenSizedByParent,
    ReadsUnusedChildSize,
    MeasuresSelf,
    DirtiesSiblingInCallback,
    BuildsChildInCallback,
    BadIntrinsics,
    UnbalancedSave,
}

#[derive(Debug)]
pub(crate) struct Misbehaving(pub(crate) Misbehavior);

impl RenderBox for Misbehaving {
    fn sized_by_parent(&self) -> bool {
        self.0 == Misbehavior::SizeInLayoutWhenSizedByParent
    }

    fn perform_layout(&mut self, cx: &mut LayoutCx<'_>) -> StrataResult<()> {
        let constraints = cx.constraints();
        match self.0 {
            Misbehavior::NoSize => {}
            Misbehavior::Oversize => {
                let too_big = constraints.biggest() + Size::new(10.0, 10.0);
                cx.set_size(too_big);
            }
            Misbehavior::SizeInLayoutWhenSizedByParent => cx.set_size(constraints.biggest()),
            Misbehavior::ReadsUnusedChildSize => {
                cx.set_size(constraints.biggest());
                for child in cx.children() {
                    cx.layout_child(child, constraints.loosen(), false);
                    let _ = cx.child_size(child);
                }
            }
            Misbehavior::MeasuresSelf => {
                let this = cx.node();
                let width = cx.child_max_intrinsic_width(this, f64::INFINITY);
                cx.set_size(constraints.constrain(Size::new(width, 0.0)));
            }
            Misbehavior::DirtiesSiblingInCallback => {
                cx.set_size(constraints.biggest());
                cx.invoke_layout_callback(|owner, node| {
                    if let Some(sibling) = owner.nodes().child_before(node) {
                        owner.mark_needs_layout(sibling);
                    }
                });
            }
            Misbehavior::BuildsChildInCallback => {
                let size = constraints.biggest();
                cx.set_size(size);
                if cx.child_count() == 0 {
                    cx.invoke_layout_callback(|owner, node| {
                        let child = owner.create_node(Leaf::new(Size::new(5.0, 5.0)));
                        owner.add_child(node, child);
                    });
                }
                for child in cx.children() {
                    cx.layout_child(child, BoxConstraints::loose(size), true);
                }
            }
            Misbehavior::BadIntrinsics | Misbehavior::UnbalancedSave => {
                cx.set_size(constraints.smallest());
            }
        }
        Ok(())
    }

    fn paint(&mut self, cx: &mut PaintingContext<'_>, offset: Vec2) -> StrataResult<()> {
        if self.0 == Misbehavior::UnbalancedSave {
            cx.canvas().save();
        }
        cx.paint_children(offset);
        Ok(())
    }

    fn compute_min_intrinsic_width(&self, _cx: &mut IntrinsicCx<'_>, _height: f64) -> f64 {
        if self.0 == Misbehavior::BadIntrinsics { 30.0 } else { 0.0 }
    }

    fn compute_max_intrinsic_width(&self, _cx: &mut IntrinsicCx<'_>, _height: f64) -> f64 {
        if self.0 == Misbehavior::BadIntrinsics { 10.0 } else { 0.0 }
    }
}

/// Counts what a composite adds, and hands out engine layers.
#[derive(Debug, Default)]
pub(crate) struct SceneLog {
    next: u64,
    current: SceneCounts,
}

/// What one scene contained.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SceneCounts {
    pub(crate) pictures: u32,
    pub(crate) pushes: u32,
    pub(crate) retained: Vec<EngineLayer>,
}

impl SceneLog {
    fn push(&mut self, old: Option<EngineLayer>) -> EngineLayer {
        self.current.pushes += 1;
        if let Some(old) = old {
            return old;
        }
        self.next += 1;
        EngineLayer(self.next)
    }
}

impl SceneBuilder for SceneLog {
    type Scene = SceneCounts;

    fn push_offset(&mut self, _offset: Vec2, old: Option<EngineLayer>) -> EngineLayer {
        self.push(old)
    }

    fn push_transform(&mut self, _transform: Transform3d, old: Option<EngineLayer>) -> EngineLayer {
        self.push(old)
    }

    fn push_clip_rect(&mut self, _rect: Rect, _clip: Clip, old: Option<EngineLayer>) -> EngineLayer {
        self.push(old)
    }

    fn push_clip_rrect(
        &mut self,
        _rrect: RoundedRect,
        _clip: Clip,
        old: Option<EngineLayer>,
    ) -> EngineLayer {
        self.push(old)
    }

    fn push_clip_path(&mut self, _path: &BezPath, _clip: Clip, old: Option<EngineLayer>) -> EngineLayer {
        self.push(old)
    }

    fn push_opacity(&mut self, _alpha: u8, _offset: Vec2, old: Option<EngineLayer>) -> EngineLayer {
        self.push(old)
    }

    fn push_color_filter(&mut self, _filter: ColorFilter, old: Option<EngineLayer>) -> EngineLayer {
        self.push(old)
    }

    fn push_backdrop_filter(&mut self, _filter: ImageFilter, old: Option<EngineLayer>) -> EngineLayer {
        self.push(old)
    }

    fn push_physical_shape(
        &mut self,
        _shape: PhysicalShape<'_>,
        old: Option<EngineLayer>,
    ) -> EngineLayer {
        self.push(old)
    }

    fn pop(&mut self) {}

    fn add_picture(&mut self, _offset: Vec2, _picture: &Picture, _is_complex_hint: bool, _will_change_hint: bool) {
        self.current.pictures += 1;
    }

    fn add_texture(&mut self, _offset: Vec2, _rect: Rect, _texture_id: u64, _freeze: bool) {}

    fn add_retained(&mut self, layer: EngineLayer) {
        self.current.retained.push(layer);
    }

    fn build(&mut self) -> SceneCounts {
        std::mem::take(&mut self.current)
    }
}

/// Creates a [`RenderView`] of `size`, installs it as the root and queues
/// the first frame.
pub(crate) fn view(owner: &mut PipelineOwner, size: Size) -> NodeId {
    let root = owner.create_node(RenderView::new(size));
    owner.set_root(Some(root));
    owner.prepare_initial_frame();
    root
}

/// Runs the three flushes.
pub(crate) fn frame(owner: &mut PipelineOwner) {
    owner.flush_layout();
    owner.flush_compositing_bits();
    owner.flush_paint();
}
