// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The painting context: records nodes into picture layers and pushes
//! container layers for clips, transforms and effects.

use kurbo::{BezPath, Rect, RoundedRect, Vec2};

use super::canvas::Canvas;
use super::style::{Clip, Color, ColorFilter, ImageFilter, Paint};
use crate::diagnostics::{ContractViolation, StrataResult};
use crate::id::{LayerId, NodeId};
use crate::layer::LayerKind;
use crate::node::NodeStore;
use crate::pipeline::PipelineOwner;
use crate::trace::PhaseKind;
use crate::transform::Transform3d;

const LAYER_BORDER: Color = Color(0xFFFF_9800);

/// A shape with elevation, for [`PaintingContext::push_physical_shape`].
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicalModel {
    /// Outline of the shape, in the painter's coordinates.
    pub path: BezPath,
    /// Elevation used to render the shadow.
    pub elevation: f64,
    /// Fill color.
    pub color: Color,
    /// Shadow color.
    pub shadow_color: Color,
    /// How children are clipped to the shape.
    pub clip: Clip,
}

/// Where a node paints.
///
/// A context wraps one container layer. Drawing commands go to a canvas that
/// is opened lazily on first use and recorded into a picture layer appended
/// to the container. Whenever a child layer must be inserted (a repaint
/// boundary, or an effect that needs compositing) the current recording is
/// closed first, so later drawing lands in a new picture above it.
pub struct PaintingContext<'a> {
    owner: &'a mut PipelineOwner,
    container: LayerId,
    estimated_bounds: Rect,
    current_layer: Option<LayerId>,
    canvas: Option<Canvas>,
    recording: u64,
    node: Option<NodeId>,
}

impl std::fmt::Debug for PaintingContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaintingContext")
            .field("container", &self.container)
            .field("estimated_bounds", &self.estimated_bounds)
            .field("current_layer", &self.current_layer)
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

impl<'a> PaintingContext<'a> {
    fn new(owner: &'a mut PipelineOwner, container: LayerId, estimated_bounds: Rect, node: Option<NodeId>) -> Self {
        Self {
            owner,
            container,
            estimated_bounds,
            current_layer: None,
            canvas: None,
            recording: 0,
            node,
        }
    }

    /// Repaints a repaint boundary into its own offset layer, creating the
    /// layer on first use.
    pub(crate) fn repaint_composited_child(owner: &mut PipelineOwner, id: NodeId) {
        let i = id.idx as usize;
        debug_assert!(owner.nodes.flags[i].is_repaint_boundary, "only repaint boundaries own layers");
        let existing = owner.nodes.layer[i].filter(|l| owner.layers.is_alive(*l));
        let layer = match existing {
            Some(layer) => {
                owner.layers.remove_all_children(layer);
                layer
            }
            None => {
                let layer = owner.layers.create_layer(LayerKind::offset(Vec2::ZERO));
                owner.nodes.layer[i] = Some(layer);
                layer
            }
        };
        let size = owner.nodes.size[i].unwrap_or_default();
        let bounds = owner.nodes.behavior[i]
            .as_deref()
            .map_or_else(|| size.to_rect(), |b| b.paint_bounds(size));
        tracing::trace!(node = id.idx, layer = layer.idx, "repaint");

        let mut cx = PaintingContext::new(owner, layer, bounds, None);
        cx.paint_node(id, Vec2::ZERO);
        cx.stop_recording_if_needed();

        owner.stats.repainted += 1;
        #[cfg(feature = "trace-rich")]
        owner.changes.push(crate::trace::NodeChange {
            node_index: id.idx,
            kind: crate::trace::NodeChangeKind::Repaint,
        });
    }

    /// Runs a node's paint callback at `offset`.
    fn paint_node(&mut self, id: NodeId, offset: Vec2) {
        let i = id.idx as usize;
        if self.owner.nodes.flags[i].needs_layout {
            // Not laid out yet; it is painted after its next layout.
            return;
        }
        let Some(mut behavior) = self.owner.nodes.take_behavior(id) else {
            panic!(
                "{}",
                ContractViolation::Reentrant {
                    node: self.owner.describe_node(id),
                    phase: "paint",
                }
            );
        };
        self.owner.nodes.flags[i].needs_paint = false;
        self.owner.nodes.flags[i].doing_paint = true;
        let parent_node = self.node.replace(id);
        let before = self.save_count_marker();

        let result = behavior.paint(self, offset);

        self.debug_check_save_count(id, before);
        self.node = parent_node;
        self.owner.nodes.flags[i].doing_paint = false;
        self.owner.nodes.restore_behavior(id, behavior);
        if let Err(error) = result {
            self.owner.report_error(PhaseKind::Paint, id, error);
        }
    }

    fn save_count_marker(&self) -> Option<(u64, usize)> {
        self.canvas.as_ref().map(|c| (self.recording, c.save_count()))
    }

    fn debug_check_save_count(&self, id: NodeId, before: Option<(u64, usize)>) {
        if !cfg!(debug_assertions) || !self.owner.options.check_canvas_save_count {
            return;
        }
        let (Some((recording, before)), Some((now, after))) = (before, self.save_count_marker()) else {
            return;
        };
        // A recording closed by a pushed layer says nothing about balance.
        if recording == now && before != after {
            panic!(
                "{}",
                ContractViolation::SaveCountMismatch {
                    node: self.owner.describe_node(id),
                    before,
                    after,
                }
            );
        }
    }

    /// The canvas to draw on, opening a new recording when none is active.
    pub fn canvas(&mut self) -> &mut Canvas {
        let canvas = match self.canvas.take() {
            Some(canvas) => canvas,
            None => self.start_recording(),
        };
        self.canvas.insert(canvas)
    }

    fn start_recording(&mut self) -> Canvas {
        let layer = self
            .owner
            .layers
            .create_layer(LayerKind::picture(self.estimated_bounds));
        self.owner.layers.append(self.container, layer);
        self.current_layer = Some(layer);
        self.recording += 1;
        Canvas::new(self.estimated_bounds)
    }

    /// Closes the active recording and stores its picture in the picture
    /// layer.
    pub fn stop_recording_if_needed(&mut self) {
        let Some(mut canvas) = self.canvas.take() else {
            return;
        };
        let Some(layer) = self.current_layer.take() else {
            return;
        };
        if self.owner.options.paint_layer_borders {
            canvas.draw_rect(self.estimated_bounds, &Paint::stroke(LAYER_BORDER, 1.0));
        }
        self.owner.layers.set_picture(layer, canvas.finish());
    }

    /// Paints `child` at `offset`.
    ///
    /// A repaint boundary is composited as its own layer, repainted only if
    /// it is dirty. Any other child paints into this context.
    pub fn paint_child(&mut self, child: NodeId, offset: Vec2) {
        self.owner.nodes.validate(child);
        if let Some(node) = self.node {
            assert!(
                self.owner.nodes.parent[child.idx as usize] == node.idx,
                "{} is not a child of {}",
                self.owner.describe_node(child),
                self.owner.describe_node(node)
            );
        }
        if self.owner.nodes.flags[child.idx as usize].is_repaint_boundary {
            self.stop_recording_if_needed();
            self.composite_child(child, offset);
        } else {
            self.paint_node(child, offset);
        }
    }

    /// Paints every child of the current node at its parent-data offset
    /// plus `offset`.
    pub fn paint_children(&mut self, offset: Vec2) {
        let Some(node) = self.node else {
            return;
        };
        let children: Vec<NodeId> = self.owner.nodes.children(node).collect();
        for child in children {
            let child_offset = self.owner.nodes.offset(child);
            self.paint_child(child, offset + child_offset);
        }
    }

    fn composite_child(&mut self, child: NodeId, offset: Vec2) {
        let i = child.idx as usize;
        let has_layer = self.owner.nodes.layer[i].is_some_and(|l| self.owner.layers.is_alive(l));
        if self.owner.nodes.flags[i].needs_paint || !has_layer {
            Self::repaint_composited_child(self.owner, child);
        }
        let Some(layer) = self.owner.nodes.layer[i] else {
            return;
        };
        self.owner.layers.set_offset(layer, offset);
        self.append_layer(layer);
    }

    fn append_layer(&mut self, layer: LayerId) {
        if self.owner.layers.parent(layer).is_some() {
            self.owner.layers.remove(layer);
        }
        self.owner.layers.append(self.container, layer);
    }

    /// Appends a layer that paints itself, such as a texture, above
    /// everything painted so far.
    pub fn add_layer(&mut self, layer: LayerId) {
        self.stop_recording_if_needed();
        self.append_layer(layer);
    }

    /// Appends `child_layer` and runs `painter` in a new context that paints
    /// into it.
    ///
    /// `child_paint_bounds` is the estimated area the painter covers, in the
    /// child layer's coordinates; defaults to this context's bounds.
    pub fn push_layer(
        &mut self,
        child_layer: LayerId,
        painter: impl FnOnce(&mut PaintingContext<'_>, Vec2) -> StrataResult<()>,
        offset: Vec2,
        child_paint_bounds: Option<Rect>,
    ) -> StrataResult<()> {
        assert!(
            self.owner.layers.kind(child_layer).is_container(),
            "only container layers can be pushed"
        );
        if self.owner.layers.first_child(child_layer).is_some() {
            self.owner.layers.remove_all_children(child_layer);
        }
        self.stop_recording_if_needed();
        self.append_layer(child_layer);
        let bounds = child_paint_bounds.unwrap_or(self.estimated_bounds);
        let mut child = PaintingContext::new(self.owner, child_layer, bounds, self.node);
        let result = painter(&mut child, offset);
        child.stop_recording_if_needed();
        result
    }

    fn reuse_or_create(&mut self, old: Option<LayerId>, kind: LayerKind) -> LayerId {
        if let Some(old) = old {
            if !self.owner.layers.is_alive(old) {
                tracing::debug!(?old, kind = kind.name(), "old layer was collected, creating a new one");
            } else if self.owner.layers.kind(old).same_variant(&kind) {
                self.owner.layers.set_kind(old, kind);
                return old;
            } else {
                tracing::warn!(
                    ?old,
                    old_kind = self.owner.layers.kind(old).name(),
                    kind = kind.name(),
                    "old layer has the wrong kind, creating a new one"
                );
            }
        }
        self.owner.layers.create_layer(kind)
    }

    fn clip_and_paint(
        &mut self,
        clip: Clip,
        bounds: Rect,
        clip_call: impl FnOnce(&mut Canvas, bool),
        painter: impl FnOnce(&mut PaintingContext<'_>, Vec2) -> StrataResult<()>,
        offset: Vec2,
    ) -> StrataResult<()> {
        let canvas = self.canvas();
        canvas.save();
        match clip {
            Clip::None => {}
            Clip::HardEdge => clip_call(canvas, false),
            Clip::AntiAlias => clip_call(canvas, true),
            Clip::AntiAliasWithSaveLayer => {
                clip_call(canvas, true);
                canvas.save_layer(Some(bounds), Paint::default());
            }
        }
        let result = painter(self, offset);
        if clip == Clip::AntiAliasWithSaveLayer {
            self.canvas().restore();
        }
        self.canvas().restore();
        result
    }

    /// Clips the painter's output to `clip_rect`, given in the painter's
    /// coordinates before `offset` is applied.
    ///
    /// Returns the clip layer when `needs_compositing`; pass it back as
    /// `old_layer` next time to reuse it.
    pub fn push_clip_rect(
        &mut self,
        needs_compositing: bool,
        offset: Vec2,
        clip_rect: Rect,
        painter: impl FnOnce(&mut PaintingContext<'_>, Vec2) -> StrataResult<()>,
        clip: Clip,
        old_layer: Option<LayerId>,
    ) -> StrataResult<Option<LayerId>> {
        let rect = clip_rect + offset;
        if needs_compositing {
            let layer = self.reuse_or_create(old_layer, LayerKind::ClipRect { rect, clip });
            self.push_layer(layer, painter, offset, Some(rect))?;
            Ok(Some(layer))
        } else {
            self.clip_and_paint(clip, rect, |c, aa| c.clip_rect(rect, aa), painter, offset)?;
            Ok(None)
        }
    }

    /// Clips the painter's output to a rounded rectangle. `bounds` is the
    /// area the children cover.
    pub fn push_clip_rrect(
        &mut self,
        needs_compositing: bool,
        offset: Vec2,
        bounds: Rect,
        clip_rrect: RoundedRect,
        painter: impl FnOnce(&mut PaintingContext<'_>, Vec2) -> StrataResult<()>,
        clip: Clip,
        old_layer: Option<LayerId>,
    ) -> StrataResult<Option<LayerId>> {
        let bounds = bounds + offset;
        let rrect = clip_rrect + offset;
        if needs_compositing {
            let layer = self.reuse_or_create(old_layer, LayerKind::ClipRRect { rrect, clip });
            self.push_layer(layer, painter, offset, Some(bounds))?;
            Ok(Some(layer))
        } else {
            self.clip_and_paint(clip, bounds, |c, aa| c.clip_rrect(rrect, aa), painter, offset)?;
            Ok(None)
        }
    }

    /// Clips the painter's output to a path. `bounds` is the area the
    /// children cover.
    pub fn push_clip_path(
        &mut self,
        needs_compositing: bool,
        offset: Vec2,
        bounds: Rect,
        clip_path: &BezPath,
        painter: impl FnOnce(&mut PaintingContext<'_>, Vec2) -> StrataResult<()>,
        clip: Clip,
        old_layer: Option<LayerId>,
    ) -> StrataResult<Option<LayerId>> {
        let bounds = bounds + offset;
        let path = kurbo::Affine::translate(offset) * clip_path.clone();
        if needs_compositing {
            let layer = self.reuse_or_create(old_layer, LayerKind::ClipPath { path, clip });
            self.push_layer(layer, painter, offset, Some(bounds))?;
            Ok(Some(layer))
        } else {
            self.clip_and_paint(clip, bounds, |c, aa| c.clip_path(&path, aa), painter, offset)?;
            Ok(None)
        }
    }

    /// Transforms the painter's output about `offset`.
    pub fn push_transform(
        &mut self,
        needs_compositing: bool,
        offset: Vec2,
        transform: Transform3d,
        painter: impl FnOnce(&mut PaintingContext<'_>, Vec2) -> StrataResult<()>,
        old_layer: Option<LayerId>,
    ) -> StrataResult<Option<LayerId>> {
        let effective = Transform3d::from_offset(offset) * transform * Transform3d::from_offset(-offset);
        if needs_compositing {
            let layer = self.reuse_or_create(
                old_layer,
                LayerKind::Transform {
                    transform: effective,
                    offset: Vec2::ZERO,
                },
            );
            let bounds = effective.inverse_transform_rect(self.estimated_bounds);
            self.push_layer(layer, painter, offset, Some(bounds))?;
            Ok(Some(layer))
        } else {
            let canvas = self.canvas();
            canvas.save();
            canvas.transform(&effective);
            let result = painter(self, offset);
            self.canvas().restore();
            result?;
            Ok(None)
        }
    }

    /// Paints the painter's output with constant `alpha`.
    pub fn push_opacity(
        &mut self,
        needs_compositing: bool,
        offset: Vec2,
        alpha: u8,
        painter: impl FnOnce(&mut PaintingContext<'_>, Vec2) -> StrataResult<()>,
        old_layer: Option<LayerId>,
    ) -> StrataResult<Option<LayerId>> {
        if needs_compositing {
            let layer = self.reuse_or_create(old_layer, LayerKind::Opacity { alpha, offset });
            self.push_layer(layer, painter, Vec2::ZERO, None)?;
            Ok(Some(layer))
        } else {
            let paint = Paint::fill(Color::BLACK.with_alpha(alpha));
            self.canvas().save_layer(None, paint);
            let result = painter(self, offset);
            self.canvas().restore();
            result?;
            Ok(None)
        }
    }

    /// Applies a color filter to the painter's output. Always composited.
    pub fn push_color_filter(
        &mut self,
        offset: Vec2,
        filter: ColorFilter,
        painter: impl FnOnce(&mut PaintingContext<'_>, Vec2) -> StrataResult<()>,
        old_layer: Option<LayerId>,
    ) -> StrataResult<LayerId> {
        let layer = self.reuse_or_create(old_layer, LayerKind::ColorFilter { filter });
        self.push_layer(layer, painter, offset, None)?;
        Ok(layer)
    }

    /// Filters the backdrop behind the painter's output. Always composited.
    pub fn push_backdrop_filter(
        &mut self,
        offset: Vec2,
        filter: ImageFilter,
        painter: impl FnOnce(&mut PaintingContext<'_>, Vec2) -> StrataResult<()>,
        old_layer: Option<LayerId>,
    ) -> StrataResult<LayerId> {
        let layer = self.reuse_or_create(old_layer, LayerKind::BackdropFilter { filter });
        self.push_layer(layer, painter, offset, None)?;
        Ok(layer)
    }

    /// Paints a shape with elevation and clips the painter's output to it.
    ///
    /// Without compositing the shape is filled on the canvas; the shadow is
    /// only rendered by a physical-shape layer.
    pub fn push_physical_shape(
        &mut self,
        needs_compositing: bool,
        offset: Vec2,
        model: PhysicalModel,
        painter: impl FnOnce(&mut PaintingContext<'_>, Vec2) -> StrataResult<()>,
        old_layer: Option<LayerId>,
    ) -> StrataResult<Option<LayerId>> {
        let path = kurbo::Affine::translate(offset) * model.path;
        let bounds = kurbo::Shape::bounding_box(&path);
        if needs_compositing {
            let layer = self.reuse_or_create(
                old_layer,
                LayerKind::PhysicalShape {
                    path,
                    elevation: model.elevation,
                    color: model.color,
                    shadow_color: model.shadow_color,
                    clip: model.clip,
                },
            );
            self.push_layer(layer, painter, offset, Some(bounds))?;
            Ok(Some(layer))
        } else {
            self.canvas().draw_path(&path, &Paint::fill(model.color));
            self.clip_and_paint(model.clip, bounds, |c, aa| c.clip_path(&path, aa), painter, offset)?;
            Ok(None)
        }
    }

    /// Hints that the current recording is expensive to rasterize.
    pub fn set_is_complex_hint(&mut self) {
        self.canvas();
        if let Some(layer) = self.current_layer {
            self.owner.layers.set_picture_hints(layer, Some(true), None);
        }
    }

    /// Hints that the current recording will change in the next frame.
    pub fn set_will_change_hint(&mut self) {
        self.canvas();
        if let Some(layer) = self.current_layer {
            self.owner.layers.set_picture_hints(layer, None, Some(true));
        }
    }

    /// Whether the node being painted has to push layers for its effects.
    #[must_use]
    pub fn needs_compositing(&self) -> bool {
        self.node
            .is_some_and(|n| self.owner.nodes.flags[n.idx as usize].needs_compositing)
    }

    /// The node being painted.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Size of the node being painted.
    #[must_use]
    pub fn size(&self) -> kurbo::Size {
        self.node
            .and_then(|n| self.owner.nodes.size[n.idx as usize])
            .unwrap_or_default()
    }

    /// The container layer this context paints into.
    #[must_use]
    pub fn container(&self) -> LayerId {
        self.container
    }

    /// Bounds this context expects its painting to cover.
    #[must_use]
    pub fn estimated_bounds(&self) -> Rect {
        self.estimated_bounds
    }

    /// Read access to the node tree.
    #[must_use]
    pub fn nodes(&self) -> &NodeStore {
        &self.owner.nodes
    }

    /// Creates a layer for [`push_layer`](Self::push_layer) or
    /// [`add_layer`](Self::add_layer).
    pub fn create_layer(&mut self, kind: LayerKind) -> LayerId {
        self.owner.layers.create_layer(kind)
    }
}
