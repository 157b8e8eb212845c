// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Building a scene from the layer tree, with retained engine layers.
//!
//! [`LayerTree::build_scene`] walks the tree from a root and drives a
//! [`SceneBuilder`]. A container that has not changed since the previous
//! scene (its whole subtree has `needs_add_to_scene == false`) and that
//! holds an [`EngineLayer`] from that scene is not walked again: the builder
//! is asked to [`add_retained`](SceneBuilder::add_retained) it instead.

use std::fmt;

use kurbo::{BezPath, Rect, RoundedRect, Vec2};

use super::kind::LayerKind;
use super::tree::LayerTree;
use crate::id::{INVALID, LayerId};
use crate::painting::{Clip, Color, ColorFilter, ImageFilter, Picture};
use crate::transform::Transform3d;

/// Opaque handle to a layer retained by the rasterizer between scenes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineLayer(pub u64);

impl fmt::Debug for EngineLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EngineLayer({})", self.0)
    }
}

/// Parameters of a physical shape pushed into a scene.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicalShape<'a> {
    /// The shape, in scene coordinates.
    pub path: &'a BezPath,
    /// Elevation used to render the shadow.
    pub elevation: f64,
    /// Fill color.
    pub color: Color,
    /// Shadow color.
    pub shadow_color: Color,
    /// How children are clipped to the shape.
    pub clip: Clip,
}

/// The rasterizer's scene-construction interface.
///
/// Every `push_*` opens a scope closed by [`pop`](Self::pop) and returns the
/// engine layer for it. `old` is the engine layer the same layer produced in
/// the previous scene, which the builder may update in place.
pub trait SceneBuilder {
    /// The finished scene.
    type Scene;

    /// Translates everything until the matching `pop`.
    fn push_offset(&mut self, offset: Vec2, old: Option<EngineLayer>) -> EngineLayer;

    /// Transforms everything until the matching `pop`.
    fn push_transform(&mut self, transform: Transform3d, old: Option<EngineLayer>) -> EngineLayer;

    /// Clips to a rectangle.
    fn push_clip_rect(&mut self, rect: Rect, clip: Clip, old: Option<EngineLayer>) -> EngineLayer;

    /// Clips to a rounded rectangle.
    fn push_clip_rrect(
        &mut self,
        rrect: RoundedRect,
        clip: Clip,
        old: Option<EngineLayer>,
    ) -> EngineLayer;

    /// Clips to a path.
    fn push_clip_path(&mut self, path: &BezPath, clip: Clip, old: Option<EngineLayer>) -> EngineLayer;

    /// Composites with a constant alpha, translated by `offset`.
    fn push_opacity(&mut self, alpha: u8, offset: Vec2, old: Option<EngineLayer>) -> EngineLayer;

    /// Applies a color filter.
    fn push_color_filter(&mut self, filter: ColorFilter, old: Option<EngineLayer>) -> EngineLayer;

    /// Filters the backdrop.
    fn push_backdrop_filter(&mut self, filter: ImageFilter, old: Option<EngineLayer>) -> EngineLayer;

    /// Draws a physical shape and clips to it.
    fn push_physical_shape(
        &mut self,
        shape: PhysicalShape<'_>,
        old: Option<EngineLayer>,
    ) -> EngineLayer;

    /// Closes the most recent `push_*`.
    fn pop(&mut self);

    /// Draws a picture at `offset`.
    fn add_picture(&mut self, offset: Vec2, picture: &Picture, is_complex_hint: bool, will_change_hint: bool);

    /// Draws an external texture.
    fn add_texture(&mut self, offset: Vec2, rect: Rect, texture_id: u64, freeze: bool);

    /// Re-adds an engine layer from the previous scene unchanged.
    fn add_retained(&mut self, layer: EngineLayer);

    /// Finishes the scene.
    fn build(&mut self) -> Self::Scene;
}

impl LayerTree {
    /// Builds a scene from `root`.
    ///
    /// Propagates `needs_add_to_scene` through the subtree, adds `root`,
    /// clears its flag, and finishes the builder.
    pub fn build_scene<B: SceneBuilder + ?Sized>(&mut self, root: LayerId, builder: &mut B) -> B::Scene {
        self.validate(root);
        self.update_subtree_needs_add_to_scene(root);
        self.add_to_scene(root.idx, builder, Vec2::ZERO);
        self.needs_add_to_scene[root.idx as usize] = false;
        builder.build()
    }

    /// Adds the layer at `idx` to the scene, shifted by `layer_offset`.
    pub(crate) fn add_to_scene<B: SceneBuilder + ?Sized>(
        &mut self,
        idx: u32,
        builder: &mut B,
        layer_offset: Vec2,
    ) {
        let i = idx as usize;
        let old = self.engine_layer[i];
        let options = self.options;
        match self.kind[i].clone() {
            LayerKind::Container => self.add_children_to_scene(idx, builder, layer_offset),
            LayerKind::Picture {
                picture,
                is_complex_hint,
                will_change_hint,
                ..
            } => {
                if let Some(picture) = &picture {
                    builder.add_picture(layer_offset, picture, is_complex_hint, will_change_hint);
                }
            }
            LayerKind::Texture {
                rect,
                texture_id,
                freeze,
            } => builder.add_texture(layer_offset, rect, texture_id, freeze),
            LayerKind::Offset { offset } => {
                let engine = builder.push_offset(layer_offset + offset, old);
                self.set_engine_layer(idx, Some(engine));
                self.add_children_to_scene(idx, builder, Vec2::ZERO);
                builder.pop();
            }
            LayerKind::Transform { transform, offset } => {
                let total = offset + layer_offset;
                let effective = if total == Vec2::ZERO {
                    transform
                } else {
                    Transform3d::from_offset(total) * transform
                };
                self.scene_state[i].last_transform = Some(effective);
                let engine = builder.push_transform(effective, old);
                self.set_engine_layer(idx, Some(engine));
                self.add_children_to_scene(idx, builder, Vec2::ZERO);
                builder.pop();
            }
            LayerKind::ClipRect { rect, clip } => {
                let enabled = !options.disable_clip_layers;
                if enabled {
                    let engine = builder.push_clip_rect(rect + layer_offset, clip, old);
                    self.set_engine_layer(idx, Some(engine));
                } else {
                    self.set_engine_layer(idx, None);
                }
                self.add_children_to_scene(idx, builder, layer_offset);
                if enabled {
                    builder.pop();
                }
            }
            LayerKind::ClipRRect { rrect, clip } => {
                let enabled = !options.disable_clip_layers;
                if enabled {
                    let engine = builder.push_clip_rrect(rrect + layer_offset, clip, old);
                    self.set_engine_layer(idx, Some(engine));
                } else {
                    self.set_engine_layer(idx, None);
                }
                self.add_children_to_scene(idx, builder, layer_offset);
                if enabled {
                    builder.pop();
                }
            }
            LayerKind::ClipPath { path, clip } => {
                let enabled = !options.disable_clip_layers;
                if enabled {
                    let shifted = shift_path(&path, layer_offset);
                    let engine = builder.push_clip_path(&shifted, clip, old);
                    self.set_engine_layer(idx, Some(engine));
                } else {
                    self.set_engine_layer(idx, None);
                }
                self.add_children_to_scene(idx, builder, layer_offset);
                if enabled {
                    builder.pop();
                }
            }
            LayerKind::Opacity { alpha, offset } => {
                let enabled = self.first_child[i] != INVALID && !options.disable_opacity_layers;
                if enabled {
                    let engine = builder.push_opacity(alpha, offset + layer_offset, old);
                    self.set_engine_layer(idx, Some(engine));
                    self.add_children_to_scene(idx, builder, Vec2::ZERO);
                    builder.pop();
                } else {
                    self.set_engine_layer(idx, None);
                    self.add_children_to_scene(idx, builder, offset + layer_offset);
                }
            }
            LayerKind::ColorFilter { filter } => {
                let engine = builder.push_color_filter(filter, old);
                self.set_engine_layer(idx, Some(engine));
                self.add_children_to_scene(idx, builder, layer_offset);
                builder.pop();
            }
            LayerKind::BackdropFilter { filter } => {
                let engine = builder.push_backdrop_filter(filter, old);
                self.set_engine_layer(idx, Some(engine));
                self.add_children_to_scene(idx, builder, layer_offset);
                builder.pop();
            }
            LayerKind::PhysicalShape {
                path,
                elevation,
                color,
                shadow_color,
                clip,
            } => {
                let enabled = !options.disable_physical_shape_layers;
                if enabled {
                    let shifted = shift_path(&path, layer_offset);
                    let engine = builder.push_physical_shape(
                        PhysicalShape {
                            path: &shifted,
                            elevation,
                            color,
                            shadow_color,
                            clip,
                        },
                        old,
                    );
                    self.set_engine_layer(idx, Some(engine));
                } else {
                    self.set_engine_layer(idx, None);
                }
                self.add_children_to_scene(idx, builder, layer_offset);
                if enabled {
                    builder.pop();
                }
            }
            LayerKind::Leader { offset, .. } => {
                let last_offset = offset + layer_offset;
                self.scene_state[i].last_offset = Some(last_offset);
                if last_offset != Vec2::ZERO {
                    let engine = builder.push_transform(Transform3d::from_offset(last_offset), old);
                    self.set_engine_layer(idx, Some(engine));
                }
                self.add_children_to_scene(idx, builder, Vec2::ZERO);
                if last_offset != Vec2::ZERO {
                    builder.pop();
                }
            }
            LayerKind::Follower {
                link,
                show_when_unlinked,
                unlinked_offset,
                linked_offset,
            } => {
                let leader = self.link_leader(link);
                if leader.is_none() && !show_when_unlinked {
                    self.scene_state[i].last_transform = None;
                    self.scene_state[i].last_offset = None;
                    self.set_engine_layer(idx, None);
                    return;
                }
                let established = leader.and_then(|l| self.establish_follower_transform(idx, l.idx, linked_offset));
                if let Some(transform) = established {
                    self.scene_state[i].last_transform = Some(transform);
                    self.scene_state[i].last_offset = Some(unlinked_offset + layer_offset);
                    let engine = builder.push_transform(transform, old);
                    self.set_engine_layer(idx, Some(engine));
                    self.add_children_to_scene(idx, builder, Vec2::ZERO);
                    builder.pop();
                } else {
                    let last_offset = unlinked_offset + layer_offset;
                    self.scene_state[i].last_transform = None;
                    self.scene_state[i].last_offset = Some(last_offset);
                    let engine = builder.push_transform(Transform3d::from_offset(last_offset), old);
                    self.set_engine_layer(idx, Some(engine));
                    self.add_children_to_scene(idx, builder, Vec2::ZERO);
                    builder.pop();
                }
            }
        }
    }

    /// Adds every child of `idx`. With a zero offset children are added with
    /// retained rendering; otherwise they are re-added at the offset.
    pub(crate) fn add_children_to_scene<B: SceneBuilder + ?Sized>(
        &mut self,
        idx: u32,
        builder: &mut B,
        child_offset: Vec2,
    ) {
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            if child_offset == Vec2::ZERO {
                self.add_to_scene_with_retained_rendering(child, builder);
            } else {
                self.add_to_scene(child, builder, child_offset);
            }
            child = self.next_sibling[child as usize];
        }
    }

    /// Re-adds the previous engine layer when the subtree is unchanged,
    /// otherwise adds the layer afresh and clears its flag.
    pub(crate) fn add_to_scene_with_retained_rendering<B: SceneBuilder + ?Sized>(
        &mut self,
        idx: u32,
        builder: &mut B,
    ) {
        let i = idx as usize;
        if !self.needs_add_to_scene[i] {
            if let Some(engine) = self.engine_layer[i] {
                tracing::trace!(layer = idx, ?engine, "retained layer");
                builder.add_retained(engine);
                return;
            }
        }
        self.add_to_scene(idx, builder, Vec2::ZERO);
        self.needs_add_to_scene[i] = false;
    }

    /// Applies the transform `parent` applies to its children to
    /// `transform`.
    pub fn apply_transform(&self, parent: LayerId, transform: &mut Transform3d) {
        self.validate(parent);
        self.apply_transform_at(parent.idx, transform);
    }

    fn apply_transform_at(&self, idx: u32, transform: &mut Transform3d) {
        let i = idx as usize;
        let state = &self.scene_state[i];
        match &self.kind[i] {
            LayerKind::Offset { offset } => *transform = transform.pre_translate(*offset),
            LayerKind::Opacity { offset, .. } => *transform = transform.pre_translate(*offset),
            LayerKind::Transform {
                transform: own,
                offset,
            } => {
                let effective = state.last_transform.unwrap_or_else(|| {
                    if *offset == Vec2::ZERO {
                        *own
                    } else {
                        Transform3d::from_offset(*offset) * *own
                    }
                });
                *transform = *transform * effective;
            }
            LayerKind::Leader { .. } => {
                if let Some(offset) = state.last_offset {
                    *transform = transform.pre_translate(offset);
                }
            }
            LayerKind::Follower { unlinked_offset, .. } => {
                let own = state
                    .last_transform
                    .unwrap_or_else(|| Transform3d::from_offset(*unlinked_offset));
                *transform = *transform * own;
            }
            _ => {}
        }
    }

    /// The transform a follower applied in the last scene, relative to its
    /// own position, or `None` if it has not been added while linked.
    #[must_use]
    pub fn follower_last_transform(&self, follower: LayerId) -> Option<Transform3d> {
        self.validate(follower);
        let state = &self.scene_state[follower.idx as usize];
        let transform = state.last_transform?;
        let offset = state.last_offset.unwrap_or(Vec2::ZERO);
        Some(Transform3d::from_offset(-offset) * transform)
    }

    /// Computes the transform that maps a follower's children onto the
    /// leader's coordinate space, via the layers between both and their
    /// common ancestor. Returns `None` if the layers share no ancestor, the
    /// leader has not been added to the scene yet, or the follower's chain is
    /// not invertible.
    fn establish_follower_transform(&self, follower: u32, leader: u32, linked_offset: Vec2) -> Option<Transform3d> {
        if self.scene_state[leader as usize].last_offset.is_none() {
            tracing::warn!(leader, follower, "follower added before its leader");
            return None;
        }

        let leader_depth = self.depth_of(leader);
        let follower_depth = self.depth_of(follower);
        let mut forward = vec![leader];
        let mut inverse = vec![follower];
        let mut a = leader;
        let mut b = follower;
        let (mut da, mut db) = (leader_depth, follower_depth);
        while da > db {
            a = self.parent[a as usize];
            forward.push(a);
            da -= 1;
        }
        while db > da {
            b = self.parent[b as usize];
            inverse.push(b);
            db -= 1;
        }
        while a != b {
            a = self.parent[a as usize];
            b = self.parent[b as usize];
            if a == INVALID || b == INVALID {
                return None;
            }
            forward.push(a);
            inverse.push(b);
        }

        // `forward` runs leader..=ancestor: the leader's own transform counts.
        let mut forward_transform = Transform3d::IDENTITY;
        for &layer in forward.iter().rev() {
            self.apply_transform_at(layer, &mut forward_transform);
        }
        // `inverse` runs follower..=ancestor: the follower's own transform does not.
        let mut inverse_transform = Transform3d::IDENTITY;
        for &layer in inverse.iter().skip(1).rev() {
            self.apply_transform_at(layer, &mut inverse_transform);
        }
        let inverted = inverse_transform.try_inverse()?;
        Some((inverted * forward_transform).pre_translate(linked_offset))
    }

    fn depth_of(&self, idx: u32) -> u32 {
        let mut depth = 0;
        let mut cursor = self.parent[idx as usize];
        while cursor != INVALID {
            depth += 1;
            cursor = self.parent[cursor as usize];
        }
        depth
    }
}

fn shift_path(path: &BezPath, offset: Vec2) -> BezPath {
    if offset == Vec2::ZERO {
        return path.clone();
    }
    let mut shifted = path.clone();
    shifted.apply_affine(kurbo::Affine::translate(offset));
    shifted
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use super::*;
    use crate::layer::SceneOptions;
    use crate::painting::Canvas;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Offset(Vec2, Option<EngineLayer>),
        Transform(Transform3d),
        ClipRect(Rect),
        Opacity(u8, Vec2),
        Pop,
        Picture(Vec2),
        Retained(EngineLayer),
    }

    #[derive(Default)]
    struct Log {
        ops: Vec<Op>,
        next: u64,
    }

    impl Log {
        fn engine(&mut self, old: Option<EngineLayer>) -> EngineLayer {
            old.unwrap_or_else(|| {
                self.next += 1;
                EngineLayer(self.next)
            })
        }
    }

    impl SceneBuilder for Log {
        type Scene = Vec<Op>;

        fn push_offset(&mut self, offset: Vec2, old: Option<EngineLayer>) -> EngineLayer {
            self.ops.push(Op::Offset(offset, old));
            self.engine(old)
        }
        fn push_transform(&mut self, transform: Transform3d, old: Option<EngineLayer>) -> EngineLayer {
            self.ops.push(Op::Transform(transform));
            self.engine(old)
        }
        fn push_clip_rect(&mut self, rect: Rect, _clip: Clip, old: Option<EngineLayer>) -> EngineLayer {
            self.ops.push(Op::ClipRect(rect));
            self.engine(old)
        }
        fn push_clip_rrect(&mut self, _: RoundedRect, _: Clip, old: Option<EngineLayer>) -> EngineLayer {
            self.engine(old)
        }
        fn push_clip_path(&mut self, _: &BezPath, _: Clip, old: Option<EngineLayer>) -> EngineLayer {
            self.engine(old)
        }
        fn push_opacity(&mut self, alpha: u8, offset: Vec2, old: Option<EngineLayer>) -> EngineLayer {
            self.ops.push(Op::Opacity(alpha, offset));
            self.engine(old)
        }
        fn push_color_filter(&mut self, _: ColorFilter, old: Option<EngineLayer>) -> EngineLayer {
            self.engine(old)
        }
        fn push_backdrop_filter(&mut self, _: ImageFilter, old: Option<EngineLayer>) -> EngineLayer {
            self.engine(old)
        }
        fn push_physical_shape(&mut self, _: PhysicalShape<'_>, old: Option<EngineLayer>) -> EngineLayer {
            self.engine(old)
        }
        fn pop(&mut self) {
            self.ops.push(Op::Pop);
        }
        fn add_picture(&mut self, offset: Vec2, _: &Picture, _: bool, _: bool) {
            self.ops.push(Op::Picture(offset));
        }
        fn add_texture(&mut self, _: Vec2, _: Rect, _: u64, _: bool) {}
        fn add_retained(&mut self, layer: EngineLayer) {
            self.ops.push(Op::Retained(layer));
        }
        fn build(&mut self) -> Vec<Op> {
            std::mem::take(&mut self.ops)
        }
    }

    fn picture_layer(tree: &mut LayerTree) -> LayerId {
        let layer = tree.create_layer(LayerKind::picture(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let mut canvas = Canvas::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        canvas.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0), &crate::painting::Paint::default());
        tree.set_picture(layer, canvas.finish());
        layer
    }

    #[test]
    fn second_build_retains_unchanged_subtrees() {
        let mut tree = LayerTree::new();
        let root = tree.create_layer(LayerKind::offset(Vec2::ZERO));
        tree.attach(root);
        let a = tree.create_layer(LayerKind::offset(Vec2::new(5.0, 0.0)));
        let b = tree.create_layer(LayerKind::offset(Vec2::new(0.0, 5.0)));
        tree.append(root, a);
        tree.append(root, b);
        let pa = picture_layer(&mut tree);
        let pb = picture_layer(&mut tree);
        tree.append(a, pa);
        tree.append(b, pb);

        let mut log = Log::default();
        let first = tree.build_scene(root, &mut log);
        assert_eq!(
            first,
            vec![
                Op::Offset(Vec2::ZERO, None),
                Op::Offset(Vec2::new(5.0, 0.0), None),
                Op::Picture(Vec2::ZERO),
                Op::Pop,
                Op::Offset(Vec2::new(0.0, 5.0), None),
                Op::Picture(Vec2::ZERO),
                Op::Pop,
                Op::Pop,
            ]
        );
        let engine_a = tree.engine_layer(a).expect("offset layers keep engine layers");
        let engine_b = tree.engine_layer(b).expect("offset layers keep engine layers");
        let engine_root = tree.engine_layer(root);
        assert!(!tree.needs_add_to_scene(a));

        // Only `b` changes.
        tree.set_offset(b, Vec2::new(0.0, 6.0));
        let second = tree.build_scene(root, &mut log);
        assert_eq!(
            second,
            vec![
                Op::Offset(Vec2::ZERO, engine_root),
                Op::Retained(engine_a),
                Op::Offset(Vec2::new(0.0, 6.0), Some(engine_b)),
                Op::Picture(Vec2::ZERO),
                Op::Pop,
                Op::Pop,
            ]
        );
    }

    #[test]
    fn disabled_clip_layers_pass_offset_through() {
        let mut tree = LayerTree::new();
        tree.set_scene_options(SceneOptions {
            disable_clip_layers: true,
            ..SceneOptions::default()
        });
        let root = tree.create_layer(LayerKind::Container);
        let clip = tree.create_layer(LayerKind::ClipRect {
            rect: Rect::new(0.0, 0.0, 4.0, 4.0),
            clip: Clip::HardEdge,
        });
        let pic = picture_layer(&mut tree);
        tree.append(root, clip);
        tree.append(clip, pic);

        let mut log = Log::default();
        tree.add_to_scene(root.idx, &mut log, Vec2::new(1.0, 1.0));
        assert_eq!(log.ops, vec![Op::Picture(Vec2::new(1.0, 1.0))]);
        assert_eq!(tree.engine_layer(clip), None);
    }

    #[test]
    fn clip_rect_is_shifted_by_layer_offset() {
        let mut tree = LayerTree::new();
        let clip = tree.create_layer(LayerKind::ClipRect {
            rect: Rect::new(0.0, 0.0, 4.0, 4.0),
            clip: Clip::AntiAlias,
        });
        let mut log = Log::default();
        tree.add_to_scene(clip.idx, &mut log, Vec2::new(2.0, 3.0));
        assert_eq!(
            log.ops,
            vec![Op::ClipRect(Rect::new(2.0, 3.0, 6.0, 7.0)), Op::Pop]
        );
    }

    #[test]
    fn opacity_without_children_is_skipped() {
        let mut tree = LayerTree::new();
        let opacity = tree.create_layer(LayerKind::Opacity {
            alpha: 128,
            offset: Vec2::new(1.0, 0.0),
        });
        let mut log = Log::default();
        tree.add_to_scene(opacity.idx, &mut log, Vec2::ZERO);
        assert!(log.ops.is_empty());

        let pic = picture_layer(&mut tree);
        tree.append(opacity, pic);
        tree.add_to_scene(opacity.idx, &mut log, Vec2::new(0.0, 2.0));
        assert_eq!(
            log.ops,
            vec![
                Op::Opacity(128, Vec2::new(1.0, 2.0)),
                Op::Picture(Vec2::ZERO),
                Op::Pop
            ]
        );
    }

    #[test]
    fn transform_layer_folds_offset_into_effective_transform() {
        let mut tree = LayerTree::new();
        let scale = Transform3d::from_scale(2.0, 2.0, 1.0);
        let layer = tree.create_layer(LayerKind::Transform {
            transform: scale,
            offset: Vec2::new(3.0, 0.0),
        });
        let mut log = Log::default();
        tree.add_to_scene(layer.idx, &mut log, Vec2::ZERO);
        let expected = Transform3d::from_offset(Vec2::new(3.0, 0.0)) * scale;
        assert_eq!(log.ops, vec![Op::Transform(expected), Op::Pop]);

        let mut t = Transform3d::IDENTITY;
        tree.apply_transform(layer, &mut t);
        assert_eq!(t, expected);
    }

    #[test]
    fn follower_tracks_leader_through_common_ancestor() {
        let mut tree = LayerTree::new();
        let link = tree.create_link();
        let root = tree.create_layer(LayerKind::Container);
        tree.attach(root);
        let leader_parent = tree.create_layer(LayerKind::offset(Vec2::new(100.0, 0.0)));
        let leader = tree.create_layer(LayerKind::Leader {
            link,
            offset: Vec2::new(0.0, 20.0),
        });
        let follower_parent = tree.create_layer(LayerKind::offset(Vec2::new(10.0, 10.0)));
        let follower = tree.create_layer(LayerKind::Follower {
            link,
            show_when_unlinked: false,
            unlinked_offset: Vec2::ZERO,
            linked_offset: Vec2::new(0.0, 5.0),
        });
        tree.append(root, leader_parent);
        tree.append(leader_parent, leader);
        tree.append(root, follower_parent);
        tree.append(follower_parent, follower);
        let pic = picture_layer(&mut tree);
        tree.append(follower, pic);

        let mut log = Log::default();
        let ops = tree.build_scene(root, &mut log);

        // The follower's children land at leader position + linked offset,
        // expressed relative to the follower's parent.
        let expected = Transform3d::from_offset(Vec2::new(90.0, 15.0));
        assert!(ops.contains(&Op::Transform(expected)));

        let mapped = tree
            .follower_last_transform(follower)
            .expect("linked follower has a transform")
            .transform_point(Point::ORIGIN);
        assert_eq!(mapped, Point::new(90.0, 15.0));
    }

    #[test]
    fn unlinked_hidden_follower_adds_nothing() {
        let mut tree = LayerTree::new();
        let link = tree.create_link();
        let follower = tree.create_layer(LayerKind::Follower {
            link,
            show_when_unlinked: false,
            unlinked_offset: Vec2::new(1.0, 1.0),
            linked_offset: Vec2::ZERO,
        });
        let pic = picture_layer(&mut tree);
        tree.append(follower, pic);
        let mut log = Log::default();
        tree.add_to_scene(follower.idx, &mut log, Vec2::ZERO);
        assert!(log.ops.is_empty());
        assert_eq!(tree.engine_layer(follower), None);
    }
}
