// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A [`SceneBuilder`] that records scenes as lists of [`RenderItem`]s.

use std::collections::HashMap;
use std::sync::Arc;

use kurbo::{BezPath, Rect, RoundedRect, Vec2};
use strata_core::layer::{EngineLayer, PhysicalShape, SceneBuilder};
use strata_core::painting::{Clip, Color, ColorFilter, ImageFilter, Picture};
use strata_core::transform::Transform3d;

use crate::damage::DamageRegion;
use crate::resource::ResourceKey;

/// A single command in a recorded scene.
///
/// Items are in back-to-front order. Every `Push*` is closed by a matching
/// [`Pop`](Self::Pop).
#[derive(Clone, Debug)]
pub enum RenderItem {
    /// Translates the enclosed items.
    PushOffset {
        /// Engine layer of the scope.
        layer: EngineLayer,
        /// The translation.
        offset: Vec2,
    },
    /// Transforms the enclosed items.
    PushTransform {
        /// Engine layer of the scope.
        layer: EngineLayer,
        /// The transform.
        transform: Transform3d,
    },
    /// Clips the enclosed items to a rectangle.
    PushClipRect {
        /// Engine layer of the scope.
        layer: EngineLayer,
        /// The clip rectangle.
        rect: Rect,
        /// Clip behavior.
        clip: Clip,
    },
    /// Clips the enclosed items to a rounded rectangle.
    PushClipRRect {
        /// Engine layer of the scope.
        layer: EngineLayer,
        /// The clip shape.
        rrect: RoundedRect,
        /// Clip behavior.
        clip: Clip,
    },
    /// Clips the enclosed items to a path.
    PushClipPath {
        /// Engine layer of the scope.
        layer: EngineLayer,
        /// The clip shape.
        path: BezPath,
        /// Clip behavior.
        clip: Clip,
    },
    /// Composites the enclosed items with constant alpha.
    PushOpacity {
        /// Engine layer of the scope.
        layer: EngineLayer,
        /// Alpha, 255 being opaque.
        alpha: u8,
        /// Translation applied to the enclosed items.
        offset: Vec2,
    },
    /// Filters the colors of the enclosed items.
    PushColorFilter {
        /// Engine layer of the scope.
        layer: EngineLayer,
        /// The filter.
        filter: ColorFilter,
    },
    /// Filters what is behind the enclosed items.
    PushBackdropFilter {
        /// Engine layer of the scope.
        layer: EngineLayer,
        /// The filter.
        filter: ImageFilter,
    },
    /// Draws a shape with a shadow and clips the enclosed items to it.
    PushPhysicalShape {
        /// Engine layer of the scope.
        layer: EngineLayer,
        /// The shape.
        path: BezPath,
        /// Elevation of the shadow.
        elevation: f64,
        /// Fill color.
        color: Color,
        /// Shadow color.
        shadow_color: Color,
        /// Clip behavior.
        clip: Clip,
    },
    /// Closes the innermost `Push*`.
    Pop,
    /// Draws a picture.
    Picture {
        /// Translation of the picture.
        offset: Vec2,
        /// The recorded commands.
        picture: Picture,
        /// Whether rasterizing the picture is expensive.
        is_complex_hint: bool,
        /// Whether the picture is likely to change next frame.
        will_change_hint: bool,
    },
    /// Draws an external texture.
    Texture {
        /// Translation of the texture.
        offset: Vec2,
        /// Where the texture is drawn.
        rect: Rect,
        /// The texture.
        key: ResourceKey,
        /// Whether the texture keeps its current frame.
        freeze: bool,
    },
    /// An engine layer reused unchanged from the previous scene, with the
    /// items it contained there.
    Retained {
        /// The reused engine layer.
        layer: EngineLayer,
        /// Its items, starting with its `Push*` and ending with its `Pop`.
        items: Arc<[RenderItem]>,
    },
}

impl RenderItem {
    /// The engine layer a `Push*` or `Retained` item refers to.
    #[must_use]
    pub fn engine_layer(&self) -> Option<EngineLayer> {
        match self {
            Self::PushOffset { layer, .. }
            | Self::PushTransform { layer, .. }
            | Self::PushClipRect { layer, .. }
            | Self::PushClipRRect { layer, .. }
            | Self::PushClipPath { layer, .. }
            | Self::PushOpacity { layer, .. }
            | Self::PushColorFilter { layer, .. }
            | Self::PushBackdropFilter { layer, .. }
            | Self::PushPhysicalShape { layer, .. }
            | Self::Retained { layer, .. } => Some(*layer),
            Self::Pop | Self::Picture { .. } | Self::Texture { .. } => None,
        }
    }

    /// The transform a `Push*` applies to the items it encloses, or `None`
    /// for items that open no scope.
    fn scope_transform(&self) -> Option<Transform3d> {
        match self {
            Self::PushOffset { offset, .. } | Self::PushOpacity { offset, .. } => {
                Some(Transform3d::from_translation(offset.x, offset.y, 0.0))
            }
            Self::PushTransform { transform, .. } => Some(*transform),
            Self::PushClipRect { .. }
            | Self::PushClipRRect { .. }
            | Self::PushClipPath { .. }
            | Self::PushColorFilter { .. }
            | Self::PushBackdropFilter { .. }
            | Self::PushPhysicalShape { .. } => Some(Transform3d::IDENTITY),
            Self::Pop | Self::Picture { .. } | Self::Texture { .. } | Self::Retained { .. } => None,
        }
    }
}

/// Calls `f` with every picture in `items`, including those inside retained
/// layers, and its bounds in scene coordinates.
fn walk_pictures(items: &[RenderItem], base: Transform3d, f: &mut impl FnMut(&Picture, Rect)) {
    let mut stack = vec![base];
    for item in items {
        let current = stack.last().copied().unwrap_or(base);
        match item {
            RenderItem::Pop => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            RenderItem::Picture { offset, picture, .. } => {
                f(picture, current.transform_rect(picture.cull_rect() + *offset));
            }
            RenderItem::Retained { items, .. } => walk_pictures(items, current, f),
            RenderItem::Texture { .. } => {}
            push => {
                if let Some(local) = push.scope_transform() {
                    stack.push(current * local);
                }
            }
        }
    }
}

/// A finished scene.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    items: Vec<RenderItem>,
    damage: DamageRegion,
}

impl Scene {
    /// The items, back to front.
    #[must_use]
    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    /// What changed since the previous scene from the same builder.
    #[must_use]
    pub fn damage(&self) -> &DamageRegion {
        &self.damage
    }

    /// Engine layers reused from the previous scene.
    #[must_use]
    pub fn retained_layers(&self) -> Vec<EngineLayer> {
        self.items
            .iter()
            .filter_map(|item| match item {
                RenderItem::Retained { layer, .. } => Some(*layer),
                _ => None,
            })
            .collect()
    }

    /// Number of pictures drawn, including those inside retained layers.
    #[must_use]
    pub fn picture_count(&self) -> usize {
        let mut count = 0;
        walk_pictures(&self.items, Transform3d::IDENTITY, &mut |_, _| count += 1);
        count
    }

    /// The items with every retained layer replaced by its contents.
    #[must_use]
    pub fn flatten(&self) -> Vec<RenderItem> {
        fn expand(items: &[RenderItem], out: &mut Vec<RenderItem>) {
            for item in items {
                match item {
                    RenderItem::Retained { items, .. } => expand(items, out),
                    other => out.push(other.clone()),
                }
            }
        }
        let mut out = Vec::with_capacity(self.items.len());
        expand(&self.items, &mut out);
        out
    }
}

/// Records scenes and keeps the contents of every engine layer for one
/// scene, so that the next scene can retain them.
///
/// Damage is computed by comparing pictures: a picture that was not drawn
/// at the same place in the previous scene, or one that is no longer drawn,
/// damages its bounds. The first scene is fully damaged.
pub struct RecordingSceneBuilder {
    next_engine_layer: u64,
    items: Vec<RenderItem>,
    open: Vec<(EngineLayer, usize)>,
    transforms: Vec<Transform3d>,
    contents: HashMap<EngineLayer, Arc<[RenderItem]>>,
    previous: HashMap<EngineLayer, Arc<[RenderItem]>>,
    pictures: Vec<(Picture, Rect)>,
    previous_pictures: Option<Vec<(Picture, Rect, bool)>>,
    damage: DamageRegion,
}

impl std::fmt::Debug for RecordingSceneBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSceneBuilder")
            .field("next_engine_layer", &self.next_engine_layer)
            .field("items", &self.items.len())
            .field("open", &self.open.len())
            .field("retainable", &self.previous.len())
            .finish_non_exhaustive()
    }
}

impl Default for RecordingSceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSceneBuilder {
    /// Creates a builder with no previous scene.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_engine_layer: 0,
            items: Vec::new(),
            open: Vec::new(),
            transforms: Vec::new(),
            contents: HashMap::new(),
            previous: HashMap::new(),
            pictures: Vec::new(),
            previous_pictures: None,
            damage: DamageRegion::None,
        }
    }

    /// Number of engine layers from the last scene that can be retained.
    #[must_use]
    pub fn retainable_layers(&self) -> usize {
        self.previous.len()
    }

    fn current_transform(&self) -> Transform3d {
        self.transforms.last().copied().unwrap_or(Transform3d::IDENTITY)
    }

    fn open_scope(&mut self, old: Option<EngineLayer>, item: impl FnOnce(EngineLayer) -> RenderItem) -> EngineLayer {
        let layer = match old {
            Some(old) if old.0 != 0 && old.0 <= self.next_engine_layer => old,
            _ => {
                self.next_engine_layer += 1;
                EngineLayer(self.next_engine_layer)
            }
        };
        let item = item(layer);
        let local = item.scope_transform().unwrap_or(Transform3d::IDENTITY);
        self.transforms.push(self.current_transform() * local);
        self.open.push((layer, self.items.len()));
        self.items.push(item);
        layer
    }

    fn note_picture(&mut self, picture: &Picture, bounds: Rect, live: bool) {
        let matched = self.previous_pictures.as_mut().is_some_and(|previous| {
            previous
                .iter_mut()
                .find(|(p, r, used)| !*used && *r == bounds && p.ptr_eq(picture))
                .map(|entry| entry.2 = true)
                .is_some()
        });
        if live && !matched {
            self.damage.add_rect(bounds);
        }
        self.pictures.push((picture.clone(), bounds));
    }

    /// Makes `layer` and every engine layer nested in it retainable again
    /// in the next scene.
    fn carry_forward(&mut self, layer: EngineLayer, items: &Arc<[RenderItem]>) {
        self.contents.insert(layer, Arc::clone(items));
        for item in items.iter().skip(1) {
            let Some(nested) = item.engine_layer() else {
                continue;
            };
            if let Some(nested_items) = self.previous.get(&nested).cloned() {
                self.carry_forward(nested, &nested_items);
            }
        }
    }
}

impl SceneBuilder for RecordingSceneBuilder {
    type Scene = Scene;

    fn push_offset(&mut self, offset: Vec2, old: Option<EngineLayer>) -> EngineLayer {
        self.open_scope(old, |layer| RenderItem::PushOffset { layer, offset })
    }

    fn push_transform(&mut self, transform: Transform3d, old: Option<EngineLayer>) -> EngineLayer {
        self.open_scope(old, |layer| RenderItem::PushTransform { layer, transform })
    }

    fn push_clip_rect(&mut self, rect: Rect, clip: Clip, old: Option<EngineLayer>) -> EngineLayer {
        self.open_scope(old, |layer| RenderItem::PushClipRect { layer, rect, clip })
    }

    fn push_clip_rrect(
        &mut self,
        rrect: RoundedRect,
        clip: Clip,
        old: Option<EngineLayer>,
    ) -> EngineLayer {
        self.open_scope(old, |layer| RenderItem::PushClipRRect { layer, rrect, clip })
    }

    fn push_clip_path(&mut self, path: &BezPath, clip: Clip, old: Option<EngineLayer>) -> EngineLayer {
        let path = path.clone();
        self.open_scope(old, |layer| RenderItem::PushClipPath { layer, path, clip })
    }

    fn push_opacity(&mut self, alpha: u8, offset: Vec2, old: Option<EngineLayer>) -> EngineLayer {
        self.open_scope(old, |layer| RenderItem::PushOpacity {
            layer,
            alpha,
            offset,
        })
    }

    fn push_color_filter(&mut self, filter: ColorFilter, old: Option<EngineLayer>) -> EngineLayer {
        self.open_scope(old, |layer| RenderItem::PushColorFilter { layer, filter })
    }

    fn push_backdrop_filter(&mut self, filter: ImageFilter, old: Option<EngineLayer>) -> EngineLayer {
        self.open_scope(old, |layer| RenderItem::PushBackdropFilter { layer, filter })
    }

    fn push_physical_shape(
        &mut self,
        shape: PhysicalShape<'_>,
        old: Option<EngineLayer>,
    ) -> EngineLayer {
        let path = shape.path.clone();
        self.open_scope(old, |layer| RenderItem::PushPhysicalShape {
            layer,
            path,
            elevation: shape.elevation,
            color: shape.color,
            shadow_color: shape.shadow_color,
            clip: shape.clip,
        })
    }

    fn pop(&mut self) {
        let Some((layer, start)) = self.open.pop() else {
            tracing::warn!("pop without a matching push");
            return;
        };
        self.transforms.pop();
        self.items.push(RenderItem::Pop);
        self.contents.insert(layer, self.items[start..].into());
    }

    fn add_picture(&mut self, offset: Vec2, picture: &Picture, is_complex_hint: bool, will_change_hint: bool) {
        let bounds = self
            .current_transform()
            .transform_rect(picture.cull_rect() + offset);
        self.note_picture(picture, bounds, true);
        self.items.push(RenderItem::Picture {
            offset,
            picture: picture.clone(),
            is_complex_hint,
            will_change_hint,
        });
    }

    fn add_texture(&mut self, offset: Vec2, rect: Rect, texture_id: u64, freeze: bool) {
        if !freeze {
            let bounds = self.current_transform().transform_rect(rect + offset);
            self.damage.add_rect(bounds);
        }
        self.items.push(RenderItem::Texture {
            offset,
            rect,
            key: ResourceKey(texture_id),
            freeze,
        });
    }

    fn add_retained(&mut self, layer: EngineLayer) {
        let Some(items) = self.previous.get(&layer).cloned() else {
            tracing::warn!(?layer, "retained engine layer is unknown; skipped");
            return;
        };
        tracing::trace!(?layer, items = items.len(), "engine layer retained");
        self.carry_forward(layer, &items);
        let mut seen = Vec::new();
        walk_pictures(&items, self.current_transform(), &mut |picture, bounds| {
            seen.push((picture.clone(), bounds));
        });
        for (picture, bounds) in seen {
            self.note_picture(&picture, bounds, false);
        }
        self.items.push(RenderItem::Retained { layer, items });
    }

    fn build(&mut self) -> Scene {
        if !self.open.is_empty() {
            tracing::warn!(open = self.open.len(), "scene finished with unclosed scopes");
            while !self.open.is_empty() {
                self.pop();
            }
        }
        let mut damage = std::mem::replace(&mut self.damage, DamageRegion::None);
        match self.previous_pictures.take() {
            None => damage = DamageRegion::Full,
            Some(previous) => {
                for (_, bounds, used) in previous {
                    if !used {
                        damage.add_rect(bounds);
                    }
                }
            }
        }
        self.previous = std::mem::take(&mut self.contents);
        self.previous_pictures = Some(
            std::mem::take(&mut self.pictures)
                .into_iter()
                .map(|(picture, bounds)| (picture, bounds, false))
                .collect(),
        );
        self.transforms.clear();
        let items = std::mem::take(&mut self.items);
        tracing::debug!(items = items.len(), damage = ?damage, "scene built");
        Scene { items, damage }
    }
}
