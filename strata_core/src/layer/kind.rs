// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The closed set of layer kinds and their caller-set properties.

use kurbo::{BezPath, Rect, RoundedRect, Vec2};

use crate::id::LayerLink;
use crate::painting::{Clip, Color, ColorFilter, ImageFilter, Picture};
use crate::transform::Transform3d;

/// What a layer is and the properties it was configured with.
///
/// Every kind except [`Picture`](Self::Picture) and
/// [`Texture`](Self::Texture) is a container and may have children.
/// Properties computed while building a scene (effective transforms, leader
/// offsets) are kept by the [`LayerTree`](super::LayerTree), not here.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerKind {
    /// Groups children without affecting them.
    Container,
    /// A recorded picture.
    Picture {
        /// The recording, once painting has finished.
        picture: Option<Picture>,
        /// Bounds the recording was estimated to cover.
        canvas_bounds: Rect,
        /// Hint that the picture is expensive to rasterize.
        is_complex_hint: bool,
        /// Hint that the picture will change next frame.
        will_change_hint: bool,
    },
    /// An externally produced texture.
    Texture {
        /// Where the texture is drawn.
        rect: Rect,
        /// Opaque texture identifier.
        texture_id: u64,
        /// Whether the texture's contents are frozen.
        freeze: bool,
    },
    /// Translates its children.
    Offset {
        /// The translation.
        offset: Vec2,
    },
    /// Transforms its children.
    Transform {
        /// The transform, applied after `offset`.
        transform: Transform3d,
        /// Additional translation applied before the transform.
        offset: Vec2,
    },
    /// Clips its children to a rectangle.
    ClipRect {
        /// The clip rectangle.
        rect: Rect,
        /// How the edge is rendered.
        clip: Clip,
    },
    /// Clips its children to a rounded rectangle.
    ClipRRect {
        /// The clip shape.
        rrect: RoundedRect,
        /// How the edge is rendered.
        clip: Clip,
    },
    /// Clips its children to a path.
    ClipPath {
        /// The clip path.
        path: BezPath,
        /// How the edge is rendered.
        clip: Clip,
    },
    /// Composites its children with a constant alpha.
    Opacity {
        /// Alpha applied to the children (255 is opaque).
        alpha: u8,
        /// Translation applied to the children.
        offset: Vec2,
    },
    /// Applies a color filter to its children.
    ColorFilter {
        /// The filter.
        filter: ColorFilter,
    },
    /// Filters whatever was drawn behind its children.
    BackdropFilter {
        /// The filter.
        filter: ImageFilter,
    },
    /// A shape with elevation and shadow that clips its children.
    PhysicalShape {
        /// The shape.
        path: BezPath,
        /// Elevation used to render the shadow.
        elevation: f64,
        /// Fill color.
        color: Color,
        /// Shadow color.
        shadow_color: Color,
        /// How the children are clipped to the shape.
        clip: Clip,
    },
    /// Publishes its position so followers can track it.
    Leader {
        /// The link followers refer to.
        link: LayerLink,
        /// Translation applied to the children.
        offset: Vec2,
    },
    /// Positions its children relative to the leader of a link.
    Follower {
        /// The link whose leader is followed.
        link: LayerLink,
        /// Whether the children are shown when no leader is attached.
        show_when_unlinked: bool,
        /// Translation used when no leader is attached.
        unlinked_offset: Vec2,
        /// Translation from the leader's origin when linked.
        linked_offset: Vec2,
    },
}

impl LayerKind {
    /// A picture layer awaiting its recording.
    #[must_use]
    pub fn picture(canvas_bounds: Rect) -> Self {
        Self::Picture {
            picture: None,
            canvas_bounds,
            is_complex_hint: false,
            will_change_hint: false,
        }
    }

    /// An offset layer.
    #[must_use]
    pub fn offset(offset: Vec2) -> Self {
        Self::Offset { offset }
    }

    /// Whether this kind may have children.
    #[must_use]
    pub fn is_container(&self) -> bool {
        !matches!(self, Self::Picture { .. } | Self::Texture { .. })
    }

    /// Whether this kind must be re-added to every scene, so it is never
    /// retained.
    #[must_use]
    pub fn always_needs_add_to_scene(&self) -> bool {
        matches!(self, Self::Leader { .. } | Self::Follower { .. })
    }

    /// Whether `other` is the same variant, ignoring properties.
    #[must_use]
    pub fn same_variant(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Name used in dumps.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Container => "ContainerLayer",
            Self::Picture { .. } => "PictureLayer",
            Self::Texture { .. } => "TextureLayer",
            Self::Offset { .. } => "OffsetLayer",
            Self::Transform { .. } => "TransformLayer",
            Self::ClipRect { .. } => "ClipRectLayer",
            Self::ClipRRect { .. } => "ClipRRectLayer",
            Self::ClipPath { .. } => "ClipPathLayer",
            Self::Opacity { .. } => "OpacityLayer",
            Self::ColorFilter { .. } => "ColorFilterLayer",
            Self::BackdropFilter { .. } => "BackdropFilterLayer",
            Self::PhysicalShape { .. } => "PhysicalModelLayer",
            Self::Leader { .. } => "LeaderLayer",
            Self::Follower { .. } => "FollowerLayer",
        }
    }
}
