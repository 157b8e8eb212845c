// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A recording canvas and the immutable pictures it produces.

use std::sync::Arc;

use kurbo::{BezPath, Rect, RoundedRect, Vec2};

use super::style::Paint;
use crate::transform::Transform3d;

/// A single recorded drawing command.
#[derive(Clone, Debug, PartialEq)]
pub enum PaintOp {
    /// Push the current transform and clip.
    Save,
    /// Push the current state and start an offscreen layer.
    SaveLayer {
        /// Bounds hint for the layer.
        bounds: Option<Rect>,
        /// Paint applied when the layer is composited back.
        paint: Paint,
    },
    /// Pop the most recent save.
    Restore,
    /// Pre-multiply the current transform.
    Transform(Transform3d),
    /// Intersect the clip with a rectangle.
    ClipRect {
        /// The clip rectangle.
        rect: Rect,
        /// Whether the clip edge is anti-aliased.
        anti_alias: bool,
    },
    /// Intersect the clip with a rounded rectangle.
    ClipRRect {
        /// The clip shape.
        rrect: RoundedRect,
        /// Whether the clip edge is anti-aliased.
        anti_alias: bool,
    },
    /// Intersect the clip with a path.
    ClipPath {
        /// The clip path.
        path: BezPath,
        /// Whether the clip edge is anti-aliased.
        anti_alias: bool,
    },
    /// Draw a rectangle.
    DrawRect {
        /// The rectangle.
        rect: Rect,
        /// How it is drawn.
        paint: Paint,
    },
    /// Draw a rounded rectangle.
    DrawRRect {
        /// The shape.
        rrect: RoundedRect,
        /// How it is drawn.
        paint: Paint,
    },
    /// Draw a path.
    DrawPath {
        /// The path.
        path: BezPath,
        /// How it is drawn.
        paint: Paint,
    },
    /// Replay another picture.
    DrawPicture(Picture),
}

/// An immutable recording of drawing commands.
///
/// Cloning is cheap; clones share the same command list.
#[derive(Clone, Debug)]
pub struct Picture {
    ops: Arc<[PaintOp]>,
    cull_rect: Rect,
}

impl Picture {
    /// The recorded commands.
    #[must_use]
    pub fn ops(&self) -> &[PaintOp] {
        &self.ops
    }

    /// Number of recorded commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The bounds the picture was recorded for.
    #[must_use]
    pub fn cull_rect(&self) -> Rect {
        self.cull_rect
    }

    /// Whether both pictures share the same recording.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.ops, &other.ops)
    }
}

impl PartialEq for Picture {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.cull_rect == other.cull_rect && self.ops == other.ops)
    }
}

/// Records drawing commands into a [`Picture`].
///
/// The save count starts at 1; `restore` at that depth is ignored.
#[derive(Debug)]
pub struct Canvas {
    ops: Vec<PaintOp>,
    save_count: usize,
    cull_rect: Rect,
}

impl Canvas {
    /// Starts a recording whose content is expected to fall within
    /// `cull_rect`.
    #[must_use]
    pub fn new(cull_rect: Rect) -> Self {
        Self {
            ops: Vec::new(),
            save_count: 1,
            cull_rect,
        }
    }

    /// Number of saves currently on the stack, plus one.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.save_count
    }

    /// Saves the transform and clip.
    pub fn save(&mut self) {
        self.ops.push(PaintOp::Save);
        self.save_count += 1;
    }

    /// Saves the transform and clip and starts an offscreen layer.
    pub fn save_layer(&mut self, bounds: Option<Rect>, paint: Paint) {
        self.ops.push(PaintOp::SaveLayer { bounds, paint });
        self.save_count += 1;
    }

    /// Pops the most recent save.
    pub fn restore(&mut self) {
        if self.save_count > 1 {
            self.ops.push(PaintOp::Restore);
            self.save_count -= 1;
        }
    }

    /// Translates the coordinate space.
    pub fn translate(&mut self, offset: Vec2) {
        if offset != Vec2::ZERO {
            self.ops
                .push(PaintOp::Transform(Transform3d::from_offset(offset)));
        }
    }

    /// Scales the coordinate space.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.ops
            .push(PaintOp::Transform(Transform3d::from_scale(sx, sy, 1.0)));
    }

    /// Pre-multiplies the current transform.
    pub fn transform(&mut self, transform: &Transform3d) {
        self.ops.push(PaintOp::Transform(*transform));
    }

    /// Intersects the clip with `rect`.
    pub fn clip_rect(&mut self, rect: Rect, anti_alias: bool) {
        self.ops.push(PaintOp::ClipRect { rect, anti_alias });
    }

    /// Intersects the clip with `rrect`.
    pub fn clip_rrect(&mut self, rrect: RoundedRect, anti_alias: bool) {
        self.ops.push(PaintOp::ClipRRect { rrect, anti_alias });
    }

    /// Intersects the clip with `path`.
    pub fn clip_path(&mut self, path: &BezPath, anti_alias: bool) {
        self.ops.push(PaintOp::ClipPath {
            path: path.clone(),
            anti_alias,
        });
    }

    /// Draws a rectangle.
    pub fn draw_rect(&mut self, rect: Rect, paint: &Paint) {
        self.ops.push(PaintOp::DrawRect {
            rect,
            paint: *paint,
        });
    }

    /// Draws a rounded rectangle.
    pub fn draw_rrect(&mut self, rrect: RoundedRect, paint: &Paint) {
        self.ops.push(PaintOp::DrawRRect {
            rrect,
            paint: *paint,
        });
    }

    /// Draws a path.
    pub fn draw_path(&mut self, path: &BezPath, paint: &Paint) {
        self.ops.push(PaintOp::DrawPath {
            path: path.clone(),
            paint: *paint,
        });
    }

    /// Replays a picture.
    pub fn draw_picture(&mut self, picture: &Picture) {
        self.ops.push(PaintOp::DrawPicture(picture.clone()));
    }

    /// Ends the recording. Unbalanced saves are closed.
    #[must_use]
    pub fn finish(mut self) -> Picture {
        while self.save_count > 1 {
            self.restore();
        }
        Picture {
            ops: self.ops.into(),
            cull_rect: self.cull_rect,
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use super::*;
    use crate::painting::style::Color;

    #[test]
    fn save_count_tracks_saves_and_ignores_extra_restores() {
        let mut canvas = Canvas::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(canvas.save_count(), 1);
        canvas.save();
        canvas.save_layer(None, Paint::default());
        assert_eq!(canvas.save_count(), 3);
        canvas.restore();
        canvas.restore();
        canvas.restore();
        assert_eq!(canvas.save_count(), 1);
        let picture = canvas.finish();
        assert_eq!(picture.len(), 4);
    }

    #[test]
    fn finish_closes_unbalanced_saves() {
        let mut canvas = Canvas::new(Rect::ZERO);
        canvas.save();
        canvas.clip_rect(Rect::new(0.0, 0.0, 1.0, 1.0), false);
        let picture = canvas.finish();
        assert_eq!(picture.ops().last(), Some(&PaintOp::Restore));
    }

    #[test]
    fn zero_translation_is_not_recorded() {
        let mut canvas = Canvas::new(Rect::ZERO);
        canvas.translate(Vec2::ZERO);
        assert!(canvas.finish().is_empty());
    }

    #[test]
    fn pictures_share_recordings() {
        let mut canvas = Canvas::new(Rect::new(0.0, 0.0, 4.0, 4.0));
        let mut path = BezPath::new();
        path.move_to(Point::ORIGIN);
        path.line_to((4.0, 4.0));
        canvas.draw_path(&path, &Paint::stroke(Color::WHITE, 1.0));
        let picture = canvas.finish();
        let copy = picture.clone();
        assert!(picture.ptr_eq(&copy));

        let mut outer = Canvas::new(Rect::ZERO);
        outer.draw_picture(&picture);
        let outer = outer.finish();
        match &outer.ops()[0] {
            PaintOp::DrawPicture(inner) => assert!(inner.ptr_eq(&picture)),
            other => panic!("unexpected op {other:?}"),
        }
    }
}
