// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint styles, clip behaviors and filters shared by the canvas and layers.

use std::fmt;

use crate::transform::Transform3d;

/// A 32-bit ARGB color.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub u32);

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self(0x0000_0000);
    /// Opaque black.
    pub const BLACK: Self = Self(0xFF00_0000);
    /// Opaque white.
    pub const WHITE: Self = Self(0xFFFF_FFFF);

    /// Builds a color from its channels.
    #[must_use]
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// The alpha channel.
    #[must_use]
    pub const fn alpha(self) -> u8 {
        self.0.to_be_bytes()[0]
    }

    /// Returns this color with its alpha replaced.
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self((self.0 & 0x00FF_FFFF) | ((a as u32) << 24))
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color(0x{:08X})", self.0)
    }
}

/// How content is clipped to a shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Clip {
    /// No clipping.
    None,
    /// Clip without anti-aliasing.
    #[default]
    HardEdge,
    /// Clip with anti-aliased edges.
    AntiAlias,
    /// Clip with anti-aliased edges and isolate the content in a save layer.
    AntiAliasWithSaveLayer,
}

impl Clip {
    /// Whether clip edges are anti-aliased.
    #[must_use]
    pub const fn is_anti_aliased(self) -> bool {
        matches!(self, Self::AntiAlias | Self::AntiAliasWithSaveLayer)
    }
}

/// Blend mode for compositing drawn content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Standard source-over alpha compositing.
    #[default]
    SourceOver,
    /// Show the source where the destination is opaque.
    SourceIn,
    /// Multiply blend.
    Multiply,
    /// Screen blend.
    Screen,
    /// Clear the destination.
    Clear,
}

/// Whether shapes are filled or stroked.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PaintStyle {
    /// Fill the interior.
    #[default]
    Fill,
    /// Stroke the outline with the given width.
    Stroke(f64),
}

/// How a shape is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paint {
    /// Fill or stroke color.
    pub color: Color,
    /// Fill or stroke.
    pub style: PaintStyle,
    /// Compositing blend mode.
    pub blend_mode: BlendMode,
    /// Whether edges are anti-aliased.
    pub anti_alias: bool,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            style: PaintStyle::Fill,
            blend_mode: BlendMode::SourceOver,
            anti_alias: true,
        }
    }
}

impl Paint {
    /// A fill paint of the given color.
    #[must_use]
    pub fn fill(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// A stroke paint of the given color and width.
    #[must_use]
    pub fn stroke(color: Color, width: f64) -> Self {
        Self {
            color,
            style: PaintStyle::Stroke(width),
            ..Self::default()
        }
    }
}

/// A filter applied to the colors of composited content.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColorFilter {
    /// Blend a constant color into the content.
    Mode {
        /// The constant color.
        color: Color,
        /// How it is blended.
        blend_mode: BlendMode,
    },
    /// Multiply each RGBA pixel by a 4×5 row-major matrix.
    Matrix([f32; 20]),
}

/// A filter applied to the backdrop behind composited content.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageFilter {
    /// Gaussian blur.
    Blur {
        /// Horizontal standard deviation.
        sigma_x: f64,
        /// Vertical standard deviation.
        sigma_y: f64,
    },
    /// Transform the backdrop.
    Matrix(Transform3d),
}
