// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording canvases and the context nodes paint through.

mod canvas;
mod context;
mod style;

pub use canvas::{Canvas, PaintOp, Picture};
pub use context::{PaintingContext, PhysicalModel};
pub use style::{BlendMode, Clip, Color, ColorFilter, ImageFilter, Paint, PaintStyle};
