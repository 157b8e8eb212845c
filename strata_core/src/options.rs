// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime switches for debugging the pipeline.

/// Debug switches consulted by the pipeline owner, the painting context and
/// scene building.
///
/// ```
/// use strata_core::options::PipelineOptions;
///
/// let options = PipelineOptions::default()
///     .with_paint_layer_borders(true)
///     .with_disable_opacity_layers(true);
/// assert!(options.paint_layer_borders);
/// assert!(options.check_canvas_save_count);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineOptions {
    /// After each layout, query every intrinsic dimension of the node and
    /// check that the answers are non-negative, finite and ordered. Only
    /// honored in debug builds.
    pub check_intrinsic_sizes: bool,
    /// Build clip layers without pushing a clip into the scene.
    pub disable_clip_layers: bool,
    /// Build opacity layers without pushing an opacity into the scene.
    pub disable_opacity_layers: bool,
    /// Build physical-shape layers without pushing them into the scene.
    pub disable_physical_shape_layers: bool,
    /// Outline each recorded picture with its estimated bounds.
    pub paint_layer_borders: bool,
    /// Check that each paint callback leaves the canvas save count where it
    /// found it. Only honored in debug builds.
    pub check_canvas_save_count: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            check_intrinsic_sizes: false,
            disable_clip_layers: false,
            disable_opacity_layers: false,
            disable_physical_shape_layers: false,
            paint_layer_borders: false,
            check_canvas_save_count: true,
        }
    }
}

impl PipelineOptions {
    /// Sets [`check_intrinsic_sizes`](Self::check_intrinsic_sizes).
    #[must_use]
    pub const fn with_check_intrinsic_sizes(mut self, on: bool) -> Self {
        self.check_intrinsic_sizes = on;
        self
    }

    /// Sets [`disable_clip_layers`](Self::disable_clip_layers).
    #[must_use]
    pub const fn with_disable_clip_layers(mut self, on: bool) -> Self {
        self.disable_clip_layers = on;
        self
    }

    /// Sets [`disable_opacity_layers`](Self::disable_opacity_layers).
    #[must_use]
    pub const fn with_disable_opacity_layers(mut self, on: bool) -> Self {
        self.disable_opacity_layers = on;
        self
    }

    /// Sets [`disable_physical_shape_layers`](Self::disable_physical_shape_layers).
    #[must_use]
    pub const fn with_disable_physical_shape_layers(mut self, on: bool) -> Self {
        self.disable_physical_shape_layers = on;
        self
    }

    /// Sets [`paint_layer_borders`](Self::paint_layer_borders).
    #[must_use]
    pub const fn with_paint_layer_borders(mut self, on: bool) -> Self {
        self.paint_layer_borders = on;
        self
    }

    /// Sets [`check_canvas_save_count`](Self::check_canvas_save_count).
    #[must_use]
    pub const fn with_check_canvas_save_count(mut self, on: bool) -> Self {
        self.check_canvas_save_count = on;
        self
    }
}
