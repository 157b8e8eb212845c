// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recorded scenes and damage tracking for strata.
//!
//! This crate provides a [`SceneBuilder`](strata_core::layer::SceneBuilder)
//! that turns [`strata_core`]'s layer tree into a flat, backend-neutral
//! command list. It defines:
//!
//! - [`RenderItem`]: a single scope or draw command
//! - [`Scene`]: the commands for one frame, with the damage since the last one
//! - [`RecordingSceneBuilder`]: keeps engine layer contents between frames so
//!   retained layers can be replayed without rebuilding them
//! - [`DamageRegion`]: spatial damage for partial re-rendering
//! - [`ResourceKey`]: opaque handle for backend-managed textures

#![cfg_attr(docsrs, feature(doc_cfg))]

mod damage;
mod resource;
mod scene;

pub use damage::DamageRegion;
pub use resource::ResourceKey;
pub use scene::{RecordingSceneBuilder, RenderItem, Scene};
