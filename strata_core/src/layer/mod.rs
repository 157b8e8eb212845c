// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The retained layer tree that painting produces and compositing consumes.
//!
//! Layers are stored struct-of-arrays in a [`LayerTree`] and addressed by
//! generational [`LayerId`](crate::id::LayerId) handles. Each layer records
//! whether it changed since the last scene; unchanged subtrees are handed
//! back to the [`SceneBuilder`] as retained [`EngineLayer`]s.

mod kind;
mod scene;
mod tree;

pub use kind::LayerKind;
pub use scene::{EngineLayer, PhysicalShape, SceneBuilder};
pub use tree::{LayerTree, SceneOptions};
