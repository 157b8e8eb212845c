// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained-mode render tree with incremental layout, paint and compositing.
//!
//! `strata_core` keeps a tree of box-layout nodes and, every frame, brings
//! the parts that changed up to date. Nodes and layers are stored
//! struct-of-arrays behind generational handles; node behavior is supplied
//! through the [`RenderBox`](node::RenderBox) trait.
//!
//! # Architecture
//!
//! ```text
//!   mark_needs_layout / mark_needs_paint / child list edits
//!       │
//!       ▼
//!   PipelineOwner dirty queues (layout, compositing bits, paint)
//!       │
//!       ▼
//!   flush_layout ──► flush_compositing_bits ──► flush_paint
//!                                                   │
//!                 ┌─────────────────────────────────┘
//!                 ▼
//!   LayerTree ──► build_scene(SceneBuilder) ──► Scene
//! ```
//!
//! **[`constraints`]**: [`BoxConstraints`](constraints::BoxConstraints), the
//! min/max width and height a parent imposes on a child.
//!
//! **[`node`]**: The node arena, child lists, parent data, the layout
//! protocol with relayout boundaries, intrinsic sizing and baselines.
//!
//! **[`pipeline`]**: [`PipelineOwner`](pipeline::PipelineOwner), which owns
//! the node and layer trees and runs the three flushes. Nodes are processed
//! parents first.
//!
//! **[`painting`]**: Recording [`Canvas`](painting::Canvas) and the
//! [`PaintingContext`](painting::PaintingContext) that repaint boundaries
//! paint through, pushing clip, transform, opacity and filter layers when
//! their subtree is composited.
//!
//! **[`layer`]**: The retained [`LayerTree`](layer::LayerTree) and scene
//! building. Unchanged subtrees are handed back to the
//! [`SceneBuilder`](layer::SceneBuilder) as retained engine layers.
//!
//! **[`hit_test`]**: Hit testing with a transform stack, and coordinate
//! conversion between nodes.
//!
//! **[`diagnostics`]**: Errors returned by node callbacks, the
//! [`Diagnostic`](diagnostics::Diagnostic) reported for each, and the
//! [`ContractViolation`](diagnostics::ContractViolation) messages that API
//! misuse panics with.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! frame instrumentation, with the zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-node
//!   layout, compositing and repaint events.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod constraints;
pub mod diagnostics;
pub mod dirty;
pub mod hit_test;
pub mod id;
pub mod layer;
pub mod node;
pub mod options;
pub mod painting;
pub mod pipeline;
pub mod trace;
pub mod transform;
pub mod view;

#[cfg(test)]
mod testing;
