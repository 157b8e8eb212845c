// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render tree: node storage, the [`RenderBox`] protocol, and the
//! layout, intrinsic sizing, paint-marking and hit-testing machinery around
//! it.
//!
//! Nodes live in a struct-of-arrays [`NodeStore`] owned by the
//! [`PipelineOwner`](crate::pipeline::PipelineOwner) and are addressed by
//! generational [`NodeId`] handles. A node's behavior is a boxed
//! [`RenderBox`]; every callback receives a context ([`LayoutCx`],
//! [`IntrinsicCx`], [`HitTestCx`] or a
//! [`PaintingContext`](crate::painting::PaintingContext)) through which it
//! reaches its children.

mod behavior;
mod child_list;
mod intrinsics;
mod layout;
mod paint;
mod store;
mod traverse;

pub use crate::id::NodeId;
pub use behavior::{ParentData, RenderBox, TextBaseline};
pub use hit_test::HitTestCx;
pub use intrinsics::{IntrinsicCx, IntrinsicDimension};
pub use layout::LayoutCx;
pub use store::NodeStore;
pub use traverse::{Children, Descendants};
