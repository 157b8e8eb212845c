// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-queue channel constants.
//!
//! The pipeline owner keeps its three work queues in one
//! [`understory_dirty`] tracker keyed by node slot index, with one channel
//! per queue. Marking is idempotent, so a node appears at most once per
//! drain no matter how often it was dirtied.
//!
//! None of the channels have dependency edges: propagation up the tree
//! (to the nearest relayout or repaint boundary) is decided by the
//! `mark_needs_*` methods, which enqueue only the node that should do the
//! work.
//!
//! # Consumption
//!
//! Each flush drains its channel, drops entries for nodes that were
//! destroyed since they were marked, and sorts the rest by ascending depth
//! so that parents are processed before their descendants.

use understory_dirty::Channel;

/// Relayout boundaries whose layout is stale.
pub const LAYOUT: Channel = Channel::new(0);

/// Nodes whose `needs_compositing` bit must be recomputed.
pub const COMPOSITING_BITS: Channel = Channel::new(1);

/// Repaint boundaries whose layer contents are stale.
pub const PAINT: Channel = Channel::new(2);
