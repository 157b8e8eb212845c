// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node and layer identity types.

use std::fmt;

/// Sentinel value indicating "no node" or "no layer" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a render node in a [`NodeStore`](crate::node::NodeStore).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a node is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    /// Slot index into the store's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the store's generation for this slot.
    pub(crate) generation: u32,
}

impl NodeId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@gen{})", self.idx, self.generation)
    }
}

/// A handle to a layer in a [`LayerTree`](crate::layer::LayerTree).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl LayerId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({}@gen{})", self.idx, self.generation)
    }
}

/// Connects a leader layer with its followers.
///
/// Links are allocated by [`LayerTree::create_link`](crate::layer::LayerTree::create_link).
/// At most one attached leader may hold a link at a time; any number of
/// followers may refer to it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerLink(pub(crate) u32);

impl fmt::Debug for LayerLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerLink({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_formats_index_and_generation() {
        let node = NodeId {
            idx: 3,
            generation: 1,
        };
        assert_eq!(format!("{node:?}"), "NodeId(3@gen1)");
        let layer = LayerId {
            idx: 0,
            generation: 7,
        };
        assert_eq!(format!("{layer:?}"), "LayerId(0@gen7)");
        assert_eq!(format!("{:?}", LayerLink(2)), "LayerLink(2)");
    }
}
