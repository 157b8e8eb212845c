// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::store::NodeStore;
use crate::id::{INVALID, NodeId};

/// An iterator over the direct children of a node, first to last.
///
/// Created by [`NodeStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a NodeStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a NodeStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(self.store.id_at(idx))
    }
}

/// An iterator over a subtree in depth-first pre-order, starting at (and
/// including) its root.
///
/// Created by [`NodeStore::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    store: &'a NodeStore,
    root: u32,
    current: u32,
}

impl<'a> Descendants<'a> {
    pub(crate) fn new(store: &'a NodeStore, root: u32) -> Self {
        Self {
            store,
            root,
            current: root,
        }
    }
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        let first = self.store.first_child[idx as usize];
        self.current = if first != INVALID {
            first
        } else {
            // Climb until a node with a next sibling is found, stopping at the root.
            let mut cursor = idx;
            loop {
                if cursor == self.root {
                    break INVALID;
                }
                let next = self.store.next_sibling[cursor as usize];
                if next != INVALID {
                    break next;
                }
                cursor = self.store.parent[cursor as usize];
            }
        };
        Some(self.store.id_at(idx))
    }
}
