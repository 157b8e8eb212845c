// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON snapshots of the node tree, the layer tree and diagnostics.

use kurbo::{Size, Vec2};
use serde_json::{Value, json};

use strata_core::diagnostics::Diagnostic;
use strata_core::id::{LayerId, NodeId};
use strata_core::layer::LayerTree;
use strata_core::node::NodeStore;
use strata_core::pipeline::PipelineOwner;

fn size_json(size: Option<Size>) -> Value {
    size.map_or(Value::Null, |s| json!([s.width, s.height]))
}

fn vec_json(v: Vec2) -> Value {
    json!([v.x, v.y])
}

/// Describes `root` and its descendants.
///
/// Each node object has its slot index, type name, constraints, size,
/// offset, dirty flags and `children`.
#[must_use]
pub fn node_tree_json(nodes: &NodeStore, root: NodeId) -> Value {
    let children: Vec<Value> = nodes
        .children(root)
        .map(|child| node_tree_json(nodes, child))
        .collect();
    json!({
        "id": root.index(),
        "type": nodes.type_name(root),
        "constraints": nodes.constraints(root).map(|c| c.to_string()),
        "size": size_json(nodes.size(root)),
        "offset": vec_json(nodes.offset(root)),
        "relayout_boundary": nodes.relayout_boundary(root) == Some(root),
        "repaint_boundary": nodes.is_repaint_boundary(root),
        "needs_layout": nodes.needs_layout(root),
        "needs_paint": nodes.needs_paint(root),
        "needs_compositing": nodes.needs_compositing(root),
        "layer": nodes.layer(root).map(LayerId::index),
        "children": children,
    })
}

/// Describes the layer `root` and its descendants.
#[must_use]
pub fn layer_tree_json(layers: &LayerTree, root: LayerId) -> Value {
    let children: Vec<Value> = layers
        .children(root)
        .into_iter()
        .map(|child| layer_tree_json(layers, child))
        .collect();
    json!({
        "id": root.index(),
        "kind": layers.kind(root).name(),
        "offset": layers.offset(root).map(vec_json),
        "engine_layer": layers.engine_layer(root).map(|e| e.0),
        "needs_add_to_scene": layers.needs_add_to_scene(root),
        "children": children,
    })
}

/// Describes each diagnostic, including the subtree dump taken when it was
/// reported.
#[must_use]
pub fn diagnostics_json(diagnostics: &[Diagnostic]) -> Value {
    Value::Array(
        diagnostics
            .iter()
            .map(|d| {
                json!({
                    "phase": d.phase.label(),
                    "node": d.node.index(),
                    "type": d.type_name,
                    "error": d.error.to_string(),
                    "subtree": d.subtree,
                })
            })
            .collect(),
    )
}

/// Snapshot of everything the owner holds: the frame index, both trees and
/// pending diagnostics.
#[must_use]
pub fn pipeline_json(owner: &PipelineOwner) -> Value {
    json!({
        "frame": owner.frame_index(),
        "nodes": owner.root().map(|root| node_tree_json(owner.nodes(), root)),
        "layers": owner.root_layer().map(|root| layer_tree_json(owner.layers(), root)),
        "diagnostics": diagnostics_json(owner.diagnostics()),
    })
}
