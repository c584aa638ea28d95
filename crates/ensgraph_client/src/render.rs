//! Visualization model built from a graph view and the avatar cache.
//!
//! Everything here is pure: the same view and cache always produce the same
//! model, including the per-entity opacity and size variation.

use crate::avatar::AvatarCache;
use ensgraph_core::{GraphView, PairKey};
use serde::Serialize;
use std::collections::HashSet;

/// Image shown for a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum NodeImage {
    Avatar(String),
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualNode {
    pub id: String,
    pub label: String,
    pub image: NodeImage,
    pub opacity: f64,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualEdge {
    /// Sorted endpoints joined with `|`.
    pub key: String,
    pub from: String,
    pub to: String,
    pub opacity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisualGraph {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
}

/// 31-multiplier rolling hash over UTF-16 code units with 32-bit wraparound,
/// returned as its absolute value.
pub fn stable_hash(value: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in value.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    hash.unsigned_abs()
}

pub fn node_opacity(id: &str) -> f64 {
    0.5 + f64::from(stable_hash(id) % 30) / 100.0
}

pub fn node_size(id: &str) -> u32 {
    28 + stable_hash(id) % 6
}

/// Edge opacity keyed on the sorted pair, so orientation does not matter.
pub fn edge_opacity(a: &str, b: &str) -> f64 {
    let key = PairKey::new(a, b).joined();
    0.15 + f64::from(stable_hash(&key) % 20) / 100.0
}

fn visual_node(id: &str, label: &str, avatars: &AvatarCache) -> VisualNode {
    let image = match avatars.get(id) {
        Some(url) => NodeImage::Avatar(url.to_string()),
        None => NodeImage::Placeholder,
    };
    VisualNode {
        id: id.to_string(),
        label: label.to_string(),
        image,
        opacity: node_opacity(id),
        size: node_size(id),
    }
}

/// Builds the visualization model.
///
/// Nodes keep view order, followed by any name that only appears as an edge
/// endpoint. Duplicate nodes and duplicate unordered edges collapse to one.
pub fn build_visual_graph(view: &GraphView, avatars: &AvatarCache) -> VisualGraph {
    let mut seen_nodes: HashSet<&str> = HashSet::new();
    let mut nodes = Vec::with_capacity(view.nodes.len());

    for node in &view.nodes {
        if seen_nodes.insert(node.id.as_str()) {
            nodes.push(visual_node(&node.id, &node.label, avatars));
        }
    }

    let mut seen_edges: HashSet<String> = HashSet::new();
    let mut edges = Vec::with_capacity(view.edges.len());

    for edge in &view.edges {
        for endpoint in [edge.from.as_str(), edge.to.as_str()] {
            if seen_nodes.insert(endpoint) {
                nodes.push(visual_node(endpoint, endpoint, avatars));
            }
        }

        let key = PairKey::new(edge.from.as_str(), edge.to.as_str()).joined();
        if seen_edges.contains(&key) {
            continue;
        }
        edges.push(VisualEdge {
            opacity: edge_opacity(&edge.from, &edge.to),
            key: key.clone(),
            from: edge.from.clone(),
            to: edge.to.clone(),
        });
        seen_edges.insert(key);
    }

    VisualGraph { nodes, edges }
}
