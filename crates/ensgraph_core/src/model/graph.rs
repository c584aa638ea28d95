//! Wire projections of the graph shared by the HTTP server and its clients.

use crate::model::relationship::RelationshipId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Graph node as returned by the read API. `id` and `label` are both the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
}

impl GraphNode {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            id: name,
        }
    }
}

/// Graph edge between two names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub id: RelationshipId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Full read-only projection of the store: every node and every relationship.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphView {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Every name mentioned by a node or an edge endpoint, sorted.
    pub fn referenced_names(&self) -> BTreeSet<&str> {
        let mut names: BTreeSet<&str> = self.nodes.iter().map(|node| node.id.as_str()).collect();
        for edge in &self.edges {
            names.insert(edge.from.as_str());
            names.insert(edge.to.as_str());
        }
        names
    }
}

/// Relationship with both endpoints resolved back to names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRelationship {
    pub id: RelationshipId,
    pub user_id: String,
    pub friend_id: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Outcome of a batch relationship insert.
///
/// `created.len() + skipped` equals the number of submitted pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAddResult {
    pub created: Vec<FriendRelationship>,
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::{GraphEdge, GraphNode, GraphView};
    use uuid::Uuid;

    #[test]
    fn referenced_names_include_edge_endpoints() {
        let view = GraphView {
            nodes: vec![GraphNode::named("solo.eth")],
            edges: vec![GraphEdge {
                from: "b.eth".to_string(),
                to: "a.eth".to_string(),
                id: Uuid::new_v4(),
                created_at: 0,
            }],
        };

        let names: Vec<&str> = view.referenced_names().into_iter().collect();
        assert_eq!(names, vec!["a.eth", "b.eth", "solo.eth"]);
    }

    #[test]
    fn graph_node_serializes_with_label() {
        let json = serde_json::to_value(GraphNode::named("x.eth")).unwrap();
        assert_eq!(json, serde_json::json!({"id": "x.eth", "label": "x.eth"}));
    }
}
