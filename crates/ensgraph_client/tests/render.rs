use ensgraph_client::render::{edge_opacity, node_opacity, node_size};
use ensgraph_client::{build_visual_graph, stable_hash, AvatarCache, NodeImage};
use ensgraph_core::{GraphEdge, GraphNode, GraphView};
use uuid::Uuid;

fn edge(from: &str, to: &str) -> GraphEdge {
    GraphEdge {
        from: from.to_string(),
        to: to.to_string(),
        id: Uuid::new_v4(),
        created_at: 0,
    }
}

#[test]
fn stable_hash_matches_rolling_31_hash() {
    assert_eq!(stable_hash(""), 0);
    assert_eq!(stable_hash("a"), 97);
    assert_eq!(stable_hash("ab"), 97 * 31 + 98);
    // Wraps past i32::MAX and takes the absolute value.
    assert_eq!(stable_hash("vitalik.eth"), stable_hash("vitalik.eth"));
    assert_eq!(stable_hash("zzzzzzzzzzzzzzzz"), {
        let mut hash: i32 = 0;
        for unit in "zzzzzzzzzzzzzzzz".encode_utf16() {
            hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
        }
        hash.unsigned_abs()
    });
}

#[test]
fn node_variation_stays_in_range() {
    for name in ["a.eth", "vitalik.eth", "nick.eth", "\u{1F600}.eth"] {
        let opacity = node_opacity(name);
        assert!((0.5..0.8).contains(&opacity));
        assert!((28..34).contains(&node_size(name)));
    }
}

#[test]
fn edge_opacity_ignores_orientation() {
    assert_eq!(edge_opacity("a.eth", "b.eth"), edge_opacity("b.eth", "a.eth"));
    let opacity = edge_opacity("a.eth", "b.eth");
    assert!((0.15..0.35).contains(&opacity));
}

#[test]
fn builds_nodes_with_avatars_and_placeholders() {
    let view = GraphView {
        nodes: vec![GraphNode::named("a.eth"), GraphNode::named("b.eth")],
        edges: vec![edge("a.eth", "b.eth")],
    };
    let mut avatars = AvatarCache::new();
    avatars.insert("a.eth", Some("https://img/a.png".to_string()));
    avatars.insert("b.eth", None);

    let visual = build_visual_graph(&view, &avatars);

    assert_eq!(visual.nodes.len(), 2);
    assert_eq!(
        visual.nodes[0].image,
        NodeImage::Avatar("https://img/a.png".to_string())
    );
    assert_eq!(visual.nodes[1].image, NodeImage::Placeholder);
    assert_eq!(visual.nodes[0].opacity, node_opacity("a.eth"));
    assert_eq!(visual.nodes[0].size, node_size("a.eth"));
}

#[test]
fn collapses_duplicate_nodes_and_reversed_edges() {
    let view = GraphView {
        nodes: vec![GraphNode::named("a.eth"), GraphNode::named("a.eth")],
        edges: vec![edge("a.eth", "b.eth"), edge("b.eth", "a.eth")],
    };

    let visual = build_visual_graph(&view, &AvatarCache::new());

    let ids: Vec<&str> = visual.nodes.iter().map(|node| node.id.as_str()).collect();
    assert_eq!(ids, vec!["a.eth", "b.eth"]);
    assert_eq!(visual.edges.len(), 1);
    assert_eq!(visual.edges[0].key, "a.eth|b.eth");
}

#[test]
fn rebuild_is_deterministic() {
    let view = GraphView {
        nodes: vec![GraphNode::named("x.eth")],
        edges: vec![edge("x.eth", "y.eth"), edge("y.eth", "z.eth")],
    };
    let avatars = AvatarCache::new();

    assert_eq!(build_visual_graph(&view, &avatars), build_visual_graph(&view, &avatars));
}

#[test]
fn empty_view_builds_empty_model() {
    let visual = build_visual_graph(&GraphView::default(), &AvatarCache::new());
    assert!(visual.nodes.is_empty());
    assert!(visual.edges.is_empty());
}
