use ensgraph_client::{ClientError, FriendsApi, HttpFriendsApi};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EDGE_ID: &str = "6f1f5b0e-7a59-4f43-9f6e-3b1f7e0a9c11";

#[tokio::test]
async fn get_graph_unwraps_success_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/friends/graph"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "nodes": [{ "id": "a.eth", "label": "a.eth" }, { "id": "b.eth", "label": "b.eth" }],
                "edges": [{ "from": "a.eth", "to": "b.eth", "id": EDGE_ID, "created_at": 1700000000000i64 }]
            }
        })))
        .mount(&server)
        .await;

    let api = HttpFriendsApi::new(&server.uri()).unwrap();
    let graph = api.get_graph().await.unwrap();

    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.edges[0].from, "a.eth");
    assert_eq!(graph.edges[0].id.to_string(), EDGE_ID);
}

#[tokio::test]
async fn error_envelope_becomes_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/friends/add"))
        .and(body_json(json!({ "user_id": "a.eth", "friend_id": "a.eth" })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "success": false,
            "error": "Cannot create relationship with yourself",
            "code": "CONFLICT"
        })))
        .mount(&server)
        .await;

    let api = HttpFriendsApi::new(&server.uri()).unwrap();
    let err = api.add_relationship("a.eth", "a.eth").await.unwrap_err();

    assert_eq!(err.code(), Some("CONFLICT"));
    assert_eq!(err.to_string(), "Cannot create relationship with yourself");
    assert!(matches!(err, ClientError::Api { status: 409, .. }));
}

#[tokio::test]
async fn unreadable_error_body_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/friends/relationships"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let api = HttpFriendsApi::new(&server.uri()).unwrap();
    let err = api.list_relationships().await.unwrap_err();

    assert!(matches!(err, ClientError::Status(502)));
    assert_eq!(err.to_string(), "Request failed with status 502");
}

#[tokio::test]
async fn batch_posts_relationships_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/friends/batch"))
        .and(body_json(json!({
            "relationships": [
                { "user_id": "a.eth", "friend_id": "b.eth" },
                { "user_id": "b.eth", "friend_id": "a.eth" }
            ]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": {
                "created": [{ "id": EDGE_ID, "user_id": "a.eth", "friend_id": "b.eth", "created_at": 1 }],
                "skipped": 1
            },
            "message": "Created 1 relationships, skipped 1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpFriendsApi::new(&server.uri()).unwrap();
    let result = api
        .add_relationships_batch(&[
            ("a.eth".to_string(), "b.eth".to_string()),
            ("b.eth".to_string(), "a.eth".to_string()),
        ])
        .await
        .unwrap();

    assert_eq!(result.created.len(), 1);
    assert_eq!(result.skipped, 1);
}

#[tokio::test]
async fn delete_relationship_accepts_null_data() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/friends/delete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": null,
            "message": "Friendship relationship deleted successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpFriendsApi::new(&server.uri()).unwrap();
    api.delete_relationship("a.eth", "b.eth").await.unwrap();
}

#[tokio::test]
async fn nodes_batch_returns_created_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/friends/nodes/batch"))
        .and(body_json(json!({ "ens_names": ["x.eth", "y.eth"] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": { "created": 2 }
        })))
        .mount(&server)
        .await;

    let api = HttpFriendsApi::new(&server.uri()).unwrap();
    let created = api
        .add_nodes_batch(&["x.eth".to_string(), "y.eth".to_string()])
        .await
        .unwrap();

    assert_eq!(created, 2);
}

#[tokio::test]
async fn delete_node_targets_name_path() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/friends/nodes/x.eth"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "error": "Node not found",
            "code": "NOT_FOUND"
        })))
        .mount(&server)
        .await;

    let api = HttpFriendsApi::new(&server.uri()).unwrap();
    let err = api.delete_node("x.eth").await.unwrap_err();

    assert_eq!(err.code(), Some("NOT_FOUND"));
}
