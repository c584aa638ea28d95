use async_trait::async_trait;
use ensgraph_client::{
    backfill_avatars, AvatarCache, ClientError, ClientResult, EnsProfile, FriendsApi, GraphState,
    NameResolver,
};
use ensgraph_core::{
    BatchAddResult, FriendRelationship, GraphEdge, GraphNode, GraphView, NodeRecord, PairKey,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct FakeApi {
    edges: Mutex<Vec<(String, String)>>,
    fetch_error: Mutex<Option<String>>,
    failing_deletes: Mutex<BTreeSet<String>>,
    fetches: AtomicUsize,
}

impl FakeApi {
    fn with_edges(pairs: &[(&str, &str)]) -> Self {
        let api = Self::default();
        *api.edges.lock().unwrap() = pairs
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        api
    }

    fn conflict(message: &str) -> ClientError {
        ClientError::Api {
            status: 409,
            message: message.to_string(),
            code: Some("CONFLICT".to_string()),
        }
    }

    fn relationship(user_id: &str, friend_id: &str) -> FriendRelationship {
        FriendRelationship {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            friend_id: friend_id.to_string(),
            created_at: 0,
        }
    }
}

#[async_trait]
impl FriendsApi for FakeApi {
    async fn get_graph(&self) -> ClientResult<GraphView> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fetch_error.lock().unwrap().clone() {
            return Err(ClientError::Api {
                status: 500,
                message,
                code: Some("DATABASE_ERROR".to_string()),
            });
        }

        let edges = self.edges.lock().unwrap();
        let names: BTreeSet<&str> = edges
            .iter()
            .flat_map(|(a, b)| [a.as_str(), b.as_str()])
            .collect();
        Ok(GraphView {
            nodes: names.into_iter().map(GraphNode::named).collect(),
            edges: edges
                .iter()
                .map(|(a, b)| GraphEdge {
                    from: a.clone(),
                    to: b.clone(),
                    id: Uuid::new_v4(),
                    created_at: 0,
                })
                .collect(),
        })
    }

    async fn list_relationships(&self) -> ClientResult<Vec<FriendRelationship>> {
        let edges = self.edges.lock().unwrap();
        Ok(edges.iter().map(|(a, b)| Self::relationship(a, b)).collect())
    }

    async fn add_relationship(
        &self,
        user_id: &str,
        friend_id: &str,
    ) -> ClientResult<FriendRelationship> {
        if user_id == friend_id {
            return Err(Self::conflict("Cannot create relationship with yourself"));
        }
        let mut edges = self.edges.lock().unwrap();
        let key = PairKey::new(user_id, friend_id);
        if edges
            .iter()
            .any(|(a, b)| PairKey::new(a.as_str(), b.as_str()) == key)
        {
            return Err(Self::conflict("Relationship already exists"));
        }
        edges.push((user_id.to_string(), friend_id.to_string()));
        Ok(Self::relationship(user_id, friend_id))
    }

    async fn add_relationships_batch(
        &self,
        pairs: &[(String, String)],
    ) -> ClientResult<BatchAddResult> {
        let mut result = BatchAddResult::default();
        for (user_id, friend_id) in pairs {
            match self.add_relationship(user_id, friend_id).await {
                Ok(created) => result.created.push(created),
                Err(_) => result.skipped += 1,
            }
        }
        Ok(result)
    }

    async fn delete_relationship(&self, user_id: &str, friend_id: &str) -> ClientResult<()> {
        if self.failing_deletes.lock().unwrap().contains(user_id) {
            return Err(ClientError::Status(500));
        }
        let key = PairKey::new(user_id, friend_id);
        self.edges
            .lock()
            .unwrap()
            .retain(|(a, b)| PairKey::new(a.as_str(), b.as_str()) != key);
        Ok(())
    }

    async fn add_node(&self, ens_name: &str) -> ClientResult<NodeRecord> {
        Ok(NodeRecord {
            id: Uuid::new_v4(),
            ens_name: ens_name.to_string(),
            created_at: 0,
            updated_at: 0,
        })
    }

    async fn add_nodes_batch(&self, ens_names: &[String]) -> ClientResult<usize> {
        Ok(ens_names.iter().collect::<BTreeSet<_>>().len())
    }

    async fn delete_node(&self, _ens_name: &str) -> ClientResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct FakeResolver {
    avatars: HashMap<String, String>,
    calls: AtomicUsize,
}

#[async_trait]
impl NameResolver for FakeResolver {
    async fn resolve_avatar(&self, name: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.avatars.get(name).cloned()
    }

    async fn resolve_profile(&self, _name: &str) -> Option<EnsProfile> {
        None
    }
}

#[tokio::test]
async fn starts_loading_until_first_fetch() {
    let mut state = GraphState::new(FakeApi::with_edges(&[("a.eth", "b.eth")]));
    assert!(state.is_loading());
    assert!(state.graph().is_empty());

    state.refetch().await;

    assert!(!state.is_loading());
    assert_eq!(state.graph().edges.len(), 1);
    assert_eq!(state.error(), None);
}

#[tokio::test]
async fn successful_mutation_refetches() {
    let mut state = GraphState::new(FakeApi::default());
    state.refetch().await;

    let created = state.add_relationship("a.eth", "b.eth").await.unwrap();

    assert_eq!(created.user_id, "a.eth");
    assert_eq!(state.graph().edges.len(), 1);
    assert_eq!(state.api().fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_mutation_records_error_without_refetch() {
    let mut state = GraphState::new(FakeApi::with_edges(&[("a.eth", "b.eth")]));
    state.refetch().await;

    let err = state.add_relationship("b.eth", "a.eth").await.unwrap_err();

    assert_eq!(err.code(), Some("CONFLICT"));
    assert_eq!(state.error(), Some("Relationship already exists"));
    assert_eq!(state.api().fetches.load(Ordering::SeqCst), 1);
    assert_eq!(state.graph().edges.len(), 1);
}

#[tokio::test]
async fn batch_returns_result_and_refreshes_view() {
    let mut state = GraphState::new(FakeApi::default());

    let result = state
        .add_relationships_batch(&[
            ("a.eth".to_string(), "b.eth".to_string()),
            ("b.eth".to_string(), "a.eth".to_string()),
        ])
        .await
        .unwrap();

    assert_eq!(result.created.len(), 1);
    assert_eq!(result.skipped, 1);
    assert_eq!(state.graph().edges.len(), 1);
}

#[tokio::test]
async fn nodes_batch_and_delete_refresh_view() {
    let mut state = GraphState::new(FakeApi::with_edges(&[("a.eth", "b.eth")]));

    let stored = state
        .add_nodes_batch(&["x.eth".to_string(), "x.eth".to_string()])
        .await
        .unwrap();
    assert_eq!(stored, 1);

    state.delete_relationship("b.eth", "a.eth").await.unwrap();
    assert!(state.graph().edges.is_empty());
}

#[tokio::test]
async fn failed_fetch_resets_view_and_flags_missing_schema() {
    let mut state = GraphState::new(FakeApi::with_edges(&[("a.eth", "b.eth")]));
    state.refetch().await;
    assert_eq!(state.graph().edges.len(), 1);

    *state.api().fetch_error.lock().unwrap() = Some("no such table: relationships".to_string());
    state.refetch().await;

    assert!(state.graph().is_empty());
    assert!(state.is_db_error());
    assert_eq!(
        state.error(),
        Some("Database table not found. Please run the migration first.")
    );
}

#[tokio::test]
async fn server_missing_table_message_flags_missing_schema() {
    let api = FakeApi::default();
    *api.fetch_error.lock().unwrap() =
        Some("Database schema not provisioned: missing table".to_string());
    let mut state = GraphState::new(api);

    state.refetch().await;

    assert!(state.is_db_error());
    assert!(state.graph().is_empty());
}

#[tokio::test]
async fn generic_storage_failure_is_not_a_schema_problem() {
    let api = FakeApi::default();
    *api.fetch_error.lock().unwrap() = Some("Database operation failed".to_string());
    let mut state = GraphState::new(api);

    state.refetch().await;

    assert!(!state.is_db_error());
    assert_eq!(state.error(), Some("Database operation failed"));
}

#[tokio::test]
async fn other_fetch_failures_keep_their_message() {
    let api = FakeApi::default();
    *api.fetch_error.lock().unwrap() = Some("connection reset".to_string());
    let mut state = GraphState::new(api);

    state.refetch().await;

    assert!(!state.is_db_error());
    assert_eq!(state.error(), Some("connection reset"));
    assert!(!state.is_loading());
}

#[tokio::test]
async fn clear_all_removes_edges_and_swallows_failures() {
    let api = FakeApi::with_edges(&[("a.eth", "b.eth"), ("c.eth", "d.eth"), ("e.eth", "f.eth")]);
    api.failing_deletes.lock().unwrap().insert("c.eth".to_string());
    let mut state = GraphState::new(api);
    state.refetch().await;

    let mut avatars = AvatarCache::new();
    avatars.insert("a.eth", Some("https://img/a.png".to_string()));

    let removed = state.clear_all(&mut avatars).await;

    assert_eq!(removed, 2);
    assert!(avatars.is_empty());
    assert_eq!(state.graph().edges.len(), 1);
}

#[tokio::test]
async fn backfill_resolves_only_missing_names() {
    let view = GraphView {
        nodes: vec![GraphNode::named("a.eth"), GraphNode::named("solo.eth")],
        edges: vec![GraphEdge {
            from: "a.eth".to_string(),
            to: "b.eth".to_string(),
            id: Uuid::new_v4(),
            created_at: 0,
        }],
    };
    let resolver = FakeResolver {
        avatars: HashMap::from([("b.eth".to_string(), "https://img/b.png".to_string())]),
        ..FakeResolver::default()
    };
    let mut cache = AvatarCache::new();
    cache.insert("a.eth", None);

    let added = backfill_avatars(&view, &mut cache, &resolver).await;

    assert_eq!(added, 2);
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.get("b.eth"), Some("https://img/b.png"));
    assert!(cache.contains("solo.eth"));
    assert_eq!(cache.get("solo.eth"), None);

    assert_eq!(backfill_avatars(&view, &mut cache, &resolver).await, 0);
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
}
