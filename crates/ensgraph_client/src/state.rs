//! Client-side graph state: the last fetched view plus loading and error flags.
//!
//! Every successful mutation is followed by a full refetch; the view is never
//! patched locally.

use crate::api::FriendsApi;
use crate::avatar::AvatarCache;
use crate::error::ClientResult;
use ensgraph_core::{BatchAddResult, FriendRelationship, GraphView};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

/// Error shown instead of the raw failure when the store is not provisioned.
pub const STORE_NOT_PROVISIONED: &str =
    "Database table not found. Please run the migration first.";

static SCHEMA_MISSING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"no such table|does not exist|table|schema|PGRST")
        .expect("valid schema marker regex")
});

/// Whether an error message points at missing tables rather than a transient failure.
pub fn is_schema_missing(message: &str) -> bool {
    SCHEMA_MISSING_RE.is_match(message)
}

pub struct GraphState<A: FriendsApi> {
    api: A,
    graph: GraphView,
    loading: bool,
    error: Option<String>,
    db_error: bool,
}

impl<A: FriendsApi> GraphState<A> {
    /// Starts in the loading state with an empty view; call [`Self::refetch`] to load.
    pub fn new(api: A) -> Self {
        Self {
            api,
            graph: GraphView::default(),
            loading: true,
            error: None,
            db_error: false,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn graph(&self) -> &GraphView {
        &self.graph
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_db_error(&self) -> bool {
        self.db_error
    }

    /// Reloads the view. On failure the view resets to empty and the error is recorded.
    pub async fn refetch(&mut self) {
        self.loading = true;
        self.error = None;
        self.db_error = false;

        match self.api.get_graph().await {
            Ok(graph) => {
                self.graph = graph;
            }
            Err(err) => {
                let message = err.to_string();
                warn!("event=graph_fetch module=state status=error error={message}");
                if is_schema_missing(&message) {
                    self.db_error = true;
                    self.error = Some(STORE_NOT_PROVISIONED.to_string());
                } else {
                    self.error = Some(message);
                }
                self.graph = GraphView::default();
            }
        }

        self.loading = false;
    }

    async fn settle<T>(&mut self, outcome: ClientResult<T>) -> ClientResult<T> {
        self.error = None;
        match outcome {
            Ok(value) => {
                self.refetch().await;
                Ok(value)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn add_relationship(
        &mut self,
        user_id: &str,
        friend_id: &str,
    ) -> ClientResult<FriendRelationship> {
        let outcome = self.api.add_relationship(user_id, friend_id).await;
        self.settle(outcome).await
    }

    pub async fn add_relationships_batch(
        &mut self,
        pairs: &[(String, String)],
    ) -> ClientResult<BatchAddResult> {
        let outcome = self.api.add_relationships_batch(pairs).await;
        self.settle(outcome).await
    }

    pub async fn add_nodes_batch(&mut self, ens_names: &[String]) -> ClientResult<usize> {
        let outcome = self.api.add_nodes_batch(ens_names).await;
        self.settle(outcome).await
    }

    pub async fn delete_relationship(&mut self, user_id: &str, friend_id: &str) -> ClientResult<()> {
        let outcome = self.api.delete_relationship(user_id, friend_id).await;
        self.settle(outcome).await
    }

    /// Deletes every edge of the current view, then clears `avatars` and refetches.
    ///
    /// Individual delete failures are logged and skipped. Returns the number
    /// of edges removed.
    pub async fn clear_all(&mut self, avatars: &mut AvatarCache) -> usize {
        let pairs: Vec<(String, String)> = self
            .graph
            .edges
            .iter()
            .map(|edge| (edge.from.clone(), edge.to.clone()))
            .collect();

        let mut removed = 0;
        for (from, to) in &pairs {
            match self.api.delete_relationship(from, to).await {
                Ok(()) => removed += 1,
                Err(err) => {
                    warn!("event=graph_clear module=state status=error from={from} to={to} error={err}");
                }
            }
        }

        avatars.clear();
        self.refetch().await;
        info!(
            "event=graph_clear module=state status=ok removed={removed} total={}",
            pairs.len()
        );
        removed
    }
}
