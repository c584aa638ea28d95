//! Relationship store and graph rules for the ENS friend graph.
//!
//! Everything that decides what a valid graph looks like lives here; the
//! HTTP server and the client crates only move these types around.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::graph::{BatchAddResult, FriendRelationship, GraphEdge, GraphNode, GraphView};
pub use model::node::{normalize_ens_name, NameValidationError, NodeId, NodeRecord};
pub use model::relationship::{PairKey, RelationshipId, RelationshipRecord};
pub use repo::graph_repo::{GraphRepository, RepoError, RepoResult, SqliteGraphRepository};
pub use service::friend_service::{FriendService, FriendServiceError};
