//! Domain model for the ENS relationship graph.
//!
//! # Responsibility
//! - Define the stored records (`NodeRecord`, `RelationshipRecord`).
//! - Define the wire projections shared by server and client (`GraphView`,
//!   `FriendRelationship`, `BatchAddResult`).
//!
//! # Invariants
//! - Every node is identified by a stable `NodeId` and a unique normalized name.
//! - Relationships are undirected; `PairKey` is the canonical unordered identity.

pub mod graph;
pub mod node;
pub mod relationship;
