//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for nodes and relationships.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Relationship lookups and deletes are symmetric in their two endpoints.
//! - Repository APIs return semantic errors (`Constraint`) in addition to DB
//!   transport errors.

pub mod graph_repo;
