//! Friend relationship use-case service.
//!
//! # Responsibility
//! - Translate name pairs into node references and relationship rows.
//! - Enforce the no-self-relationship and no-duplicate-edge rules.
//! - Project stored rows into the `GraphView` read model.
//!
//! # Invariants
//! - Names are normalized before any comparison or write.
//! - A pair is a duplicate when it exists in either orientation.
//! - Batch inserts record each queued pair in the dedup set before looking at
//!   the next one, so repeated pairs inside one batch are queued once.

use crate::model::graph::{BatchAddResult, FriendRelationship, GraphEdge, GraphNode, GraphView};
use crate::model::node::{normalize_ens_name, NameValidationError, NodeId, NodeRecord};
use crate::model::relationship::{PairKey, RelationshipRecord};
use crate::repo::graph_repo::{GraphRepository, RepoError};
use log::{info, warn};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for friend graph use-cases.
#[derive(Debug)]
pub enum FriendServiceError {
    /// Input name failed normalization.
    InvalidName(NameValidationError),
    /// Both endpoints resolve to the same name.
    SelfRelationship(String),
    /// The unordered pair is already stored.
    DuplicateRelationship { user_id: String, friend_id: String },
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for FriendServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(err) => write!(f, "{err}"),
            Self::SelfRelationship(name) => {
                write!(f, "user cannot be friends with themselves: `{name}`")
            }
            Self::DuplicateRelationship { user_id, friend_id } => write!(
                f,
                "friendship relationship already exists: `{user_id}` <-> `{friend_id}`"
            ),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent graph state: {details}"),
        }
    }
}

impl Error for FriendServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidName(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for FriendServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<NameValidationError> for FriendServiceError {
    fn from(value: NameValidationError) -> Self {
        Self::InvalidName(value)
    }
}

pub type FriendServiceResult<T> = Result<T, FriendServiceError>;

/// Friend graph service facade over repository implementations.
pub struct FriendService<R: GraphRepository> {
    repo: R,
}

impl<R: GraphRepository> FriendService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds one undirected relationship between two names.
    ///
    /// # Errors
    /// - `SelfRelationship` when both names normalize to the same value.
    /// - `DuplicateRelationship` when the pair exists in either orientation.
    pub fn add_relationship(
        &self,
        user_id: &str,
        friend_id: &str,
    ) -> FriendServiceResult<FriendRelationship> {
        let user_name = normalize_ens_name(user_id)?;
        let friend_name = normalize_ens_name(friend_id)?;
        if user_name == friend_name {
            return Err(FriendServiceError::SelfRelationship(user_name));
        }

        let existing_user = self.repo.find_node(&user_name)?;
        let existing_friend = self.repo.find_node(&friend_name)?;
        if let (Some(user), Some(friend)) = (&existing_user, &existing_friend) {
            if self
                .repo
                .find_relationship_between(user.id, friend.id)?
                .is_some()
            {
                return Err(FriendServiceError::DuplicateRelationship {
                    user_id: user_name,
                    friend_id: friend_name,
                });
            }
        }

        let user = self.node_or_create(existing_user, &user_name)?;
        let friend = self.node_or_create(existing_friend, &friend_name)?;
        let record = self
            .repo
            .insert_relationship(user.id, friend.id)
            .map_err(|err| match err {
                RepoError::Constraint(_) => FriendServiceError::DuplicateRelationship {
                    user_id: user_name.clone(),
                    friend_id: friend_name.clone(),
                },
                other => FriendServiceError::Repo(other),
            })?;

        info!(
            "event=relationship_add module=friend_service status=ok relationship_id={}",
            record.id
        );
        Ok(FriendRelationship {
            id: record.id,
            user_id: user_name,
            friend_id: friend_name,
            created_at: record.created_at,
        })
    }

    /// Adds many relationships at once, skipping self pairs and duplicates.
    ///
    /// Duplicates against storage and inside the batch are counted in
    /// `skipped`, never reported as errors.
    pub fn add_relationships_batch(
        &self,
        pairs: &[(String, String)],
    ) -> FriendServiceResult<BatchAddResult> {
        let mut candidates = Vec::with_capacity(pairs.len());
        for (user_id, friend_id) in pairs {
            let user_name = normalize_ens_name(user_id)?;
            let friend_name = normalize_ens_name(friend_id)?;
            if user_name != friend_name {
                candidates.push((user_name, friend_name));
            }
        }

        if candidates.is_empty() {
            info!(
                "event=relationship_batch module=friend_service status=ok created=0 skipped={}",
                pairs.len()
            );
            return Ok(BatchAddResult {
                created: Vec::new(),
                skipped: pairs.len(),
            });
        }

        let names = candidates
            .iter()
            .flat_map(|(user, friend)| [user.clone(), friend.clone()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        self.repo.upsert_nodes(&names)?;

        let nodes = self.repo.find_nodes(&names)?;
        let ids_by_name: HashMap<&str, NodeId> = nodes
            .iter()
            .map(|node| (node.ens_name.as_str(), node.id))
            .collect();

        let mut known_pairs: HashSet<PairKey<NodeId>> = self
            .repo
            .list_relationships()?
            .iter()
            .map(RelationshipRecord::pair_key)
            .collect();

        let mut queued = Vec::new();
        for (user_name, friend_name) in &candidates {
            let (Some(&user), Some(&friend)) = (
                ids_by_name.get(user_name.as_str()),
                ids_by_name.get(friend_name.as_str()),
            ) else {
                return Err(FriendServiceError::InconsistentState(
                    "batch node missing after upsert",
                ));
            };
            if known_pairs.insert(PairKey::new(user, friend)) {
                queued.push((user, friend));
            }
        }

        let names_by_id = names_by_id(&nodes);
        let created = self
            .repo
            .insert_relationships(&queued)?
            .iter()
            .map(|record| resolve_relationship(record, &names_by_id))
            .collect::<FriendServiceResult<Vec<_>>>()?;
        let skipped = pairs.len() - created.len();

        info!(
            "event=relationship_batch module=friend_service status=ok created={} skipped={}",
            created.len(),
            skipped
        );
        Ok(BatchAddResult { created, skipped })
    }

    /// Deletes the relationship between two names in either orientation.
    ///
    /// Unknown names are a no-op, not an error.
    pub fn delete_relationship(&self, user_id: &str, friend_id: &str) -> FriendServiceResult<()> {
        let user_name = normalize_ens_name(user_id)?;
        let friend_name = normalize_ens_name(friend_id)?;

        let user = self.repo.find_node(&user_name)?;
        let friend = self.repo.find_node(&friend_name)?;
        let (Some(user), Some(friend)) = (user, friend) else {
            info!(
                "event=relationship_delete module=friend_service status=skipped reason=node_missing"
            );
            return Ok(());
        };

        let removed = self.repo.delete_relationship_between(user.id, friend.id)?;
        info!(
            "event=relationship_delete module=friend_service status=ok removed={}",
            removed
        );
        Ok(())
    }

    /// Adds one standalone node. Idempotent.
    pub fn add_node(&self, ens_name: &str) -> FriendServiceResult<NodeRecord> {
        let name = normalize_ens_name(ens_name)?;
        Ok(self.repo.get_or_create_node(&name)?)
    }

    /// Adds many standalone nodes; returns the number of distinct names written.
    pub fn add_nodes_batch(&self, ens_names: &[String]) -> FriendServiceResult<usize> {
        let names = ens_names
            .iter()
            .map(|name| normalize_ens_name(name))
            .collect::<Result<BTreeSet<_>, _>>()?
            .into_iter()
            .collect::<Vec<_>>();
        let written = self.repo.upsert_nodes(&names)?;
        info!(
            "event=node_batch module=friend_service status=ok created={}",
            written
        );
        Ok(written)
    }

    /// Deletes one node by name; relationships touching it cascade in storage.
    ///
    /// Returns whether a node was removed.
    pub fn delete_node(&self, ens_name: &str) -> FriendServiceResult<bool> {
        let name = normalize_ens_name(ens_name)?;
        let removed = self.repo.delete_node(&name)?;
        info!(
            "event=node_delete module=friend_service status=ok removed={}",
            removed
        );
        Ok(removed)
    }

    /// Lists every relationship with endpoints resolved to names, newest first.
    pub fn list_relationships(&self) -> FriendServiceResult<Vec<FriendRelationship>> {
        let nodes = self.repo.list_nodes()?;
        let names_by_id = names_by_id(&nodes);
        self.repo
            .list_relationships()?
            .iter()
            .map(|record| resolve_relationship(record, &names_by_id))
            .collect()
    }

    /// Builds the full graph projection from storage.
    pub fn get_graph_data(&self) -> FriendServiceResult<GraphView> {
        let nodes = self.repo.list_nodes()?;
        let relationships = self.repo.list_relationships()?;
        let names_by_id = names_by_id(&nodes);

        let mut edges = Vec::with_capacity(relationships.len());
        for record in &relationships {
            match (
                names_by_id.get(&record.user_id),
                names_by_id.get(&record.friend_id),
            ) {
                (Some(from), Some(to)) => edges.push(GraphEdge {
                    from: (*from).to_string(),
                    to: (*to).to_string(),
                    id: record.id,
                    created_at: record.created_at,
                }),
                _ => warn!(
                    "event=graph_build module=friend_service status=skipped reason=dangling_edge relationship_id={}",
                    record.id
                ),
            }
        }

        Ok(GraphView {
            nodes: nodes
                .iter()
                .map(|node| GraphNode::named(node.ens_name.as_str()))
                .collect(),
            edges,
        })
    }

    fn node_or_create(
        &self,
        existing: Option<NodeRecord>,
        name: &str,
    ) -> FriendServiceResult<NodeRecord> {
        match existing {
            Some(node) => Ok(node),
            None => Ok(self.repo.get_or_create_node(name)?),
        }
    }
}

fn names_by_id(nodes: &[NodeRecord]) -> HashMap<NodeId, &str> {
    nodes
        .iter()
        .map(|node| (node.id, node.ens_name.as_str()))
        .collect()
}

fn resolve_relationship(
    record: &RelationshipRecord,
    names_by_id: &HashMap<NodeId, &str>,
) -> FriendServiceResult<FriendRelationship> {
    match (
        names_by_id.get(&record.user_id),
        names_by_id.get(&record.friend_id),
    ) {
        (Some(user), Some(friend)) => Ok(FriendRelationship {
            id: record.id,
            user_id: (*user).to_string(),
            friend_id: (*friend).to_string(),
            created_at: record.created_at,
        }),
        _ => Err(FriendServiceError::InconsistentState(
            "relationship endpoint has no node",
        )),
    }
}
