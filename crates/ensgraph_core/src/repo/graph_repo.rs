//! Node/relationship repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `nodes` and `relationships` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Node writes are upserts keyed by `ens_name`.
//! - `find_relationship_between` / `delete_relationship_between` match both
//!   orientations of a pair.
//! - Bulk writes run inside one transaction: all rows land or none do.

use crate::db::DbError;
use crate::model::node::{NodeId, NodeRecord};
use crate::model::relationship::RelationshipRecord;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NODE_SELECT_SQL: &str = "SELECT id, ens_name, created_at, updated_at FROM nodes";
const RELATIONSHIP_SELECT_SQL: &str =
    "SELECT id, user_id, friend_id, created_at FROM relationships";
const NODE_UPSERT_SQL: &str = "INSERT INTO nodes (id, ens_name)
     VALUES (?1, ?2)
     ON CONFLICT (ens_name) DO UPDATE SET updated_at = (CAST(unixepoch('now', 'subsec') * 1000 AS INTEGER));";
const RELATIONSHIP_INSERT_SQL: &str = "INSERT INTO relationships (id, user_id, friend_id)
     VALUES (?1, ?2, ?3)
     RETURNING created_at;";
// Stays well below SQLITE_MAX_VARIABLE_NUMBER on every supported build.
const IN_CLAUSE_CHUNK: usize = 500;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for graph persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A uniqueness or check constraint rejected the write.
    Constraint(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Constraint(message) => write!(f, "constraint violation: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted graph data: {message}"),
        }
    }
}

impl RepoError {
    /// Whether SQLite rejected the statement because a table is absent.
    pub fn is_missing_table(&self) -> bool {
        matches!(
            self,
            Self::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(_, Some(message))))
                if message.starts_with("no such table")
        )
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Constraint(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(err, message) = &value {
            if err.code == ErrorCode::ConstraintViolation {
                return Self::Constraint(
                    message
                        .clone()
                        .unwrap_or_else(|| "constraint failed".to_string()),
                );
            }
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for graph storage.
pub trait GraphRepository {
    /// Gets one node by its normalized name.
    fn find_node(&self, ens_name: &str) -> RepoResult<Option<NodeRecord>>;
    /// Returns the node for `ens_name`, creating it when absent.
    fn get_or_create_node(&self, ens_name: &str) -> RepoResult<NodeRecord>;
    /// Upserts every name in one transaction; returns the number of names written.
    fn upsert_nodes(&self, ens_names: &[String]) -> RepoResult<usize>;
    /// Loads the nodes whose names are in `ens_names`. Missing names are ignored.
    fn find_nodes(&self, ens_names: &[String]) -> RepoResult<Vec<NodeRecord>>;
    /// Lists all nodes, oldest first.
    fn list_nodes(&self) -> RepoResult<Vec<NodeRecord>>;
    /// Deletes one node by name; incident relationships cascade.
    fn delete_node(&self, ens_name: &str) -> RepoResult<bool>;
    /// Finds the relationship joining `a` and `b` in either orientation.
    fn find_relationship_between(
        &self,
        a: NodeId,
        b: NodeId,
    ) -> RepoResult<Option<RelationshipRecord>>;
    /// Inserts one relationship row.
    fn insert_relationship(
        &self,
        user_id: NodeId,
        friend_id: NodeId,
    ) -> RepoResult<RelationshipRecord>;
    /// Inserts all rows in one transaction.
    fn insert_relationships(
        &self,
        pairs: &[(NodeId, NodeId)],
    ) -> RepoResult<Vec<RelationshipRecord>>;
    /// Lists all relationships, newest first.
    fn list_relationships(&self) -> RepoResult<Vec<RelationshipRecord>>;
    /// Deletes the relationship joining `a` and `b` in either orientation.
    fn delete_relationship_between(&self, a: NodeId, b: NodeId) -> RepoResult<usize>;
}

/// SQLite-backed graph repository.
pub struct SqliteGraphRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGraphRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl GraphRepository for SqliteGraphRepository<'_> {
    fn find_node(&self, ens_name: &str) -> RepoResult<Option<NodeRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NODE_SELECT_SQL} WHERE ens_name = ?1;"))?;
        let mut rows = stmt.query([ens_name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_node_row(row)?));
        }
        Ok(None)
    }

    fn get_or_create_node(&self, ens_name: &str) -> RepoResult<NodeRecord> {
        self.conn.execute(
            NODE_UPSERT_SQL,
            params![Uuid::new_v4().to_string(), ens_name],
        )?;
        self.find_node(ens_name)?.ok_or_else(|| {
            RepoError::InvalidData(format!("node `{ens_name}` missing after upsert"))
        })
    }

    fn upsert_nodes(&self, ens_names: &[String]) -> RepoResult<usize> {
        if ens_names.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(NODE_UPSERT_SQL)?;
            for name in ens_names {
                stmt.execute(params![Uuid::new_v4().to_string(), name])?;
            }
        }
        tx.commit()?;
        Ok(ens_names.len())
    }

    fn find_nodes(&self, ens_names: &[String]) -> RepoResult<Vec<NodeRecord>> {
        let mut nodes = Vec::with_capacity(ens_names.len());
        for chunk in ens_names.chunks(IN_CLAUSE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let mut stmt = self.conn.prepare(&format!(
                "{NODE_SELECT_SQL} WHERE ens_name IN ({placeholders});"
            ))?;
            let bind_values = chunk.iter().map(|name| Value::Text(name.clone()));
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            while let Some(row) = rows.next()? {
                nodes.push(parse_node_row(row)?);
            }
        }
        Ok(nodes)
    }

    fn list_nodes(&self) -> RepoResult<Vec<NodeRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NODE_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut nodes = Vec::new();
        while let Some(row) = rows.next()? {
            nodes.push(parse_node_row(row)?);
        }
        Ok(nodes)
    }

    fn delete_node(&self, ens_name: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM nodes WHERE ens_name = ?1;", [ens_name])?;
        Ok(changed > 0)
    }

    fn find_relationship_between(
        &self,
        a: NodeId,
        b: NodeId,
    ) -> RepoResult<Option<RelationshipRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RELATIONSHIP_SELECT_SQL}
             WHERE (user_id = ?1 AND friend_id = ?2)
                OR (user_id = ?2 AND friend_id = ?1)
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query(params![a.to_string(), b.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_relationship_row(row)?));
        }
        Ok(None)
    }

    fn insert_relationship(
        &self,
        user_id: NodeId,
        friend_id: NodeId,
    ) -> RepoResult<RelationshipRecord> {
        insert_relationship_with(self.conn, user_id, friend_id)
    }

    fn insert_relationships(
        &self,
        pairs: &[(NodeId, NodeId)],
    ) -> RepoResult<Vec<RelationshipRecord>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut created = Vec::with_capacity(pairs.len());
        for &(user_id, friend_id) in pairs {
            created.push(insert_relationship_with(&tx, user_id, friend_id)?);
        }
        tx.commit()?;
        Ok(created)
    }

    fn list_relationships(&self) -> RepoResult<Vec<RelationshipRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RELATIONSHIP_SELECT_SQL} ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut relationships = Vec::new();
        while let Some(row) = rows.next()? {
            relationships.push(parse_relationship_row(row)?);
        }
        Ok(relationships)
    }

    fn delete_relationship_between(&self, a: NodeId, b: NodeId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "DELETE FROM relationships
             WHERE (user_id = ?1 AND friend_id = ?2)
                OR (user_id = ?2 AND friend_id = ?1);",
            params![a.to_string(), b.to_string()],
        )?;
        Ok(changed)
    }
}

fn insert_relationship_with(
    conn: &Connection,
    user_id: NodeId,
    friend_id: NodeId,
) -> RepoResult<RelationshipRecord> {
    let id = Uuid::new_v4();
    let created_at: i64 = conn
        .prepare_cached(RELATIONSHIP_INSERT_SQL)?
        .query_row(
            params![id.to_string(), user_id.to_string(), friend_id.to_string()],
            |row| row.get(0),
        )?;

    Ok(RelationshipRecord {
        id,
        user_id,
        friend_id,
        created_at,
    })
}

fn parse_node_row(row: &Row<'_>) -> RepoResult<NodeRecord> {
    Ok(NodeRecord {
        id: parse_uuid(row, "id", "nodes.id")?,
        ens_name: row.get("ens_name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_relationship_row(row: &Row<'_>) -> RepoResult<RelationshipRecord> {
    Ok(RelationshipRecord {
        id: parse_uuid(row, "id", "relationships.id")?,
        user_id: parse_uuid(row, "user_id", "relationships.user_id")?,
        friend_id: parse_uuid(row, "friend_id", "relationships.friend_id")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_uuid(row: &Row<'_>, column: &str, qualified: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {qualified}")))
}
