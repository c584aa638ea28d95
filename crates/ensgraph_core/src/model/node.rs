//! Node domain model.
//!
//! # Responsibility
//! - Define the stored record for one ENS name in the graph.
//! - Normalize user-provided names into their canonical stored form.
//!
//! # Invariants
//! - `ens_name` is trimmed, lowercase and non-empty.
//! - `id` is stable and never reused for another name.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a node row.
pub type NodeId = Uuid;

/// One named entity in the relationship graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    /// Normalized ENS name; unique across the store.
    pub ens_name: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Bumped on every upsert that touches the row.
    pub updated_at: i64,
}

/// Name rejected by `normalize_ens_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    /// Name is empty after trimming.
    Empty,
    /// Name contains whitespace or control characters inside it.
    InvalidCharacter { name: String, character: char },
}

impl Display for NameValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "ENS name cannot be empty"),
            Self::InvalidCharacter { name, character } => {
                write!(f, "ENS name `{name}` contains invalid character {character:?}")
            }
        }
    }
}

impl Error for NameValidationError {}

/// Normalizes a user-provided ENS name to its stored form.
///
/// Trims surrounding whitespace and lowercases. Full ENSIP-15 normalization is
/// left to the resolution client.
pub fn normalize_ens_name(raw: &str) -> Result<String, NameValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NameValidationError::Empty);
    }
    if let Some(character) = trimmed
        .chars()
        .find(|ch| ch.is_whitespace() || ch.is_control())
    {
        return Err(NameValidationError::InvalidCharacter {
            name: trimmed.to_string(),
            character,
        });
    }
    Ok(trimmed.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::{normalize_ens_name, NameValidationError};

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_ens_name("  Vitalik.ETH ").unwrap(), "vitalik.eth");
    }

    #[test]
    fn normalize_rejects_blank_input() {
        assert_eq!(normalize_ens_name(" \t ").unwrap_err(), NameValidationError::Empty);
    }

    #[test]
    fn normalize_rejects_inner_whitespace() {
        let err = normalize_ens_name("nick .eth").unwrap_err();
        assert!(matches!(
            err,
            NameValidationError::InvalidCharacter { character: ' ', .. }
        ));
    }
}
