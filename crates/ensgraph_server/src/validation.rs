//! Request body shapes and the validating JSON extractor.
//!
//! Bodies are first deserialized into permissive raw shapes (every field
//! optional) so that missing fields surface as field-level issues instead of
//! a bare deserialization error.

use crate::error::ApiError;
use axum::extract::{FromRequest, Request};
use axum::Json;
use ensgraph_core::{normalize_ens_name, NameValidationError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One rejected field, addressed by a dotted path such as `relationships.0.user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Conversion from a raw body into a checked request.
pub trait Validate: Sized + Send {
    type Raw: DeserializeOwned + Send;

    fn validate(raw: Self::Raw) -> Result<Self, Vec<FieldIssue>>;
}

/// JSON body extractor that rejects with a `VALIDATION_ERROR` envelope.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(raw) = Json::<T::Raw>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::validation(vec![FieldIssue::new("body", rejection.body_text())])
            })?;
        T::validate(raw).map(Self).map_err(ApiError::validation)
    }
}

/// Normalized ENS name from a required field; problems are recorded at `path`.
fn required_name(
    value: Option<String>,
    path: impl Into<String>,
    missing: &str,
    issues: &mut Vec<FieldIssue>,
) -> String {
    let result = match value.as_deref() {
        None => Err(missing.to_string()),
        Some(raw) => normalize_ens_name(raw).map_err(|err| match err {
            NameValidationError::Empty => missing.to_string(),
            other => other.to_string(),
        }),
    };
    result.unwrap_or_else(|message| {
        issues.push(FieldIssue::new(path, message));
        String::new()
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct RawRelationshipPair {
    pub user_id: Option<String>,
    pub friend_id: Option<String>,
}

/// Body of `POST /add` and `DELETE /delete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipPairRequest {
    pub user_id: String,
    pub friend_id: String,
}

impl RelationshipPairRequest {
    fn check(raw: RawRelationshipPair, prefix: &str, issues: &mut Vec<FieldIssue>) -> Self {
        let user_id = required_name(
            raw.user_id,
            format!("{prefix}user_id"),
            "User ID is required",
            issues,
        );
        let friend_id = required_name(
            raw.friend_id,
            format!("{prefix}friend_id"),
            "Friend ID is required",
            issues,
        );
        Self { user_id, friend_id }
    }
}

impl Validate for RelationshipPairRequest {
    type Raw = RawRelationshipPair;

    fn validate(raw: Self::Raw) -> Result<Self, Vec<FieldIssue>> {
        let mut issues = Vec::new();
        let request = Self::check(raw, "", &mut issues);
        if issues.is_empty() {
            Ok(request)
        } else {
            Err(issues)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RawBatchRelationships {
    pub relationships: Option<Vec<RawRelationshipPair>>,
}

/// Body of `POST /batch`: a non-empty list of pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRelationshipsRequest {
    pub pairs: Vec<(String, String)>,
}

impl Validate for BatchRelationshipsRequest {
    type Raw = RawBatchRelationships;

    fn validate(raw: Self::Raw) -> Result<Self, Vec<FieldIssue>> {
        let entries = match raw.relationships {
            Some(entries) if !entries.is_empty() => entries,
            _ => {
                return Err(vec![FieldIssue::new(
                    "relationships",
                    "At least one relationship is required",
                )])
            }
        };

        let mut issues = Vec::new();
        let pairs = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let checked = RelationshipPairRequest::check(
                    entry,
                    &format!("relationships.{index}."),
                    &mut issues,
                );
                (checked.user_id, checked.friend_id)
            })
            .collect();

        if issues.is_empty() {
            Ok(Self { pairs })
        } else {
            Err(issues)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RawAddNode {
    pub ens_name: Option<String>,
}

/// Body of `POST /nodes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddNodeRequest {
    pub ens_name: String,
}

impl Validate for AddNodeRequest {
    type Raw = RawAddNode;

    fn validate(raw: Self::Raw) -> Result<Self, Vec<FieldIssue>> {
        let mut issues = Vec::new();
        let ens_name = required_name(raw.ens_name, "ens_name", "ENS name is required", &mut issues);
        if issues.is_empty() {
            Ok(Self { ens_name })
        } else {
            Err(issues)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RawAddNodesBatch {
    pub ens_names: Option<Vec<Option<String>>>,
}

/// Body of `POST /nodes/batch`: a non-empty list of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddNodesBatchRequest {
    pub ens_names: Vec<String>,
}

impl Validate for AddNodesBatchRequest {
    type Raw = RawAddNodesBatch;

    fn validate(raw: Self::Raw) -> Result<Self, Vec<FieldIssue>> {
        let entries = match raw.ens_names {
            Some(entries) if !entries.is_empty() => entries,
            _ => {
                return Err(vec![FieldIssue::new(
                    "ens_names",
                    "At least one ENS name is required",
                )])
            }
        };

        let mut issues = Vec::new();
        let ens_names = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                required_name(
                    entry,
                    format!("ens_names.{index}"),
                    "ENS name is required",
                    &mut issues,
                )
            })
            .collect();

        if issues.is_empty() {
            Ok(Self { ens_names })
        } else {
            Err(issues)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_pair(user_id: Option<&str>, friend_id: Option<&str>) -> RawRelationshipPair {
        RawRelationshipPair {
            user_id: user_id.map(str::to_string),
            friend_id: friend_id.map(str::to_string),
        }
    }

    #[test]
    fn pair_requires_both_fields() {
        let issues = RelationshipPairRequest::validate(raw_pair(None, Some("  "))).unwrap_err();
        let paths: Vec<&str> = issues.iter().map(|issue| issue.path.as_str()).collect();
        assert_eq!(paths, vec!["user_id", "friend_id"]);
        assert_eq!(issues[0].message, "User ID is required");
    }

    #[test]
    fn batch_rejects_empty_list() {
        let raw = RawBatchRelationships {
            relationships: Some(Vec::new()),
        };
        let issues = BatchRelationshipsRequest::validate(raw).unwrap_err();
        assert_eq!(issues[0].path, "relationships");
    }

    #[test]
    fn batch_issue_paths_carry_index() {
        let raw = RawBatchRelationships {
            relationships: Some(vec![
                raw_pair(Some("a.eth"), Some("b.eth")),
                raw_pair(Some("c.eth"), None),
            ]),
        };
        let issues = BatchRelationshipsRequest::validate(raw).unwrap_err();
        assert_eq!(issues, vec![FieldIssue::new("relationships.1.friend_id", "Friend ID is required")]);
    }

    #[test]
    fn batch_keeps_pair_order() {
        let raw = RawBatchRelationships {
            relationships: Some(vec![
                raw_pair(Some("a.eth"), Some("b.eth")),
                raw_pair(Some("b.eth"), Some("a.eth")),
            ]),
        };
        let request = BatchRelationshipsRequest::validate(raw).unwrap();
        assert_eq!(request.pairs[1], ("b.eth".to_string(), "a.eth".to_string()));
    }

    #[test]
    fn nodes_batch_rejects_blank_entries() {
        let raw = RawAddNodesBatch {
            ens_names: Some(vec![Some("a.eth".to_string()), Some(" ".to_string()), None]),
        };
        let issues = AddNodesBatchRequest::validate(raw).unwrap_err();
        let paths: Vec<&str> = issues.iter().map(|issue| issue.path.as_str()).collect();
        assert_eq!(paths, vec!["ens_names.1", "ens_names.2"]);
    }

    #[test]
    fn names_are_normalized_while_validating() {
        let request =
            RelationshipPairRequest::validate(raw_pair(Some(" Alice.ETH "), Some("bob.eth"))).unwrap();
        assert_eq!(request.user_id, "alice.eth");
        assert_eq!(request.friend_id, "bob.eth");
    }

    #[test]
    fn malformed_names_are_reported_at_their_own_path() {
        let issues =
            RelationshipPairRequest::validate(raw_pair(Some("a.eth"), Some("b c.eth"))).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "friend_id");
        assert!(issues[0].message.contains("invalid character"));

        let raw = RawBatchRelationships {
            relationships: Some(vec![
                raw_pair(Some("a.eth"), Some("b.eth")),
                raw_pair(Some("c\u{7}.eth"), Some("d.eth")),
            ]),
        };
        let issues = BatchRelationshipsRequest::validate(raw).unwrap_err();
        assert_eq!(issues[0].path, "relationships.1.user_id");

        let raw = RawAddNodesBatch {
            ens_names: Some(vec![Some("a.eth".to_string()), Some("x\ty.eth".to_string())]),
        };
        let issues = AddNodesBatchRequest::validate(raw).unwrap_err();
        assert_eq!(issues[0].path, "ens_names.1");
    }

    #[test]
    fn node_requires_name() {
        assert!(AddNodeRequest::validate(RawAddNode::default()).is_err());
        let request = AddNodeRequest::validate(RawAddNode {
            ens_name: Some("x.eth".to_string()),
        })
        .unwrap();
        assert_eq!(request.ens_name, "x.eth");
    }
}
