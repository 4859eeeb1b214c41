//! Errors surfaced by the inspection service and the form controllers

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use thiserror::Error;

use crate::store::StoreError;

/// Service-level error kinds
#[derive(Debug, Error, Diagnostic)]
pub enum WalkError {
    #[error("user not authenticated")]
    #[diagnostic(
        code(dwalk::authentication),
        help("set `user.uid` in .dwalk/config.yaml or export DWALK_USER_ID")
    )]
    Authentication,

    #[error("inspection not found: {id}")]
    #[diagnostic(code(dwalk::not_found), help("run `dwalk walk list` to see known inspections"))]
    NotFound { id: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationFailure),

    #[error("inspection {id} changed since it was loaded (expected {expected}, found {actual})")]
    #[diagnostic(code(dwalk::conflict), help("reload the inspection and reapply your changes"))]
    Conflict {
        id: String,
        expected: DateTime<Utc>,
        actual: DateTime<Utc>,
    },

    #[error("document store unavailable")]
    #[diagnostic(code(dwalk::store_unavailable))]
    StoreUnavailable(#[source] StoreError),
}

impl From<StoreError> for WalkError {
    fn from(err: StoreError) -> Self {
        WalkError::StoreUnavailable(err)
    }
}

/// Reasons a submission or a new record is refused before reaching the store
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ValidationFailure {
    #[error("no store selected")]
    #[diagnostic(code(dwalk::validation::store), help("pass --store or set user.store_id"))]
    NoStoreSelected,

    #[error("{} checklist item(s) unanswered: {}", item_ids.len(), format_ids(item_ids))]
    #[diagnostic(
        code(dwalk::validation::incomplete),
        help("answer every item before submitting, or save as a draft")
    )]
    Unanswered { item_ids: Vec<u32> },

    #[error("item {item_id} has not failed, so it cannot be marked fixed")]
    #[diagnostic(code(dwalk::validation::fixed))]
    FixedWithoutFailure { item_id: u32 },

    #[error("checklist item {item_id} does not exist")]
    #[diagnostic(code(dwalk::validation::unknown_item))]
    UnknownItem { item_id: u32 },

    #[error("items do not match the checklist catalog (expected {expected} items)")]
    #[diagnostic(code(dwalk::validation::catalog))]
    CatalogMismatch { expected: usize },

    #[error("cannot change status from {from} to {to}")]
    #[diagnostic(code(dwalk::validation::status))]
    InvalidTransition { from: String, to: String },
}

fn format_ids(ids: &[u32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type WalkResult<T> = Result<T, WalkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unanswered_message_lists_items() {
        let err = ValidationFailure::Unanswered {
            item_ids: vec![3, 26],
        };
        assert_eq!(err.to_string(), "2 checklist item(s) unanswered: 3, 26");
    }

    #[test]
    fn test_store_error_becomes_unavailable() {
        let err: WalkError = StoreError::Backend("disk full".to_string()).into();
        assert!(matches!(err, WalkError::StoreUnavailable(_)));
    }
}
