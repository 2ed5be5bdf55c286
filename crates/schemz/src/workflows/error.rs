use std::fmt;

use serde::Serialize;

use super::eligibility::RuleEvaluationError;
use super::repository::RepositoryError;

/// Entities governed by a lifecycle, used to label errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Scheme,
    Application,
    PromotionRequest,
    User,
    Profile,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            EntityKind::Scheme => "scheme",
            EntityKind::Application => "application",
            EntityKind::PromotionRequest => "promotion request",
            EntityKind::User => "user",
            EntityKind::Profile => "profile",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stable error kinds so callers can render "missing input" vs "not allowed right now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    ValidationError,
    NotFound,
    Unauthorized,
    InvalidTransition,
    Conflict,
    PreconditionFailed,
    Internal,
}

impl ErrorCategory {
    pub const fn label(self) -> &'static str {
        match self {
            ErrorCategory::ValidationError => "validation_error",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Unauthorized => "unauthorized",
            ErrorCategory::InvalidTransition => "invalid_transition",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::PreconditionFailed => "precondition_failed",
            ErrorCategory::Internal => "internal",
        }
    }
}

/// Error raised by every workflow operation.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),
    #[error("{entity} '{id}' not found")]
    NotFound { entity: EntityKind, id: String },
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("cannot {attempted} {entity} while it is {from}")]
    InvalidTransition {
        entity: EntityKind,
        from: String,
        attempted: &'static str,
    },
    #[error("{0}")]
    Conflict(String),
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("scheme '{scheme_id}' has an invalid rule: {source}")]
    RuleConfiguration {
        scheme_id: String,
        #[source]
        source: RuleEvaluationError,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl WorkflowError {
    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        WorkflowError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            WorkflowError::Validation(_) | WorkflowError::RuleConfiguration { .. } => {
                ErrorCategory::ValidationError
            }
            WorkflowError::NotFound { .. } => ErrorCategory::NotFound,
            WorkflowError::Unauthorized(_) => ErrorCategory::Unauthorized,
            WorkflowError::InvalidTransition { .. } => ErrorCategory::InvalidTransition,
            WorkflowError::Conflict(_) => ErrorCategory::Conflict,
            WorkflowError::PreconditionFailed(_) => ErrorCategory::PreconditionFailed,
            WorkflowError::Repository(RepositoryError::Conflict(_)) => ErrorCategory::Conflict,
            WorkflowError::Repository(RepositoryError::NotFound) => ErrorCategory::NotFound,
            WorkflowError::Repository(RepositoryError::RoleMismatch { .. }) => {
                ErrorCategory::PreconditionFailed
            }
            WorkflowError::Repository(
                RepositoryError::StaleWrite { .. } | RepositoryError::Unavailable(_),
            ) => ErrorCategory::Internal,
        }
    }
}

/// Translate a failed conditional write into the workflow taxonomy.
///
/// Losing a compare-and-swap race means another caller moved the entity first, which the
/// caller observes as an illegal transition from the state that won.
pub(crate) fn write_error(
    err: RepositoryError,
    entity: EntityKind,
    id: &str,
    attempted: &'static str,
) -> WorkflowError {
    match err {
        RepositoryError::StaleWrite { found } => WorkflowError::InvalidTransition {
            entity,
            from: found,
            attempted,
        },
        RepositoryError::NotFound => WorkflowError::not_found(entity, id),
        RepositoryError::Conflict(message) => WorkflowError::Conflict(message),
        other => WorkflowError::Repository(other),
    }
}

/// Trim `value` and fail with a validation error naming `label` when nothing is left.
pub(crate) fn require_text(value: &str, label: &str) -> Result<String, WorkflowError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(WorkflowError::Validation(format!("{label} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}
