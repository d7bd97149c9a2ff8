//! Domain error vocabulary shared by the service and its callers.
//!
//! # Invariants
//! - The `ErrorKind` of a failure never changes while it propagates upward;
//!   layers only add context.
//! - Context entries are stored innermost first and rendered outermost first.

use crate::model::entity::EntityValidationError;
use crate::repo::entity_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EntityResult<T> = Result<T, EntityError>;

/// Stable failure classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller-supplied data breaks a business rule.
    InvalidInput,
    /// Referenced identity does not exist.
    NotFound,
    /// Identity already exists where uniqueness is required.
    Conflict,
    /// Unclassified failure.
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
enum Cause {
    Validation(EntityValidationError),
    Repo(RepoError),
}

/// Service-level failure: a kind, a context chain and the root cause.
#[derive(Debug)]
pub struct EntityError {
    kind: ErrorKind,
    context: Vec<String>,
    cause: Cause,
}

impl EntityError {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Context entries, innermost first.
    pub fn context(&self) -> &[String] {
        &self.context
    }

    /// Underlying store failure, when the error came from the store.
    pub fn repo_error(&self) -> Option<&RepoError> {
        match &self.cause {
            Cause::Repo(err) => Some(err),
            Cause::Validation(_) => None,
        }
    }

    /// Underlying business-rule violation, when the error came from validation.
    pub fn validation_error(&self) -> Option<EntityValidationError> {
        match &self.cause {
            Cause::Validation(err) => Some(*err),
            Cause::Repo(_) => None,
        }
    }

    /// Adds an outer context entry without changing the kind.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }
}

impl Display for EntityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for entry in self.context.iter().rev() {
            write!(f, "{entry}: ")?;
        }
        match &self.cause {
            Cause::Validation(err) => write!(f, "{err}"),
            Cause::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EntityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Cause::Validation(err) => Some(err),
            Cause::Repo(err) => Some(err),
        }
    }
}

impl From<EntityValidationError> for EntityError {
    fn from(value: EntityValidationError) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            context: Vec::new(),
            cause: Cause::Validation(value),
        }
    }
}

impl From<RepoError> for EntityError {
    fn from(value: RepoError) -> Self {
        Self {
            kind: value.kind(),
            context: Vec::new(),
            cause: Cause::Repo(value),
        }
    }
}
