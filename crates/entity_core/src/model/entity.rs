//! Entity domain model.
//!
//! # Responsibility
//! - Define the single record type managed by the core.
//! - Provide the business-rule check applied before any store access.
//!
//! # Invariants
//! - `id` is empty until the service assigns one; it never changes afterwards.
//! - `created_at <= updated_at` for every persisted record.
//! - `name` is never empty for a persisted record.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque identifier assigned to an entity on creation.
///
/// Kept as a type alias so signatures say what the string means.
pub type EntityId = String;

/// Business-rule violation detected on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityValidationError {
    /// `name` is empty.
    EmptyName,
}

impl Display for EntityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "entity name must not be empty"),
        }
    }
}

impl Error for EntityValidationError {}

/// Canonical entity record.
///
/// Timestamps are Unix epoch milliseconds and are owned by the store: values
/// supplied by callers on create/update are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Empty before creation.
    #[serde(default)]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Entity {
    /// Creates an unsaved entity with the given name and no identity yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates an entity reference for update calls.
    pub fn with_id(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Checks the business rules callers must satisfy on create and update.
    ///
    /// # Errors
    /// - `EmptyName` when `name` is the empty string.
    pub fn validate(&self) -> Result<(), EntityValidationError> {
        if self.name.is_empty() {
            return Err(EntityValidationError::EmptyName);
        }
        Ok(())
    }

    /// Returns whether this record has been assigned an identity.
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}
