//! Entity store contract and store-level errors.

use crate::db::DbError;
use crate::error::ErrorKind;
use crate::model::entity::{Entity, EntityId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level failure.
#[derive(Debug)]
pub enum RepoError {
    /// No live entity has this id.
    NotFound(EntityId),
    /// An entity with this id already exists.
    Conflict(EntityId),
    Db(DbError),
    /// Persisted state violates the entity invariants.
    InvalidData(String),
    /// A writer panicked while holding the store lock.
    LockPoisoned,
    /// Connection schema has not been migrated to the expected version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Stable classification used by the service and its callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Db(_)
            | Self::InvalidData(_)
            | Self::LockPoisoned
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => ErrorKind::Internal,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "entity not found: {id}"),
            Self::Conflict(id) => write!(f, "entity already exists: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted entity data: {message}"),
            Self::LockPoisoned => write!(f, "entity store lock poisoned"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
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
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract for entities.
///
/// Implementations hand out owned copies; mutating a returned record never
/// affects stored state.
pub trait EntityRepository {
    /// Stores a copy of `entity`, stamping both timestamps with the current time.
    ///
    /// # Errors
    /// - `Conflict` when an entity with the same id exists.
    fn create(&self, entity: &Entity) -> RepoResult<()>;

    /// # Errors
    /// - `NotFound` when no entity has `id`.
    fn find_by_id(&self, id: &str) -> RepoResult<Entity>;

    /// Replaces the stored name and refreshes `updated_at`.
    ///
    /// `created_at` is preserved and `updated_at` never moves backwards.
    ///
    /// # Errors
    /// - `NotFound` when no entity has `entity.id`.
    fn update(&self, entity: &Entity) -> RepoResult<()>;

    /// # Errors
    /// - `NotFound` when no entity has `id`.
    fn delete(&self, id: &str) -> RepoResult<()>;

    /// Returns every stored entity; order is unspecified.
    fn list(&self) -> RepoResult<Vec<Entity>>;
}

impl<T: EntityRepository + ?Sized> EntityRepository for Box<T> {
    fn create(&self, entity: &Entity) -> RepoResult<()> {
        (**self).create(entity)
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Entity> {
        (**self).find_by_id(id)
    }

    fn update(&self, entity: &Entity) -> RepoResult<()> {
        (**self).update(entity)
    }

    fn delete(&self, id: &str) -> RepoResult<()> {
        (**self).delete(id)
    }

    fn list(&self) -> RepoResult<Vec<Entity>> {
        (**self).list()
    }
}

impl<T: EntityRepository + ?Sized> EntityRepository for Arc<T> {
    fn create(&self, entity: &Entity) -> RepoResult<()> {
        (**self).create(entity)
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Entity> {
        (**self).find_by_id(id)
    }

    fn update(&self, entity: &Entity) -> RepoResult<()> {
        (**self).update(entity)
    }

    fn delete(&self, id: &str) -> RepoResult<()> {
        (**self).delete(id)
    }

    fn list(&self) -> RepoResult<Vec<Entity>> {
        (**self).list()
    }
}
