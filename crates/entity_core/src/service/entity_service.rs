//! Entity use-case service.
//!
//! # Responsibility
//! - Provide the create/get/update/delete/list entry points for callers.
//! - Reject invalid input before the store is touched.
//! - Assign identities on create.
//!
//! # Invariants
//! - Service APIs never bypass the store.
//! - Store failures keep their `ErrorKind`; the service only adds context.
//! - No retries: every store failure ends the calling operation.

use crate::error::{EntityError, EntityResult, ErrorKind};
use crate::model::entity::{Entity, EntityId};
use crate::repo::entity_repo::EntityRepository;
use crate::service::id_gen::{IdGenerator, UuidIdGenerator};

/// Business-rule gate in front of an entity store.
pub struct EntityService<R: EntityRepository, G: IdGenerator = UuidIdGenerator> {
    repo: R,
    ids: G,
}

impl<R: EntityRepository> EntityService<R> {
    /// Creates a service assigning random UUID identities.
    pub fn new(repo: R) -> Self {
        Self::with_id_generator(repo, UuidIdGenerator)
    }
}

impl<R: EntityRepository, G: IdGenerator> EntityService<R, G> {
    pub fn with_id_generator(repo: R, ids: G) -> Self {
        Self { repo, ids }
    }

    /// Borrows the underlying store.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Validates and persists a new entity, returning its assigned id.
    ///
    /// Any caller-supplied `id` and timestamps are ignored.
    ///
    /// # Errors
    /// - `InvalidInput` when `name` is empty; the store is not touched.
    /// - `Conflict` from the store, unchanged.
    /// - Any other store failure, with `create entity` context.
    pub fn create(&self, entity: &Entity) -> EntityResult<EntityId> {
        entity.validate()?;

        let record = Entity {
            id: self.ids.generate(),
            name: entity.name.clone(),
            ..Entity::default()
        };

        if let Err(err) = self.repo.create(&record) {
            let err = EntityError::from(err);
            if err.kind() == ErrorKind::Conflict {
                return Err(err);
            }
            return Err(err.with_context("create entity"));
        }

        Ok(record.id)
    }

    /// Gets one entity by id.
    pub fn get_by_id(&self, id: &str) -> EntityResult<Entity> {
        self.repo
            .find_by_id(id)
            .map_err(|err| EntityError::from(err).with_context(format!("find entity with id {id}")))
    }

    /// Renames an existing entity.
    ///
    /// # Errors
    /// - `InvalidInput` when `name` is empty; the store is not touched.
    /// - `NotFound` when `entity.id` does not exist.
    pub fn update(&self, entity: &Entity) -> EntityResult<()> {
        entity.validate()?;

        self.repo.update(entity).map_err(|err| {
            EntityError::from(err).with_context(format!("update entity with id {}", entity.id))
        })
    }

    pub fn delete(&self, id: &str) -> EntityResult<()> {
        self.repo.delete(id).map_err(|err| {
            EntityError::from(err).with_context(format!("delete entity with id {id}"))
        })
    }

    /// Lists every live entity in store order.
    pub fn list(&self) -> EntityResult<Vec<Entity>> {
        self.repo
            .list()
            .map_err(|err| EntityError::from(err).with_context("list entities"))
    }
}
