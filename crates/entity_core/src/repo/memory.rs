//! In-memory entity store.
//!
//! State lives for the lifetime of the value. All reads and writes go through
//! one `RwLock`, so a write is never partially visible to a concurrent reader.

use crate::clock::{Clock, SystemClock};
use crate::model::entity::{Entity, EntityId};
use crate::repo::entity_repo::{EntityRepository, RepoError, RepoResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// `HashMap`-backed entity store.
pub struct InMemoryEntityRepository {
    entities: RwLock<HashMap<EntityId, Entity>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryEntityRepository {
    /// Creates an empty store stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of entities currently stored.
    pub fn len(&self) -> RepoResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> RepoResult<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> RepoResult<RwLockReadGuard<'_, HashMap<EntityId, Entity>>> {
        self.entities.read().map_err(|_| RepoError::LockPoisoned)
    }

    fn write(&self) -> RepoResult<RwLockWriteGuard<'_, HashMap<EntityId, Entity>>> {
        self.entities.write().map_err(|_| RepoError::LockPoisoned)
    }
}

impl Default for InMemoryEntityRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRepository for InMemoryEntityRepository {
    fn create(&self, entity: &Entity) -> RepoResult<()> {
        let mut entities = self.write()?;
        if entities.contains_key(&entity.id) {
            return Err(RepoError::Conflict(entity.id.clone()));
        }

        let now = self.clock.now_ms();
        entities.insert(
            entity.id.clone(),
            Entity {
                id: entity.id.clone(),
                name: entity.name.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Entity> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    fn update(&self, entity: &Entity) -> RepoResult<()> {
        let mut entities = self.write()?;
        let stored = entities
            .get_mut(&entity.id)
            .ok_or_else(|| RepoError::NotFound(entity.id.clone()))?;

        stored.name = entity.name.clone();
        stored.updated_at = self.clock.now_ms().max(stored.updated_at);
        Ok(())
    }

    fn delete(&self, id: &str) -> RepoResult<()> {
        self.write()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    fn list(&self) -> RepoResult<Vec<Entity>> {
        Ok(self.read()?.values().cloned().collect())
    }
}
