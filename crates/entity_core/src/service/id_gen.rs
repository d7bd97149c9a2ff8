//! Identity generation for newly created entities.

use crate::model::entity::EntityId;
use uuid::Uuid;

/// Source of fresh entity identities.
///
/// Implementations must be collision resistant: the store's `Conflict` path is
/// only reachable when a generator repeats itself.
pub trait IdGenerator {
    fn generate(&self) -> EntityId;
}

/// Random 128-bit (UUID v4) identities in hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self) -> EntityId {
        Uuid::new_v4().to_string()
    }
}

impl<F> IdGenerator for F
where
    F: Fn() -> EntityId,
{
    fn generate(&self) -> EntityId {
        self()
    }
}
