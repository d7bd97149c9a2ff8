//! Entity store contract and its storage variants.
//!
//! # Responsibility
//! - Define the persistence contract the service depends on.
//! - Own the canonical entity collection and its uniqueness/existence rules.
//!
//! # Invariants
//! - Stores classify `NotFound`/`Conflict` at the point of detection.
//! - Every operation is atomic with respect to every other operation.
//! - Stores stamp `created_at`/`updated_at`; callers never do.
//! - Stores never log and never call back into the service.

pub mod entity_repo;
pub mod memory;
pub mod sqlite;
