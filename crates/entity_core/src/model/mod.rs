//! Domain model for managed entities.
//!
//! # Responsibility
//! - Define the canonical record exchanged between service, store and callers.
//!
//! # Invariants
//! - Every persisted entity is identified by a unique `EntityId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod entity;
