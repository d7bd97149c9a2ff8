//! Core domain logic for entity management.
//! This crate is the single source of truth for entity invariants.

pub mod clock;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{EntityError, EntityResult, ErrorKind};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::entity::{Entity, EntityId, EntityValidationError};
pub use repo::entity_repo::{EntityRepository, RepoError, RepoResult};
pub use repo::memory::InMemoryEntityRepository;
pub use repo::sqlite::SqliteEntityRepository;
pub use service::entity_service::EntityService;
pub use service::id_gen::{IdGenerator, UuidIdGenerator};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
