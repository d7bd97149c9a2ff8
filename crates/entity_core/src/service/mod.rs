//! Core use-case services.
//!
//! # Responsibility
//! - Gate store access behind business-rule validation.
//! - Assign identities and translate store failures into `EntityError`.
//! - Keep callers decoupled from storage details.

pub mod entity_service;
pub mod id_gen;
