//! Generic repository engine and the entity stores built on it.
//!
//! # Responsibility
//! - Keep SQL templates, key handling and row mapping inside the persistence
//!   boundary.
//! - Let each entity plug in its own mapper instead of hand-writing CRUD.
//!
//! # Invariants
//! - Stores borrow one connection and never open or close it.
//! - No transaction is started here; callers decide commit/rollback.
//! - Every failure is returned to the caller; nothing is logged and dropped.

pub mod address_repo;
pub mod catalog;
pub mod crud_repo;
pub mod cursor;
pub mod error;
pub mod identity;
pub mod people_repo;
pub mod registration;

pub use error::{RepoError, RepoResult};
