//! Minimal object-relational persistence for people and their addresses.
//!
//! A generic CRUD engine ([`CrudRepository`]) is parameterized by per-entity
//! mappers. [`PeopleRepository`] rebuilds whole person graphs from a single
//! join and cascades saves into [`AddressRepository`] and child rows.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use model::address::{Address, AddressId, Region};
pub use model::person::{Person, PersonId};
pub use repo::address_repo::{AddressMapper, AddressRepository};
pub use repo::catalog::{CrudOperation, OperationCatalog};
pub use repo::crud_repo::{CrudRepository, EntityMapper};
pub use repo::cursor::ResultCursor;
pub use repo::identity::IdentityAccessor;
pub use repo::people_repo::{reconstruct_person, PeopleRepository, PersonMapper};
pub use repo::registration::EntityRegistration;
pub use repo::{RepoError, RepoResult};
