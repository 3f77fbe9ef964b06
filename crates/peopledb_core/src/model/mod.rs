//! Domain model persisted by the people store.
//!
//! # Responsibility
//! - Define the `Person` entity and the `Address` value it owns.
//!
//! # Invariants
//! - Keys are `None` until the store assigns them and never change afterwards.
//! - Associations are plain `Option`s; nothing is encoded as a sentinel value.

pub mod address;
pub mod person;
