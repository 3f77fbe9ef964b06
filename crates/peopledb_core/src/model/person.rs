//! Person entity.
//!
//! # Responsibility
//! - Hold a person's own fields plus the associations the store cascades.
//! - Keep the parent/child link consistent in both directions.
//!
//! # Invariants
//! - `id` is assigned by the store on the first successful save only.
//! - A child's `parent_id` mirrors the key of the person that owns it.
//! - Equality and hashing use `(first_name, last_name, id)` only.

use crate::model::address::Address;
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Store-assigned person key.
pub type PersonId = i64;

/// Mutable person record with owned addresses and children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    id: Option<PersonId>,
    pub first_name: String,
    pub last_name: String,
    /// Instant of birth with its original offset.
    pub dob: DateTime<FixedOffset>,
    pub salary: Decimal,
    pub email: Option<String>,
    pub home_address: Option<Address>,
    pub business_address: Option<Address>,
    /// Reference to another person's key; the spouse itself is never embedded.
    pub spouse_id: Option<PersonId>,
    children: Vec<Person>,
    parent_id: Option<PersonId>,
}

impl Person {
    /// Creates an unsaved person with zero salary and no associations.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        dob: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            dob,
            salary: Decimal::ZERO,
            email: None,
            home_address: None,
            business_address: None,
            spouse_id: None,
            children: Vec::new(),
            parent_id: None,
        }
    }

    pub fn id(&self) -> Option<PersonId> {
        self.id
    }

    /// Key of the owning parent, if this person was associated as a child.
    pub fn parent_id(&self) -> Option<PersonId> {
        self.parent_id
    }

    pub fn children(&self) -> &[Person] {
        &self.children
    }

    /// Associates `child` with this person.
    ///
    /// The child's parent back-reference is set to this person's key (still
    /// `None` for an unsaved parent; the cascading save fills it in). Returns
    /// `false` when an equal child is already present.
    pub fn add_child(&mut self, mut child: Person) -> bool {
        child.parent_id = self.id;
        if self.children.contains(&child) {
            return false;
        }
        self.children.push(child);
        true
    }

    pub(crate) fn assign_id(&mut self, id: PersonId) {
        self.id = Some(id);
    }

    pub(crate) fn set_parent_id(&mut self, parent_id: Option<PersonId>) {
        self.parent_id = parent_id;
    }

    pub(crate) fn children_mut(&mut self) -> &mut [Person] {
        &mut self.children
    }
}

impl PartialEq for Person {
    fn eq(&self, other: &Self) -> bool {
        self.first_name == other.first_name
            && self.last_name == other.last_name
            && self.id == other.id
    }
}

impl Eq for Person {}

impl Hash for Person {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.first_name.hash(state);
        self.last_name.hash(state);
        self.id.hash(state);
    }
}
