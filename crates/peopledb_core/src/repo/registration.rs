//! Per-entity persistence registration.

use crate::repo::catalog::{CrudOperation, OperationCatalog};
use crate::repo::identity::IdentityAccessor;

/// Everything the generic engine needs to know about one entity type.
///
/// Built by the entity's mapper and resolved once when the repository is
/// constructed.
pub struct EntityRegistration<E> {
    /// Table the store reads and writes; checked for existence up front.
    pub table: &'static str,
    /// Key field accessor. `None` makes repository construction fail.
    pub identity: Option<IdentityAccessor<E>>,
    /// Template overrides layered on the mapper's defaults.
    pub catalog: OperationCatalog,
    /// Operations that must resolve to a template for the store to be usable.
    pub required: &'static [CrudOperation],
}
