//! Repository error taxonomy.

use crate::db::DbError;
use crate::repo::catalog::CrudOperation;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors raised by the generic engine and the entity stores.
#[derive(Debug)]
pub enum RepoError {
    /// Insert or key retrieval failed; `entity` describes what was being saved.
    SaveFailure { entity: String, source: DbError },
    /// No identity field is registered (`field: None`), or the registered
    /// field holds no key yet.
    MissingIdentity {
        entity: &'static str,
        field: Option<&'static str>,
    },
    /// Neither an override nor a default template exists for the operation.
    UnsupportedOperation {
        entity: &'static str,
        operation: CrudOperation,
    },
    /// A resolved template does not have the placeholder shape its operation needs.
    InvalidTemplate {
        entity: &'static str,
        operation: CrudOperation,
        reason: String,
    },
    /// The entity already carries a store key and cannot be inserted again.
    AlreadyPersisted { entity: &'static str, id: i64 },
    /// Any other store failure during execution or row reading.
    Db(DbError),
    /// Table required by a store is absent from the connection.
    MissingRequiredTable(&'static str),
    /// Persisted value cannot be converted into the model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SaveFailure { entity, source } => {
                write!(f, "failed to save entity {entity}: {source}")
            }
            Self::MissingIdentity {
                entity,
                field: None,
            } => write!(f, "entity type `{entity}` has no registered identity field"),
            Self::MissingIdentity {
                entity,
                field: Some(field),
            } => write!(f, "entity `{entity}` has no value in identity field `{field}`"),
            Self::UnsupportedOperation { entity, operation } => write!(
                f,
                "operation `{operation}` is not supported for entity type `{entity}`"
            ),
            Self::InvalidTemplate {
                entity,
                operation,
                reason,
            } => write!(
                f,
                "invalid `{operation}` template for entity type `{entity}`: {reason}"
            ),
            Self::AlreadyPersisted { entity, id } => {
                write!(f, "entity `{entity}` is already persisted with key {id}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SaveFailure { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::MissingIdentity { .. }
            | Self::UnsupportedOperation { .. }
            | Self::InvalidTemplate { .. }
            | Self::AlreadyPersisted { .. }
            | Self::MissingRequiredTable(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
