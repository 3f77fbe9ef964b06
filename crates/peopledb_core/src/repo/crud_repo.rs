//! Generic CRUD engine parameterized over an entity mapper.
//!
//! # Responsibility
//! - Dispatch save/find/update/delete/count through resolved SQL templates.
//! - Assign store-generated keys through the entity's identity accessor.
//! - Leave row (de)serialization and cascades to the pluggable mapper.
//!
//! # Invariants
//! - Identity, table and required templates are validated at construction.
//! - A failed insert never writes a key into the entity.
//! - An entity that already has a key is never inserted again.
//! - Zero-row updates and deletes are not reported as errors.

use crate::repo::catalog::{substitute_id_list, CrudOperation, ResolvedTemplates};
use crate::repo::cursor::ResultCursor;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::identity::IdentityAccessor;
use crate::repo::registration::EntityRegistration;
use log::{debug, error};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::time::Instant;

/// Entity-specific half of a store: row extraction, parameter binding and
/// post-save hook.
pub trait EntityMapper: Sized {
    type Entity;

    /// Entity type name used in errors and log events.
    const ENTITY_NAME: &'static str;

    fn registration(&self) -> EntityRegistration<Self::Entity>;

    /// Template supplier consulted when no override is registered.
    fn default_sql(&self, operation: CrudOperation) -> RepoResult<&'static str> {
        Err(RepoError::UnsupportedOperation {
            entity: Self::ENTITY_NAME,
            operation,
        })
    }

    /// Builds one entity from a cursor positioned at the first matching row.
    fn extract_entity(&self, cursor: &mut ResultCursor) -> RepoResult<Self::Entity>;

    /// Values bound, in order, to the insert template.
    fn map_for_save(&self, entity: &mut Self::Entity) -> RepoResult<Vec<Value>>;

    /// Values bound to the update template; the key is appended after them.
    fn map_for_update(&self, _entity: &Self::Entity) -> RepoResult<Vec<Value>> {
        Err(RepoError::UnsupportedOperation {
            entity: Self::ENTITY_NAME,
            operation: CrudOperation::Update,
        })
    }

    /// Runs after the entity's own row is inserted and keyed.
    fn post_save(
        &self,
        _repo: &CrudRepository<'_, Self>,
        _entity: &mut Self::Entity,
        _id: i64,
    ) -> RepoResult<()> {
        Ok(())
    }

    /// Short, non-sensitive description used in `SaveFailure`.
    fn describe(&self, entity: &Self::Entity) -> String;
}

/// Reusable CRUD skeleton bound to one connection and one mapper.
pub struct CrudRepository<'conn, M: EntityMapper> {
    conn: &'conn Connection,
    mapper: M,
    identity: IdentityAccessor<M::Entity>,
    templates: ResolvedTemplates,
}

impl<'conn, M: EntityMapper> CrudRepository<'conn, M> {
    /// Validates the mapper's registration against `conn` and builds the store.
    ///
    /// # Errors
    /// - `MissingIdentity` when no identity accessor is registered.
    /// - `MissingRequiredTable` when the entity table does not exist.
    /// - `UnsupportedOperation` / `InvalidTemplate` from template resolution.
    pub fn try_new(conn: &'conn Connection, mapper: M) -> RepoResult<Self> {
        let registration = mapper.registration();
        let identity = registration.identity.ok_or(RepoError::MissingIdentity {
            entity: M::ENTITY_NAME,
            field: None,
        })?;

        if !table_exists(conn, registration.table)? {
            return Err(RepoError::MissingRequiredTable(registration.table));
        }

        let templates = registration
            .catalog
            .resolve_all(|operation| mapper.default_sql(operation), registration.required)?;

        Ok(Self {
            conn,
            mapper,
            identity,
            templates,
        })
    }

    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    pub fn identity(&self) -> &IdentityAccessor<M::Entity> {
        &self.identity
    }

    pub fn supports(&self, operation: CrudOperation) -> bool {
        self.templates.supports(operation)
    }

    /// Inserts `entity`, assigns the generated key and runs the post-save hook.
    ///
    /// Returns the assigned key.
    ///
    /// # Errors
    /// - `AlreadyPersisted` when the entity already has a key.
    /// - `SaveFailure` when the insert or key retrieval fails.
    /// - Whatever the mapper's binding or post-save hook reports.
    pub fn save(&self, entity: &mut M::Entity) -> RepoResult<i64> {
        if let Some(id) = self.identity.key_of(entity) {
            return Err(RepoError::AlreadyPersisted {
                entity: M::ENTITY_NAME,
                id,
            });
        }

        let sql = self.templates.get(CrudOperation::Save)?;
        let values = self.mapper.map_for_save(entity)?;
        let started_at = Instant::now();

        let id = match self.insert(sql, values) {
            Ok(id) => id,
            Err(err) => {
                error!(
                    "event=entity_save module=repo status=error entity={} duration_ms={} error={err}",
                    M::ENTITY_NAME,
                    started_at.elapsed().as_millis()
                );
                return Err(RepoError::SaveFailure {
                    entity: self.mapper.describe(entity),
                    source: err.into(),
                });
            }
        };

        self.identity.set(entity, id);
        debug!(
            "event=entity_save module=repo status=ok entity={} id={id} duration_ms={}",
            M::ENTITY_NAME,
            started_at.elapsed().as_millis()
        );

        self.mapper.post_save(self, entity, id)?;
        Ok(id)
    }

    /// Loads one entity by key; `None` when no row matches.
    pub fn find_by_id(&self, id: i64) -> RepoResult<Option<M::Entity>> {
        let sql = self.templates.get(CrudOperation::FindById)?;
        let mut stmt = self.conn.prepare(sql)?;
        let mut cursor = ResultCursor::from_statement(&mut stmt, [id])?;

        debug!(
            "event=entity_find module=repo status=ok entity={} id={id} rows={}",
            M::ENTITY_NAME,
            cursor.row_count()
        );

        if cursor.is_empty() {
            return Ok(None);
        }

        self.mapper.extract_entity(&mut cursor).map(Some)
    }

    /// Writes the mapper's update values for the entity's key.
    pub fn update(&self, entity: &M::Entity) -> RepoResult<()> {
        let sql = self.templates.get(CrudOperation::Update)?;
        let id = self.identity.get(entity)?;
        let mut values = self.mapper.map_for_update(entity)?;
        values.push(Value::Integer(id));

        let changed = self.conn.execute(sql, params_from_iter(values))?;
        debug!(
            "event=entity_update module=repo status=ok entity={} id={id} changed={changed}",
            M::ENTITY_NAME
        );
        Ok(())
    }

    pub fn delete(&self, entity: &M::Entity) -> RepoResult<()> {
        let sql = self.templates.get(CrudOperation::DeleteOne)?;
        let id = self.identity.get(entity)?;

        let changed = self.conn.execute(sql, [id])?;
        debug!(
            "event=entity_delete module=repo status=ok entity={} id={id} changed={changed}",
            M::ENTITY_NAME
        );
        Ok(())
    }

    /// Deletes every entity in one literal statement built by
    /// [`substitute_id_list`]. An empty slice does nothing.
    pub fn delete_many(&self, entities: &[&M::Entity]) -> RepoResult<()> {
        let template = self.templates.get(CrudOperation::DeleteMany)?;
        let ids = entities
            .iter()
            .map(|entity| self.identity.get(entity))
            .collect::<RepoResult<Vec<_>>>()?;

        if ids.is_empty() {
            debug!(
                "event=entity_delete_many module=repo status=skipped entity={} reason=empty",
                M::ENTITY_NAME
            );
            return Ok(());
        }

        let sql = substitute_id_list(template, &ids);
        let changed = self.conn.execute(&sql, [])?;
        debug!(
            "event=entity_delete_many module=repo status=ok entity={} requested={} changed={changed}",
            M::ENTITY_NAME,
            ids.len()
        );
        Ok(())
    }

    /// Points the already stored `entity` at the row keyed `parent_id`.
    ///
    /// # Errors
    /// - `MissingIdentity` when `entity` has no key.
    /// - `UnsupportedOperation` without a link-parent template.
    pub fn link_parent(&self, entity: &M::Entity, parent_id: i64) -> RepoResult<()> {
        let sql = self.templates.get(CrudOperation::LinkParent)?;
        let id = self.identity.get(entity)?;

        let changed = self.conn.execute(sql, [parent_id, id])?;
        debug!(
            "event=entity_link_parent module=repo status=ok entity={} id={id} parent_id={parent_id} changed={changed}",
            M::ENTITY_NAME
        );
        Ok(())
    }

    /// First column of the count template's first row, or zero.
    pub fn count(&self) -> RepoResult<i64> {
        let sql = self.templates.get(CrudOperation::Count)?;
        let count = self
            .conn
            .query_row(sql, [], |row| row.get::<_, i64>(0))
            .optional()?
            .unwrap_or(0);

        debug!(
            "event=entity_count module=repo status=ok entity={} count={count}",
            M::ENTITY_NAME
        );
        Ok(count)
    }

    fn insert(&self, sql: &str, values: Vec<Value>) -> rusqlite::Result<i64> {
        let changed = self.conn.execute(sql, params_from_iter(values))?;
        debug!(
            "event=entity_insert module=repo status=ok entity={} changed={changed}",
            M::ENTITY_NAME
        );
        Ok(self.conn.last_insert_rowid())
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1 COLLATE NOCASE
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
