//! Per-entity SQL template catalog.
//!
//! # Responsibility
//! - Map each logical CRUD operation to the SQL text an entity store uses.
//! - Let a store override individual templates on top of its defaults.
//!
//! # Invariants
//! - An override always wins over the default supplier.
//! - Templates are resolved and shape-checked once, when a repository is built.
//! - Find-by-id templates bind exactly one positional parameter (the key).
//! - Delete-many templates carry exactly one named placeholder, `:ids`.
//! - Link-parent templates bind exactly two positional parameters, parent
//!   key first.

use crate::repo::error::{RepoError, RepoResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Named placeholder replaced by the key list in delete-many templates.
pub const IDS_PLACEHOLDER: &str = ":ids";

static POSITIONAL_PARAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\?\d*").expect("valid positional parameter regex"));
static NAMED_PARAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":[A-Za-z_][A-Za-z0-9_]*").expect("valid named parameter regex"));

/// Logical operation kinds dispatched by the generic engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CrudOperation {
    FindById,
    Save,
    Update,
    DeleteOne,
    DeleteMany,
    Count,
    /// Points an existing row at a parent row.
    LinkParent,
}

impl CrudOperation {
    pub const ALL: [CrudOperation; 7] = [
        Self::FindById,
        Self::Save,
        Self::Update,
        Self::DeleteOne,
        Self::DeleteMany,
        Self::Count,
        Self::LinkParent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FindById => "find_by_id",
            Self::Save => "save",
            Self::Update => "update",
            Self::DeleteOne => "delete_one",
            Self::DeleteMany => "delete_many",
            Self::Count => "count",
            Self::LinkParent => "link_parent",
        }
    }
}

impl Display for CrudOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statically declared template overrides for one entity type.
#[derive(Debug, Clone)]
pub struct OperationCatalog {
    entity: &'static str,
    overrides: BTreeMap<CrudOperation, &'static str>,
}

impl OperationCatalog {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            overrides: BTreeMap::new(),
        }
    }

    /// Registers `sql` as the template for `operation`, replacing any earlier one.
    pub fn with_override(mut self, operation: CrudOperation, sql: &'static str) -> Self {
        self.overrides.insert(operation, sql);
        self
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// Returns the override for `operation`, or whatever `fallback` supplies.
    pub fn resolve<F>(&self, operation: CrudOperation, fallback: F) -> RepoResult<&'static str>
    where
        F: FnOnce() -> RepoResult<&'static str>,
    {
        match self.overrides.get(&operation) {
            Some(sql) => Ok(*sql),
            None => fallback(),
        }
    }

    /// Resolves every operation up front.
    ///
    /// Operations whose supplier reports `UnsupportedOperation` are left out
    /// of the result unless listed in `required`, in which case the error is
    /// returned. Every resolved template is shape-checked.
    ///
    /// # Errors
    /// - `UnsupportedOperation` for a required operation without a template.
    /// - `InvalidTemplate` when a template violates its placeholder rules.
    pub fn resolve_all<F>(
        &self,
        fallback: F,
        required: &[CrudOperation],
    ) -> RepoResult<ResolvedTemplates>
    where
        F: Fn(CrudOperation) -> RepoResult<&'static str>,
    {
        let mut templates = BTreeMap::new();
        for operation in CrudOperation::ALL {
            match self.resolve(operation, || fallback(operation)) {
                Ok(sql) => {
                    validate_template(self.entity, operation, sql)?;
                    templates.insert(operation, sql);
                }
                Err(RepoError::UnsupportedOperation { .. }) if !required.contains(&operation) => {}
                Err(err) => return Err(err),
            }
        }

        Ok(ResolvedTemplates {
            entity: self.entity,
            templates,
        })
    }
}

/// Templates fixed at repository construction time.
#[derive(Debug, Clone)]
pub struct ResolvedTemplates {
    entity: &'static str,
    templates: BTreeMap<CrudOperation, &'static str>,
}

impl ResolvedTemplates {
    pub fn get(&self, operation: CrudOperation) -> RepoResult<&'static str> {
        self.templates
            .get(&operation)
            .copied()
            .ok_or(RepoError::UnsupportedOperation {
                entity: self.entity,
                operation,
            })
    }

    pub fn supports(&self, operation: CrudOperation) -> bool {
        self.templates.contains_key(&operation)
    }
}

/// Builds the literal delete-many statement by replacing `:ids` with the
/// comma-joined keys.
///
/// The keys are spliced into the SQL text rather than bound as parameters.
/// Keys are integers, so nothing but digits, `-` and `,` reaches the
/// statement. This is the only place the substitution happens; swap it for
/// array binding when the store supports one.
pub fn substitute_id_list(template: &str, ids: &[i64]) -> String {
    let joined = ids
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    template.replace(IDS_PLACEHOLDER, &joined)
}

fn validate_template(
    entity: &'static str,
    operation: CrudOperation,
    sql: &str,
) -> RepoResult<()> {
    let invalid = |reason: String| RepoError::InvalidTemplate {
        entity,
        operation,
        reason,
    };

    if sql.trim().is_empty() {
        return Err(invalid("template is empty".to_string()));
    }

    match operation {
        CrudOperation::FindById | CrudOperation::LinkParent => {
            let expected = if operation == CrudOperation::FindById { 1 } else { 2 };
            let positional = POSITIONAL_PARAM_RE.find_iter(sql).count();
            if positional != expected {
                return Err(invalid(format!(
                    "expected {expected} positional parameter(s), found {positional}"
                )));
            }
        }
        CrudOperation::DeleteMany => {
            let named = NAMED_PARAM_RE
                .find_iter(sql)
                .map(|found| found.as_str())
                .collect::<Vec<_>>();
            if named != [IDS_PLACEHOLDER] {
                return Err(invalid(format!(
                    "expected exactly one `{IDS_PLACEHOLDER}` placeholder, found {named:?}"
                )));
            }
        }
        CrudOperation::Save
        | CrudOperation::Update
        | CrudOperation::DeleteOne
        | CrudOperation::Count => {}
    }

    Ok(())
}
