//! Materialized, positioned result cursor.
//!
//! # Responsibility
//! - Buffer a statement's rows so extractors can read the current row by
//!   column name and advance explicitly.
//!
//! # Invariants
//! - A fresh cursor is positioned at its first row.
//! - Column lookup is ASCII case-insensitive.

use crate::repo::error::{RepoError, RepoResult};
use rusqlite::types::{FromSql, Value, ValueRef};
use rusqlite::{Params, Statement};

#[derive(Debug, Clone, Default)]
pub struct ResultCursor {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    position: usize,
}

impl ResultCursor {
    /// Builds a cursor over already fetched rows.
    ///
    /// Every row must have one value per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            position: 0,
        }
    }

    /// Executes `stmt` with `params` and buffers every produced row.
    pub fn from_statement<P: Params>(stmt: &mut Statement<'_>, params: P) -> RepoResult<Self> {
        let columns = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let width = columns.len();

        let mut rows = stmt.query(params)?;
        let mut buffered = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for index in 0..width {
                values.push(row.get::<_, Value>(index)?);
            }
            buffered.push(values);
        }

        Ok(Self::new(columns, buffered))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the cursor has moved past its last row.
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.rows.len()
    }

    /// Moves to the next row; returns `false` once no row remains.
    pub fn advance(&mut self) -> bool {
        if self.position < self.rows.len() {
            self.position += 1;
        }
        !self.is_exhausted()
    }

    /// Reads `column` from the current row.
    ///
    /// # Errors
    /// - `InvalidData` when the cursor is exhausted, the column does not
    ///   exist, or the stored value does not convert to `T`.
    pub fn get<T: FromSql>(&self, column: &str) -> RepoResult<T> {
        let value = self.value(column)?;
        T::column_result(ValueRef::from(value)).map_err(|err| {
            RepoError::InvalidData(format!(
                "column `{column}` at row {} cannot be read: {err}",
                self.position
            ))
        })
    }

    /// Raw value of `column` in the current row.
    pub fn value(&self, column: &str) -> RepoResult<&Value> {
        let row = self.rows.get(self.position).ok_or_else(|| {
            RepoError::InvalidData(format!("cursor exhausted while reading `{column}`"))
        })?;
        let index = self
            .columns
            .iter()
            .position(|name| name.eq_ignore_ascii_case(column))
            .ok_or_else(|| RepoError::InvalidData(format!("result has no column `{column}`")))?;
        row.get(index).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "row {} is missing a value for `{column}`",
                self.position
            ))
        })
    }
}
