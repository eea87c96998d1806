// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Lower level primitives to build SQL statements.

use std::fmt::Display;

use tokio_postgres::types::ToSql;

#[cfg(test)]
#[macro_use]
pub(crate) mod test_util;

pub(crate) mod cte;
pub(crate) mod delete;
pub(crate) mod insert;
pub(crate) mod sql_builder;
pub(crate) mod sql_operation;
pub(crate) mod sql_value;
pub(crate) mod truncate;
pub(crate) mod values;

pub use sql_builder::SQLBuilder;
pub use sql_value::SqlValue;

/// How data values are rendered into a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Values are encoded as SQL literals. Useful for display and tests.
    Inline,
    /// Values are sent as `$n` parameters. Used for execution.
    Parameterized,
}

/// A trait for types that can build themselves into an SQL expression.
///
/// Each constituent of an SQL expression (table, values list, insert, etc.) should implement
/// this trait, which can then be used to hierarchically build an SQL string and the list of
/// parameters to be supplied to it.
pub trait ExpressionBuilder {
    /// Build the SQL expression into the given SQL builder
    fn build(&self, builder: &mut SQLBuilder);

    /// Build the SQL expression into a statement. This is useful for testing/debugging, where we
    /// want to assert on the generated SQL without creating an SQLBuilder ourselves.
    fn to_sql(&self, binding: Binding) -> SqlStatement
    where
        Self: Sized,
    {
        let mut builder = SQLBuilder::new(binding);
        self.build(&mut builder);
        builder.into_sql()
    }
}

/// A complete statement ready to be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    pub sql: String,
    /// Text parameters for the `$n` placeholders in `sql`
    pub params: Vec<String>,
}

impl SqlStatement {
    /// A statement without parameters (DDL, for example)
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: vec![],
        }
    }

    pub fn pg_params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|param| param as &(dyn ToSql + Sync))
            .collect()
    }
}

impl Display for SqlStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql)
    }
}
