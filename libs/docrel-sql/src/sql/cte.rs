// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{ExpressionBuilder, SQLBuilder, sql_operation::SQLOperation};

/// A statement with common table expressions of the form `WITH <expressions> <operation>`.
#[derive(Debug)]
pub struct WithQuery<'a> {
    /// The "WITH" expressions
    pub expressions: Vec<CteExpression<'a>>,
    /// The final statement
    pub operation: SQLOperation<'a>,
}

/// A common table expression of the form `<name> (<columns>) AS (<operation>)`.
#[derive(Debug)]
pub struct CteExpression<'a> {
    /// The name of the expression
    pub name: String,
    /// Column names for the expression's output. Omitted from the SQL if empty.
    pub columns: Vec<&'a str>,
    /// The SQL operation to be bound to the name
    pub operation: SQLOperation<'a>,
}

impl ExpressionBuilder for WithQuery<'_> {
    /// Build a CTE for the `WITH <expressions> <operation>` syntax. The `WITH` part is skipped
    /// if there are no expressions.
    fn build(&self, builder: &mut SQLBuilder) {
        if !self.expressions.is_empty() {
            builder.push_str("WITH ");
            builder.push_elems(&self.expressions, ", ");
            builder.push_space();
        }
        self.operation.build(builder);
    }
}

impl ExpressionBuilder for CteExpression<'_> {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_identifier(&self.name);
        if !self.columns.is_empty() {
            builder.push_str(" (");
            builder.push_identifiers(&self.columns);
            builder.push(')');
        }
        builder.push_str(" AS (");
        self.operation.build(builder);
        builder.push(')');
    }
}

#[cfg(test)]
mod tests {
    use crate::sql::{
        Binding, SqlValue,
        insert::{ColumnReference, Insert, Select},
        values::{TypedValue, Values},
    };

    use super::*;

    fn values(value: &SqlValue) -> SQLOperation<'_> {
        SQLOperation::Values(Values {
            rows: vec![vec![TypedValue {
                value,
                sql_type: "INT",
            }]],
        })
    }

    #[test]
    fn with_query() {
        let value = SqlValue::Int(1);
        let query = WithQuery {
            expressions: vec![CteExpression {
                name: "t_0_data".into(),
                columns: vec!["n"],
                operation: values(&value),
            }],
            operation: SQLOperation::Insert(Insert {
                table: "t",
                columns: vec!["n"],
                source: Select {
                    projection: vec![ColumnReference {
                        relation: "t_0_data".into(),
                        column: "n",
                    }],
                    from: vec!["t_0_data".into()],
                },
                returning: vec![],
            }),
        };

        assert_binding!(
            query.to_sql(Binding::Inline),
            r#"WITH "t_0_data" ("n") AS (VALUES (CAST(1 AS INT))) INSERT INTO "t" ("n") SELECT "t_0_data"."n" FROM "t_0_data""#
        );
    }

    #[test]
    fn without_expressions() {
        let value = SqlValue::Int(1);
        let query = WithQuery {
            expressions: vec![],
            operation: values(&value),
        };

        assert_binding!(
            query.to_sql(Binding::Parameterized),
            "VALUES (CAST($1::text AS INT))",
            "1"
        );
    }
}
