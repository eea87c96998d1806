// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{ExpressionBuilder, SQLBuilder};

/// A reference to a column of a table or of a common table expression: `"relation"."column"`.
#[derive(Debug, Clone)]
pub struct ColumnReference<'a> {
    pub relation: String,
    pub column: &'a str,
}

impl ExpressionBuilder for ColumnReference<'_> {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_column(self.relation.as_str(), self.column);
    }
}

/// A projection over one or more relations joined with `CROSS JOIN`. Every relation
/// other than the first one is expected to produce a single row.
#[derive(Debug)]
pub struct Select<'a> {
    pub projection: Vec<ColumnReference<'a>>,
    pub from: Vec<String>,
}

impl ExpressionBuilder for Select<'_> {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_str("SELECT ");
        builder.push_elems(&self.projection, ", ");
        builder.push_str(" FROM ");
        builder.push_iter(self.from.iter(), " CROSS JOIN ", |builder, relation| {
            builder.push_identifier(relation)
        });
    }
}

/// An insert operation fed by a select.
#[derive(Debug)]
pub struct Insert<'a> {
    /// The table to insert into.
    pub table: &'a str,
    /// The columns to insert into such as `(age, name)`
    pub columns: Vec<&'a str>,
    /// The rows to insert
    pub source: Select<'a>,
    /// The columns to return.
    pub returning: Vec<&'a str>,
}

impl ExpressionBuilder for Insert<'_> {
    /// Build the insert statement for the form `INSERT INTO <table> (<columns>) SELECT ...
    /// RETURNING <returning-columns>`. The `RETURNING` clause is omitted if the list of columns to
    /// return is empty.
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_str("INSERT INTO ");
        builder.push_identifier(self.table);
        builder.push_str(" (");
        builder.push_identifiers(&self.columns);
        builder.push_str(") ");
        self.source.build(builder);

        if !self.returning.is_empty() {
            builder.push_str(" RETURNING ");
            builder.push_identifiers(&self.returning);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::sql::Binding;

    use super::*;

    #[test]
    fn insert_from_joined_select() {
        let insert = Insert {
            table: "items",
            columns: vec!["name", "order_id"],
            source: Select {
                projection: vec![
                    ColumnReference {
                        relation: "items_1_data".into(),
                        column: "name",
                    },
                    ColumnReference {
                        relation: "orders_0_rows".into(),
                        column: "id",
                    },
                ],
                from: vec!["items_1_data".into(), "orders_0_rows".into()],
            },
            returning: vec!["id"],
        };

        assert_binding!(
            insert.to_sql(Binding::Inline),
            r#"INSERT INTO "items" ("name", "order_id") SELECT "items_1_data"."name", "orders_0_rows"."id" FROM "items_1_data" CROSS JOIN "orders_0_rows" RETURNING "id""#
        );
    }
}
