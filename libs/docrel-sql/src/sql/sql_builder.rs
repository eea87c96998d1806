// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{Binding, ExpressionBuilder, SqlStatement, SqlValue};

pub struct SQLBuilder {
    /// The SQL being built with placeholders for each parameter
    sql: String,
    /// The text form of each parameter, in placeholder order
    params: Vec<String>,
    /// How data values are rendered (inline literals or `$n` parameters)
    binding: Binding,
}

impl SQLBuilder {
    pub fn new(binding: Binding) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            binding,
        }
    }

    /// Push a string
    pub fn push_str<T: AsRef<str>>(&mut self, s: T) {
        self.sql.push_str(s.as_ref());
    }

    /// Push a character
    pub fn push(&mut self, c: char) {
        self.sql.push(c);
    }

    /// Push a string surrounded by double quotes. Useful for identifier such as table names, column
    /// names, etc. Without the quotes, the identifier with uppercase letters will be interpreted
    /// the same as the identifier with lowercase letters. Embedded double quotes are doubled.
    pub fn push_identifier<T: AsRef<str>>(&mut self, s: T) {
        self.sql.push('"');
        for c in s.as_ref().chars() {
            if c == '"' {
                self.sql.push('"');
            }
            self.sql.push(c);
        }
        self.sql.push('"');
    }

    /// Push a column qualified by its table (or CTE) name: `"table"."column"`.
    pub fn push_column<T: AsRef<str>>(&mut self, table_name: T, column_name: T) {
        self.push_identifier(table_name);
        self.push('.');
        self.push_identifier(column_name);
    }

    /// Push a space. This is a common operation, so it is provided as a separate method.
    pub fn push_space(&mut self) {
        self.sql.push(' ');
    }

    /// Push a data value cast to `sql_type`. Depending on the binding mode, the value is either
    /// rendered inline (see [`SqlValue::to_sql_value`]) or replaced with a `$n` placeholder and
    /// added to the list of parameters. Parameters are always sent as text and cast on the
    /// server, so that the driver doesn't need to know the column types.
    pub fn push_value(&mut self, value: &SqlValue, sql_type: &str) {
        self.push_str("CAST(");
        match (self.binding, value.to_param_text()) {
            (Binding::Parameterized, Some(text)) => {
                self.params.push(text);
                self.push('$');
                self.push_str(self.params.len().to_string());
                self.push_str("::text");
            }
            _ => self.push_str(value.to_sql_value()),
        }
        self.push_str(" AS ");
        self.push_str(sql_type);
        self.push(')');
    }

    /// Push elements of an iterator, separated by `sep`. The `push_elem` function provides
    /// the flexibility to map the elements (compared to [`SQLBuilder::push_elems`], which assumes that
    /// the elements implement [`ExpressionBuilder`] and [`build`](ExpressionBuilder::build) is all you need to call).
    pub fn push_iter<T>(
        &mut self,
        iter: impl ExactSizeIterator<Item = T>,
        sep: &str,
        push_elem: impl Fn(&mut Self, T),
    ) {
        let len = iter.len();
        for (i, item) in iter.enumerate() {
            push_elem(self, item);

            if i < len - 1 {
                self.sql.push_str(sep);
            }
        }
    }

    /// Push elements of a slice, separated by `sep`. The elements must themselves implement
    /// `ExpressionBuilder`.
    pub fn push_elems<T: ExpressionBuilder>(&mut self, elems: &[T], sep: &str) {
        self.push_iter(elems.iter(), sep, |builder, elem| {
            elem.build(builder);
        });
    }

    /// Push identifiers separated by `, `
    pub fn push_identifiers<T: AsRef<str>>(&mut self, identifiers: &[T]) {
        self.push_iter(identifiers.iter(), ", ", |builder, identifier| {
            builder.push_identifier(identifier)
        });
    }

    /// Get the SQL string and the list of parameters. Calling this method should be the final step
    /// in building an SQL expression, and thus this builder consumes the `self`.
    pub fn into_sql(self) -> SqlStatement {
        SqlStatement {
            sql: self.sql,
            params: self.params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_quoted() {
        let mut builder = SQLBuilder::new(Binding::Inline);
        builder.push_identifier("Users");
        builder.push_space();
        builder.push_identifier(r#"odd"name"#);

        assert_eq!(builder.into_sql().sql, r#""Users" "odd""name""#);
    }

    #[test]
    fn inline_values_are_cast() {
        let mut builder = SQLBuilder::new(Binding::Inline);
        builder.push_value(&SqlValue::Text("it's".into()), "TEXT");
        builder.push_str(", ");
        builder.push_value(&SqlValue::Null, "INT");

        let statement = builder.into_sql();
        assert_eq!(statement.sql, "CAST('it''s' AS TEXT), CAST(NULL AS INT)");
        assert!(statement.params.is_empty());
    }

    #[test]
    fn parameterized_values_keep_nulls_inline() {
        let mut builder = SQLBuilder::new(Binding::Parameterized);
        builder.push_value(&SqlValue::Int(7), "INT");
        builder.push_str(", ");
        builder.push_value(&SqlValue::Null, "TEXT");
        builder.push_str(", ");
        builder.push_value(&SqlValue::Bool(true), "BOOLEAN");

        let statement = builder.into_sql();
        assert_eq!(
            statement.sql,
            "CAST($1::text AS INT), CAST(NULL AS TEXT), CAST($2::text AS BOOLEAN)"
        );
        assert_eq!(statement.params, vec!["7", "true"]);
    }
}
