// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{
    column_spec::ColumnSpec, index_spec::IndexSpec, quote, statement::SchemaStatement,
};

#[derive(Debug, Clone)]
pub struct TableSpec {
    pub name: String,
    /// Sorted by name
    pub columns: Vec<ColumnSpec>,
    pub primary_key: String,
    pub indices: Vec<IndexSpec>,
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn primary_key_column(&self) -> Option<&ColumnSpec> {
        self.column(&self.primary_key)
    }

    pub fn has_index_on(&self, column: &str) -> bool {
        self.indices
            .iter()
            .any(|index| index.column() == Some(column))
    }

    pub(super) fn add_column(&mut self, column: ColumnSpec) {
        let position = self
            .columns
            .binary_search_by(|existing| existing.name.cmp(&column.name))
            .unwrap_or_else(|position| position);
        self.columns.insert(position, column);
    }

    /// Converts the table specification to SQL statements: drop any existing table, create the
    /// table, then create its indices.
    pub(super) fn creation_sql(&self) -> SchemaStatement {
        let column_stmts = self
            .columns
            .iter()
            .map(ColumnSpec::creation_sql)
            .collect::<Vec<_>>()
            .join(",\n\t");

        SchemaStatement {
            statement: format!("CREATE TABLE {} (\n\t{}\n)", quote(&self.name), column_stmts),
            pre_statements: vec![format!("DROP TABLE IF EXISTS {} CASCADE", quote(&self.name))],
            post_statements: self
                .indices
                .iter()
                .map(|index| index.creation_sql(&self.name))
                .collect(),
        }
    }
}
