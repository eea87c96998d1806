// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::mapping::{CREATION_TIMESTAMP_COLUMN, Collection, FieldSpec, Mapping};

use super::{
    column_spec::{ColumnSpec, is_serial},
    constraint::ForeignKeySpec,
    index_spec::IndexSpec,
    statement::SchemaStatement,
    table_spec::TableSpec,
};

const GENERATED_KEY_TYPE: &str = "SERIAL";
const CREATION_TIMESTAMP_TYPE: &str = "TIMESTAMP";
const DEFAULT_VALUE_TYPE: &str = "TEXT";

/// The relational schema derived from a mapping. Also serves as the catalog of column types when
/// building insert statements.
#[derive(Debug, Clone)]
pub struct DatabaseSpec {
    tables: Vec<TableSpec>,
    foreign_keys: Vec<ForeignKeySpec>,
    /// Child columns that need an index once all tables exist
    foreign_key_indices: Vec<(String, IndexSpec)>,
}

impl DatabaseSpec {
    pub fn from_mapping(mapping: &Mapping) -> Self {
        let mut spec = DatabaseSpec {
            tables: mapping
                .collections()
                .map(|(_, collection)| Self::base_table(collection))
                .collect(),
            foreign_keys: vec![],
            foreign_key_indices: vec![],
        };

        // Array targets may be declared before their parents, so links are added once every
        // table exists
        for (_, collection) in mapping.collections() {
            for (_, field) in collection.array_fields() {
                spec.link(collection, field);
            }
        }

        spec
    }

    fn base_table(collection: &Collection) -> TableSpec {
        let mut columns = vec![ColumnSpec::new(
            CREATION_TIMESTAMP_COLUMN,
            CREATION_TIMESTAMP_TYPE,
        )];
        let mut indices = vec![IndexSpec::creation_timestamp(&collection.name)];

        for (_, field) in collection.fields.iter() {
            if let FieldSpec::Scalar {
                dest_column,
                sql_type,
                indexed,
            } = field
            {
                let is_pk = *dest_column == collection.primary_key;
                columns.push(ColumnSpec {
                    name: dest_column.clone(),
                    sql_type: sql_type.clone(),
                    is_pk,
                    is_generated: is_pk && is_serial(sql_type),
                });

                if *indexed {
                    indices.push(IndexSpec::on_column(&collection.name, dest_column));
                }
            }
        }

        if collection.primary_key_field().is_none() {
            columns.push(ColumnSpec {
                name: collection.primary_key.clone(),
                sql_type: GENERATED_KEY_TYPE.to_string(),
                is_pk: true,
                is_generated: true,
            });
        }

        indices.extend(
            collection
                .extra_indices
                .iter()
                .map(|fragment| IndexSpec::Fragment(fragment.clone())),
        );

        columns.sort_by(|a, b| a.name.cmp(&b.name));

        TableSpec {
            name: collection.name.clone(),
            columns,
            primary_key: collection.primary_key.clone(),
            indices,
        }
    }

    /// Add the foreign key for an array field, along with any columns the target table is missing
    fn link(&mut self, parent: &Collection, field: &FieldSpec) {
        let (dest_table, foreign_key_column, value_column, indexed) = match field {
            FieldSpec::ArrayOfDocuments {
                dest_table,
                foreign_key_column,
                indexed,
            } => (dest_table, foreign_key_column, None, *indexed),
            FieldSpec::ArrayOfScalars {
                dest_table,
                foreign_key_column,
                value_column,
            } => (dest_table, foreign_key_column, Some(value_column), false),
            FieldSpec::Scalar { .. } => return,
        };

        let foreign_key_type = self
            .table(&parent.name)
            .and_then(TableSpec::primary_key_column)
            .map(|column| column.cast_type().to_string())
            .unwrap_or_else(|| DEFAULT_VALUE_TYPE.to_string());

        let Some(child) = self.tables.iter_mut().find(|table| table.name == *dest_table) else {
            return;
        };

        if child.column(foreign_key_column).is_none() {
            child.add_column(ColumnSpec::new(foreign_key_column, foreign_key_type));
        }
        if let Some(value_column) = value_column {
            if child.column(value_column).is_none() {
                child.add_column(ColumnSpec::new(value_column, DEFAULT_VALUE_TYPE));
            }
        }

        let needs_index = indexed
            && !child.has_index_on(foreign_key_column)
            && !self
                .foreign_key_indices
                .iter()
                .any(|(table, index)| table == dest_table && index.column() == Some(foreign_key_column));
        if needs_index {
            self.foreign_key_indices.push((
                dest_table.clone(),
                IndexSpec::on_column(dest_table, foreign_key_column),
            ));
        }

        self.foreign_keys.push(ForeignKeySpec {
            table: dest_table.clone(),
            column: foreign_key_column.clone(),
            foreign_table: parent.name.clone(),
            foreign_column: parent.primary_key.clone(),
        });
    }

    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn foreign_keys(&self) -> &[ForeignKeySpec] {
        &self.foreign_keys
    }

    /// The type to cast values of `table.column` to
    pub fn column_type(&self, table: &str, column: &str) -> Option<&str> {
        self.table(table)?.column(column).map(ColumnSpec::cast_type)
    }

    /// One statement per table (in mapping order), followed by a statement holding the foreign
    /// keys and the indices over foreign key columns.
    pub fn creation_statements(&self) -> Vec<SchemaStatement> {
        let mut statements: Vec<_> = self.tables.iter().map(TableSpec::creation_sql).collect();

        let deferred: Vec<_> = self
            .foreign_keys
            .iter()
            .map(ForeignKeySpec::creation_sql)
            .chain(
                self.foreign_key_indices
                    .iter()
                    .map(|(table, index)| index.creation_sql(table)),
            )
            .collect();

        if !deferred.is_empty() {
            statements.push(SchemaStatement {
                statement: String::new(),
                pre_statements: vec![],
                post_statements: deferred,
            });
        }

        statements
    }

    /// All DDL statements in execution order
    pub fn creation_sql(&self) -> Vec<String> {
        let statements = self.creation_statements();
        statements
            .iter()
            .flat_map(|statement| statement.flatten())
            .map(str::to_string)
            .collect()
    }
}
