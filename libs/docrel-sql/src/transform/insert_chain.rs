// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::{HashMap, hash_map::Entry};

use tracing::warn;

use crate::{
    normalize::{NodeId, RowForest, RowNode, RowValue},
    schema::DatabaseSpec,
    sql::{
        Binding, ExpressionBuilder, SqlStatement, SqlValue,
        cte::{CteExpression, WithQuery},
        insert::{ColumnReference, Insert, Select},
        sql_operation::SQLOperation,
        values::{TypedValue, Values},
    },
};

static NULL: SqlValue = SqlValue::Null;

/// Compiles a [`RowForest`] into a single statement.
///
/// Each row referred to by a placeholder gets two common table expressions: `"<table>_<n>_data"`
/// with its values and `"<table>_<n>_rows"` inserting them and returning the generated key
/// (long table names are cut to their first 40 bytes in these aliases). Other
/// rows are grouped by table and column shape into multi-row inserts, which read the keys of
/// the rows they refer to by cross joining with their `_rows` expression. The last group is the
/// statement's final insert.
///
/// For example, a row of `col1` with three `col_scalar` children:
///
/// ```sql
/// WITH "col1_0_data" ("_id", "creation_timestamp") AS (VALUES (...)),
///      "col1_0_rows" AS (INSERT INTO "col1" (...) SELECT ... FROM "col1_0_data" RETURNING "_id"),
///      "col_scalar_1_data" ("creation_timestamp", "scalar") AS (VALUES (...), (...), (...))
/// INSERT INTO "col_scalar" ("creation_timestamp", "id_col1", "scalar")
/// SELECT "col_scalar_1_data"."creation_timestamp", "col1_0_rows"."_id", "col_scalar_1_data"."scalar"
/// FROM "col_scalar_1_data" CROSS JOIN "col1_0_rows"
/// ```
pub struct InsertChain<'a> {
    database_spec: &'a DatabaseSpec,
    binding: Binding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum StageColumn<'f> {
    /// A value supplied by the rows of the stage
    Data(&'f str),
    /// The key returned by another stage
    Key { column: &'f str, stage: usize },
}

impl<'f> StageColumn<'f> {
    fn name(&self) -> &'f str {
        match *self {
            StageColumn::Data(column) | StageColumn::Key { column, .. } => column,
        }
    }
}

struct Stage<'f> {
    table: &'f str,
    primary_key: &'f str,
    /// In column name order
    columns: Vec<StageColumn<'f>>,
    rows: Vec<&'f RowNode>,
    returns_key: bool,
}

/// Longest table prefix of an alias, so that aliases stay within PostgreSQL's 63 byte
/// identifier limit
const ALIAS_PREFIX_LEN: usize = 40;

impl Stage<'_> {
    /// The stage number keeps aliases distinct even when table names share a long prefix
    fn alias(&self, number: usize, suffix: &str) -> String {
        let mut end = self.table.len().min(ALIAS_PREFIX_LEN);
        while !self.table.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}_{number}_{suffix}", &self.table[..end])
    }
}

impl<'a> InsertChain<'a> {
    pub fn new(database_spec: &'a DatabaseSpec, binding: Binding) -> Self {
        Self {
            database_spec,
            binding,
        }
    }

    /// The statement inserting every row of the forest, or `None` if there is nothing to insert.
    pub fn build(&self, forest: &RowForest) -> Option<SqlStatement> {
        let stages = self.plan(forest);

        // Prefer a stage that returns nothing as the final insert
        let trailing = stages
            .iter()
            .rposition(|stage| !stage.returns_key)
            .or(stages.len().checked_sub(1))?;

        let mut expressions = vec![];
        let mut operation = None;

        for (number, stage) in stages.iter().enumerate() {
            let data_alias = stage.alias(number, "data");

            let data_columns: Vec<&str> = stage
                .columns
                .iter()
                .filter_map(|column| match column {
                    StageColumn::Data(name) => Some(*name),
                    StageColumn::Key { .. } => None,
                })
                .collect();

            let rows = stage
                .rows
                .iter()
                .map(|row| {
                    data_columns
                        .iter()
                        .map(|column| TypedValue {
                            value: match row.columns.get(*column) {
                                Some(RowValue::Literal(value)) => value,
                                _ => &NULL,
                            },
                            sql_type: self
                                .database_spec
                                .column_type(stage.table, column)
                                .unwrap_or("TEXT"),
                        })
                        .collect()
                })
                .collect();

            let mut from = vec![data_alias.clone()];
            let projection = stage
                .columns
                .iter()
                .map(|column| match column {
                    StageColumn::Data(name) => ColumnReference {
                        relation: data_alias.clone(),
                        column: name,
                    },
                    StageColumn::Key {
                        stage: key_stage, ..
                    } => {
                        let referenced = &stages[*key_stage];
                        let relation = referenced.alias(*key_stage, "rows");
                        if !from.contains(&relation) {
                            from.push(relation.clone());
                        }
                        ColumnReference {
                            relation,
                            column: referenced.primary_key,
                        }
                    }
                })
                .collect();

            expressions.push(CteExpression {
                name: data_alias,
                columns: data_columns,
                operation: SQLOperation::Values(Values { rows }),
            });

            let insert = SQLOperation::Insert(Insert {
                table: stage.table,
                columns: stage.columns.iter().map(StageColumn::name).collect(),
                source: Select { projection, from },
                returning: if stage.returns_key {
                    vec![stage.primary_key]
                } else {
                    vec![]
                },
            });

            if number == trailing {
                operation = Some(insert);
            } else {
                expressions.push(CteExpression {
                    name: stage.alias(number, "rows"),
                    columns: vec![],
                    operation: insert,
                });
            }
        }

        let query = WithQuery {
            expressions,
            operation: operation?,
        };

        Some(query.to_sql(self.binding))
    }

    /// Assign rows to stages. A row that is referred to gets its own stage. Other rows share a
    /// stage with the rows of the same table and column shape. Placeholders must refer to
    /// earlier rows.
    fn plan<'f>(&'f self, forest: &'f RowForest) -> Vec<Stage<'f>> {
        let mut stages: Vec<Stage<'f>> = vec![];
        let mut key_stages: HashMap<NodeId, usize> = HashMap::new();
        let mut groups: HashMap<(&str, Vec<StageColumn<'f>>), usize> = HashMap::new();

        for (id, node) in forest.iter() {
            let Some(table) = self.database_spec.table(&node.table) else {
                warn!("Skipping a row of the unknown table '{}'", node.table);
                continue;
            };

            let columns: Vec<_> = node
                .columns
                .iter()
                .filter_map(|(column, value)| match value {
                    RowValue::Literal(_) => Some(StageColumn::Data(column)),
                    RowValue::Placeholder(target) => match key_stages.get(target) {
                        Some(stage) => Some(StageColumn::Key {
                            column,
                            stage: *stage,
                        }),
                        None => {
                            warn!(
                                "Skipping column '{}' of '{}', which refers to a row that is not inserted before it",
                                column, node.table
                            );
                            None
                        }
                    },
                })
                .collect();

            if node.has_dependents {
                key_stages.insert(id, stages.len());
                stages.push(Stage {
                    table: &table.name,
                    primary_key: &table.primary_key,
                    columns,
                    rows: vec![node],
                    returns_key: true,
                });
                continue;
            }

            match groups.entry((table.name.as_str(), columns)) {
                Entry::Occupied(entry) => stages[*entry.get()].rows.push(node),
                Entry::Vacant(entry) => {
                    let columns = entry.key().1.clone();
                    entry.insert(stages.len());
                    stages.push(Stage {
                        table: &table.name,
                        primary_key: &table.primary_key,
                        columns,
                        rows: vec![node],
                        returns_key: false,
                    });
                }
            }
        }

        stages
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::{
        mapping::{Mapping, Namespace},
        normalize::Normalizer,
    };

    use super::*;

    const MAPPING: &str = r#"{
        "db": {
            "col1": {
                "pk": "_id",
                "_id": { "type": "INT" },
                "field1": { "type": "TEXT", "dest": "field1" },
                "scalars": { "type": "ARRAY_OF_SCALARS", "dest": "col_scalar", "fk": "id_col1", "valueField": "scalar" },
                "items": { "type": "ARRAY", "dest": "col_items", "fk": "id_col1" }
            },
            "col_scalar": { "pk": "_id", "scalar": { "type": "INT" } },
            "col_items": {
                "pk": "_id",
                "name": { "type": "TEXT" },
                "tags": { "type": "ARRAY_OF_SCALARS", "dest": "col_tags", "fk": "id_item", "valueField": "tag" }
            },
            "col_tags": { "pk": "_id" }
        }
    }"#;

    fn build(documents: &[Value], binding: Binding) -> Option<SqlStatement> {
        build_with(MAPPING, "col1", documents, binding)
    }

    fn build_with(
        mapping: &str,
        collection: &str,
        documents: &[Value],
        binding: Binding,
    ) -> Option<SqlStatement> {
        let mapping = Mapping::from_json(mapping).unwrap();
        let spec = DatabaseSpec::from_mapping(&mapping);
        let normalizer = Normalizer::new(&mapping, &spec);
        let namespace = Namespace::new("db", collection);

        let mut forest = RowForest::new();
        for document in documents {
            forest.append(normalizer.normalize(&namespace, document).unwrap());
        }

        InsertChain::new(&spec, binding).build(&forest)
    }

    #[test]
    fn empty_forest() {
        assert!(build(&[], Binding::Inline).is_none());
    }

    #[test]
    fn single_row() {
        let statement = build(&[json!({ "_id": 1, "field1": "val" })], Binding::Inline).unwrap();

        assert_binding!(
            statement,
            r#"WITH "col1_0_data" ("_id", "creation_timestamp", "field1") AS (VALUES (CAST(1 AS INT), CAST(NULL AS TIMESTAMP), CAST('val' AS TEXT))) INSERT INTO "col1" ("_id", "creation_timestamp", "field1") SELECT "col1_0_data"."_id", "col1_0_data"."creation_timestamp", "col1_0_data"."field1" FROM "col1_0_data""#
        );
    }

    #[test]
    fn single_row_parameterized() {
        let statement = build(
            &[json!({ "_id": 1, "field1": "it's" })],
            Binding::Parameterized,
        )
        .unwrap();

        assert_binding!(
            statement,
            r#"WITH "col1_0_data" ("_id", "creation_timestamp", "field1") AS (VALUES (CAST($1::text AS INT), CAST(NULL AS TIMESTAMP), CAST($2::text AS TEXT))) INSERT INTO "col1" ("_id", "creation_timestamp", "field1") SELECT "col1_0_data"."_id", "col1_0_data"."creation_timestamp", "col1_0_data"."field1" FROM "col1_0_data""#,
            "1",
            "it's"
        );
    }

    #[test]
    fn array_of_scalars_returns_parent_key() {
        let statement =
            build(&[json!({ "_id": 1, "scalars": [1, 2, 3] })], Binding::Inline).unwrap();

        assert_binding!(
            statement,
            concat!(
                r#"WITH "col1_0_data" ("_id", "creation_timestamp") AS (VALUES (CAST(1 AS INT), CAST(NULL AS TIMESTAMP))), "#,
                r#""col1_0_rows" AS (INSERT INTO "col1" ("_id", "creation_timestamp") SELECT "col1_0_data"."_id", "col1_0_data"."creation_timestamp" FROM "col1_0_data" RETURNING "_id"), "#,
                r#""col_scalar_1_data" ("creation_timestamp", "scalar") AS (VALUES (CAST(NULL AS TIMESTAMP), CAST(1 AS INT)), (CAST(NULL AS TIMESTAMP), CAST(2 AS INT)), (CAST(NULL AS TIMESTAMP), CAST(3 AS INT))) "#,
                r#"INSERT INTO "col_scalar" ("creation_timestamp", "id_col1", "scalar") SELECT "col_scalar_1_data"."creation_timestamp", "col1_0_rows"."_id", "col_scalar_1_data"."scalar" FROM "col_scalar_1_data" CROSS JOIN "col1_0_rows""#
            )
        );
    }

    #[test]
    fn documents_of_a_batch_share_values() {
        let statement = build(
            &[
                json!({ "_id": 1, "field1": "a" }),
                json!({ "_id": 2, "field1": "b" }),
                json!({ "_id": 3 }),
            ],
            Binding::Inline,
        )
        .unwrap();

        assert_binding!(
            statement,
            concat!(
                r#"WITH "col1_0_data" ("_id", "creation_timestamp", "field1") AS (VALUES (CAST(1 AS INT), CAST(NULL AS TIMESTAMP), CAST('a' AS TEXT)), (CAST(2 AS INT), CAST(NULL AS TIMESTAMP), CAST('b' AS TEXT))), "#,
                r#""col1_0_rows" AS (INSERT INTO "col1" ("_id", "creation_timestamp", "field1") SELECT "col1_0_data"."_id", "col1_0_data"."creation_timestamp", "col1_0_data"."field1" FROM "col1_0_data"), "#,
                r#""col1_1_data" ("_id", "creation_timestamp") AS (VALUES (CAST(3 AS INT), CAST(NULL AS TIMESTAMP))) "#,
                r#"INSERT INTO "col1" ("_id", "creation_timestamp") SELECT "col1_1_data"."_id", "col1_1_data"."creation_timestamp" FROM "col1_1_data""#
            )
        );
    }

    #[test]
    fn nested_rows_chain_keys() {
        let statement = build(
            &[json!({
                "_id": 1,
                "items": [
                    { "name": "a", "tags": ["x", "y"] },
                    { "name": "b" }
                ]
            })],
            Binding::Inline,
        )
        .unwrap();

        let sql = statement.sql;
        // Only the item with tags returns its key
        assert!(sql.contains(
            r#""col_items_1_rows" AS (INSERT INTO "col_items" ("creation_timestamp", "id_col1", "name") SELECT "col_items_1_data"."creation_timestamp", "col1_0_rows"."_id", "col_items_1_data"."name" FROM "col_items_1_data" CROSS JOIN "col1_0_rows" RETURNING "_id")"#
        ));
        assert!(sql.contains(
            r#""col_items_2_rows" AS (INSERT INTO "col_items" ("creation_timestamp", "id_col1", "name") SELECT "col_items_2_data"."creation_timestamp", "col1_0_rows"."_id", "col_items_2_data"."name" FROM "col_items_2_data" CROSS JOIN "col1_0_rows")"#
        ));
        assert!(sql.ends_with(
            r#"INSERT INTO "col_tags" ("creation_timestamp", "id_item", "tag") SELECT "col_tags_3_data"."creation_timestamp", "col_items_1_rows"."_id", "col_tags_3_data"."tag" FROM "col_tags_3_data" CROSS JOIN "col_items_1_rows""#
        ));
        assert!(sql.contains(
            r#""col_tags_3_data" ("creation_timestamp", "tag") AS (VALUES (CAST(NULL AS TIMESTAMP), CAST('x' AS TEXT)), (CAST(NULL AS TIMESTAMP), CAST('y' AS TEXT)))"#
        ));
    }

    #[test]
    fn control_characters_are_removed_in_both_bindings() {
        let document = json!({ "_id": 1, "field1": "a\nb\u{7}c" });

        let inline = build(&[document.clone()], Binding::Inline).unwrap();
        assert!(inline.sql.contains("CAST('abc' AS TEXT)"));

        let parameterized = build(&[document], Binding::Parameterized).unwrap();
        assert_binding!(
            parameterized,
            r#"WITH "col1_0_data" ("_id", "creation_timestamp", "field1") AS (VALUES (CAST($1::text AS INT), CAST(NULL AS TIMESTAMP), CAST($2::text AS TEXT))) INSERT INTO "col1" ("_id", "creation_timestamp", "field1") SELECT "col1_0_data"."_id", "col1_0_data"."creation_timestamp", "col1_0_data"."field1" FROM "col1_0_data""#,
            "1",
            "abc"
        );
    }

    #[test]
    fn columns_are_sorted_whatever_the_field_order() {
        const REORDERED: &str = r#"{
            "db": {
                "col1": {
                    "items": { "type": "ARRAY", "dest": "col_items", "fk": "id_col1" },
                    "scalars": { "type": "ARRAY_OF_SCALARS", "dest": "col_scalar", "fk": "id_col1", "valueField": "scalar" },
                    "field1": { "type": "TEXT", "dest": "field1" },
                    "_id": { "type": "INT" },
                    "pk": "_id"
                },
                "col_tags": { "pk": "_id" },
                "col_items": {
                    "tags": { "type": "ARRAY_OF_SCALARS", "dest": "col_tags", "fk": "id_item", "valueField": "tag" },
                    "name": { "type": "TEXT" },
                    "pk": "_id"
                },
                "col_scalar": { "scalar": { "type": "INT" }, "pk": "_id" }
            }
        }"#;

        let document = json!({ "scalars": [5], "field1": "a", "_id": 1 });

        let original = build(&[document.clone()], Binding::Inline).unwrap();
        let reordered = build_with(REORDERED, "col1", &[document], Binding::Inline).unwrap();

        assert_eq!(original.sql, reordered.sql);
        assert!(reordered.sql.starts_with(
            r#"WITH "col1_0_data" ("_id", "creation_timestamp", "field1") AS"#
        ));
        assert!(reordered.sql.contains(
            r#"INSERT INTO "col_scalar" ("creation_timestamp", "id_col1", "scalar")"#
        ));
    }

    #[test]
    fn aliases_of_long_table_names_are_shortened() {
        // 63 bytes, with a multi-byte character across the cut
        let table = format!("x{}", "é".repeat(31));
        let mapping = format!(
            r#"{{ "db": {{
                "{table}": {{
                    "pk": "_id",
                    "_id": {{ "type": "INT" }},
                    "notes": {{ "type": "ARRAY", "dest": "notes", "fk": "parent_id" }}
                }},
                "notes": {{ "pk": "_id", "body": {{ "type": "TEXT" }} }}
            }} }}"#
        );

        let statement = build_with(
            &mapping,
            &table,
            &[json!({ "_id": 1, "notes": [{ "body": "a" }] })],
            Binding::Inline,
        )
        .unwrap();

        let prefix = format!("x{}", "é".repeat(19));
        let rows_alias = format!("{prefix}_0_rows");
        assert!(rows_alias.len() <= 63);

        assert!(statement.sql.starts_with(&format!(r#"WITH "{prefix}_0_data" ("#)));
        assert!(statement.sql.contains(&format!(
            r#""{rows_alias}" AS (INSERT INTO "{table}" ("#
        )));
        assert!(statement.sql.contains(&format!(
            r#"FROM "notes_1_data" CROSS JOIN "{rows_alias}""#
        )));
    }
}
