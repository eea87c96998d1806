// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::{BTreeMap, VecDeque};

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    mapping::{CREATION_TIMESTAMP_COLUMN, Collection, FieldSpec, Mapping, Namespace, lookup_path},
    schema::DatabaseSpec,
    sql::SqlValue,
};

use super::{
    NormalizeError,
    row_forest::{NodeId, RowForest, RowNode, RowValue},
    value::{object_id_timestamp, scalar_value},
};

/// Flattens documents into rows according to a mapping.
pub struct Normalizer<'a> {
    mapping: &'a Mapping,
    database_spec: &'a DatabaseSpec,
}

/// Work item of the breadth-first walk over a document
enum Pending<'a, 'd> {
    Document {
        collection: &'a Collection,
        document: &'d Value,
        /// The parent node and the column referring to it
        link: Option<(NodeId, &'a str)>,
    },
    Scalar {
        table: &'a str,
        foreign_key_column: &'a str,
        value_column: &'a str,
        value: &'d Value,
        parent: NodeId,
    },
}

impl<'a> Normalizer<'a> {
    pub fn new(mapping: &'a Mapping, database_spec: &'a DatabaseSpec) -> Self {
        Self {
            mapping,
            database_spec,
        }
    }

    /// Build the rows for a document of `namespace`. The document's own row comes first,
    /// followed by rows for its array elements (breadth-first).
    pub fn normalize(
        &self,
        namespace: &Namespace,
        document: &Value,
    ) -> Result<RowForest, NormalizeError> {
        let collection = self
            .mapping
            .namespace_collection(namespace)
            .ok_or_else(|| NormalizeError::Unmapped(namespace.clone()))?;

        if !document.is_object() {
            return Err(NormalizeError::NotADocument {
                namespace: namespace.clone(),
                found: value_kind(document),
            });
        }

        let mut forest = RowForest::new();
        let mut queue = VecDeque::from([Pending::Document {
            collection,
            document,
            link: None,
        }]);

        while let Some(pending) = queue.pop_front() {
            match pending {
                Pending::Document {
                    collection,
                    document,
                    link,
                } => {
                    let mut columns = self.project(collection, document);
                    if let Some((parent, foreign_key_column)) = link {
                        columns.insert(
                            foreign_key_column.to_string(),
                            RowValue::Placeholder(parent),
                        );
                    }

                    let id = forest.push(RowNode {
                        table: collection.name.clone(),
                        columns,
                        parent: link.map(|(parent, _)| parent),
                        has_dependents: false,
                    });

                    self.enqueue_arrays(namespace, collection, document, id, &mut queue);
                }
                Pending::Scalar {
                    table,
                    foreign_key_column,
                    value_column,
                    value,
                    parent,
                } => {
                    let columns = BTreeMap::from([
                        (
                            CREATION_TIMESTAMP_COLUMN.to_string(),
                            RowValue::Literal(SqlValue::Null),
                        ),
                        (
                            foreign_key_column.to_string(),
                            RowValue::Placeholder(parent),
                        ),
                        (
                            value_column.to_string(),
                            RowValue::Literal(scalar_value(value)),
                        ),
                    ]);

                    forest.push(RowNode {
                        table: table.to_string(),
                        columns,
                        parent: Some(parent),
                        has_dependents: false,
                    });
                }
            }
        }

        debug!("Normalized a document of {namespace} into {} rows", forest.len());
        Ok(forest)
    }

    /// The value of the primary key supplied by the document, if any
    pub fn primary_key_value(&self, collection: &Collection, document: &Value) -> Option<SqlValue> {
        let (path, _) = collection.primary_key_field()?;
        match lookup_path(document, path) {
            None | Some(Value::Null) => None,
            Some(value) => Some(scalar_value(value)),
        }
    }

    /// Scalar columns of the collection's own row, including the creation timestamp. Unmapped
    /// fields are dropped.
    fn project(&self, collection: &Collection, document: &Value) -> BTreeMap<String, RowValue> {
        let table = self.database_spec.table(&collection.name);
        let mut columns = BTreeMap::new();

        for (path, dest_column, _) in collection.scalar_fields() {
            if table.is_some_and(|table| table.column(dest_column).is_none()) {
                continue;
            }
            if let Some(value) = lookup_path(document, path) {
                columns.insert(
                    dest_column.to_string(),
                    RowValue::Literal(scalar_value(value)),
                );
            }
        }

        let key = collection
            .primary_key_field()
            .and_then(|(path, _)| lookup_path(document, path))
            .filter(|value| !value.is_null());

        match key {
            Some(key) => {
                let creation_timestamp = object_id_timestamp(key)
                    .map(SqlValue::Timestamp)
                    .unwrap_or(SqlValue::Null);
                columns.insert(
                    CREATION_TIMESTAMP_COLUMN.to_string(),
                    RowValue::Literal(creation_timestamp),
                );
            }
            None => {
                // Leave the key to the database
                columns.remove(&collection.primary_key);
                columns.insert(
                    CREATION_TIMESTAMP_COLUMN.to_string(),
                    RowValue::Literal(SqlValue::Null),
                );

                let generated = table
                    .and_then(|table| table.primary_key_column())
                    .is_some_and(|column| column.is_generated);
                if !generated {
                    warn!(
                        "A document of '{}' has no value for its primary key '{}'",
                        collection.name, collection.primary_key
                    );
                }
            }
        }

        columns
    }

    fn enqueue_arrays<'d>(
        &self,
        namespace: &Namespace,
        collection: &'a Collection,
        document: &'d Value,
        id: NodeId,
        queue: &mut VecDeque<Pending<'a, 'd>>,
    ) {
        let array_fields =
            self.mapping
                .enumerate_array_fields(&namespace.database, &collection.name, document);

        for path in array_fields.documents.into_iter().chain(array_fields.scalars) {
            let (Some(field), Some(Value::Array(elements))) =
                (collection.fields.get(path), lookup_path(document, path))
            else {
                continue;
            };

            match field {
                FieldSpec::ArrayOfDocuments {
                    dest_table,
                    foreign_key_column,
                    ..
                } => {
                    let Some(target) = self.mapping.collection(&namespace.database, dest_table)
                    else {
                        continue;
                    };

                    for element in elements {
                        if element.is_object() {
                            queue.push_back(Pending::Document {
                                collection: target,
                                document: element,
                                link: Some((id, foreign_key_column.as_str())),
                            });
                        } else {
                            warn!(
                                "Skipping a non-document element ({}) of '{}.{path}'",
                                value_kind(element),
                                collection.name
                            );
                        }
                    }
                }
                FieldSpec::ArrayOfScalars {
                    dest_table,
                    foreign_key_column,
                    value_column,
                } => {
                    for element in elements {
                        queue.push_back(Pending::Scalar {
                            table: dest_table.as_str(),
                            foreign_key_column: foreign_key_column.as_str(),
                            value_column: value_column.as_str(),
                            value: element,
                            parent: id,
                        });
                    }
                }
                FieldSpec::Scalar { .. } => {}
            }
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
