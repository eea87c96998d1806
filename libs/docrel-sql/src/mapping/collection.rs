// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;

use super::FieldSpec;

/// A validated collection mapping. Its name is also the name of its table.
#[derive(Debug, Clone)]
pub struct Collection {
    pub name: String,
    pub primary_key: String,
    /// Fields keyed by their (possibly dotted) path in the document, in declaration order
    pub fields: IndexMap<String, FieldSpec>,
    /// Index definitions to be prefixed with `CREATE `
    pub extra_indices: Vec<String>,
}

impl Collection {
    pub fn scalar_fields(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.fields.iter().filter_map(|(path, spec)| match spec {
            FieldSpec::Scalar {
                dest_column,
                sql_type,
                ..
            } => Some((path.as_str(), dest_column.as_str(), sql_type.as_str())),
            _ => None,
        })
    }

    pub fn array_fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields
            .iter()
            .filter(|(_, spec)| spec.is_array())
            .map(|(path, spec)| (path.as_str(), spec))
    }

    /// The document path and SQL type of the field holding the primary key, if the documents
    /// supply it. `None` means the key is generated by the database.
    pub fn primary_key_field(&self) -> Option<(&str, &str)> {
        self.scalar_fields()
            .find(|(_, dest, _)| *dest == self.primary_key)
            .map(|(path, _, sql_type)| (path, sql_type))
    }
}
