// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{ConfigurationError, raw::RawField};

const ARRAY_TYPES: [&str; 2] = ["ARRAY", "_ARRAY"];
const ARRAY_OF_SCALARS_TYPES: [&str; 2] = ["ARRAY_OF_SCALARS", "_ARRAY_OF_SCALARS"];

/// How a document field is projected into the relational schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    /// A column of the collection's own table.
    Scalar {
        dest_column: String,
        sql_type: String,
        indexed: bool,
    },
    /// Each element is a document of the `dest_table` collection, linked back through
    /// `foreign_key_column`.
    ArrayOfDocuments {
        dest_table: String,
        foreign_key_column: String,
        indexed: bool,
    },
    /// Each element becomes a row of `dest_table` holding the value in `value_column`.
    ArrayOfScalars {
        dest_table: String,
        foreign_key_column: String,
        value_column: String,
    },
}

impl FieldSpec {
    /// Build a field spec from a prepared raw field (with `dest` assigned).
    pub(super) fn from_raw(
        collection: &str,
        field: &str,
        raw: &RawField,
    ) -> Result<FieldSpec, ConfigurationError> {
        let invalid = |message: &str| ConfigurationError::InvalidFieldSpec {
            collection: collection.to_string(),
            field: field.to_string(),
            message: message.to_string(),
        };

        let typ = raw
            .typ
            .as_deref()
            .map(str::trim)
            .filter(|typ| !typ.is_empty())
            .ok_or_else(|| invalid("missing 'type'"))?;
        let dest = raw.dest.clone().unwrap_or_else(|| field.to_string());

        let foreign_key_column = || {
            raw.fk
                .clone()
                .ok_or_else(|| ConfigurationError::MissingForeignKey {
                    collection: collection.to_string(),
                    field: field.to_string(),
                })
        };

        if ARRAY_TYPES.contains(&typ) {
            Ok(FieldSpec::ArrayOfDocuments {
                dest_table: dest,
                foreign_key_column: foreign_key_column()?,
                indexed: raw.index,
            })
        } else if ARRAY_OF_SCALARS_TYPES.contains(&typ) {
            let value_column =
                raw.value_field
                    .clone()
                    .ok_or_else(|| ConfigurationError::MissingValueField {
                        collection: collection.to_string(),
                        field: field.to_string(),
                    })?;

            Ok(FieldSpec::ArrayOfScalars {
                dest_table: dest,
                foreign_key_column: foreign_key_column()?,
                value_column,
            })
        } else {
            Ok(FieldSpec::Scalar {
                dest_column: dest,
                sql_type: typ.to_string(),
                indexed: raw.index,
            })
        }
    }

    /// The column (for scalars) or table (for arrays) the field is projected to
    pub fn dest(&self) -> &str {
        match self {
            FieldSpec::Scalar { dest_column, .. } => dest_column,
            FieldSpec::ArrayOfDocuments { dest_table, .. }
            | FieldSpec::ArrayOfScalars { dest_table, .. } => dest_table,
        }
    }

    /// The column of the child table referencing the parent row, for array fields
    pub fn foreign_key_column(&self) -> Option<&str> {
        match self {
            FieldSpec::Scalar { .. } => None,
            FieldSpec::ArrayOfDocuments {
                foreign_key_column, ..
            }
            | FieldSpec::ArrayOfScalars {
                foreign_key_column, ..
            } => Some(foreign_key_column),
        }
    }

    pub fn is_array(&self) -> bool {
        !matches!(self, FieldSpec::Scalar { .. })
    }
}
