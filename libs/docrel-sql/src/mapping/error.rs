// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Failed to parse the mapping: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read the mapping file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Collection '{database}.{collection}' does not declare a primary key ('pk')")]
    MissingPrimaryKey { database: String, collection: String },

    #[error("Fields '{first}' and '{second}' of '{collection}' both map to '{dest}'")]
    DuplicateDestination {
        collection: String,
        first: String,
        second: String,
        dest: String,
    },

    #[error("Field '{field}' of '{collection}' maps to the reserved column '{dest}'")]
    ReservedColumn {
        collection: String,
        field: String,
        dest: String,
    },

    #[error("Array field '{field}' of '{collection}' does not declare a foreign key column ('fk')")]
    MissingForeignKey { collection: String, field: String },

    #[error("Scalar array field '{field}' of '{collection}' does not declare 'valueField'")]
    MissingValueField { collection: String, field: String },

    #[error("Field '{field}' of '{collection}' targets '{target}', which is not a collection of '{database}'")]
    UndefinedTarget {
        database: String,
        collection: String,
        field: String,
        target: String,
    },

    #[error("Table '{table}' is defined by both '{first}' and '{second}'")]
    DuplicateTable {
        table: String,
        first: String,
        second: String,
    },

    #[error("Column '{column}' of '{table}' is linked to both '{first}' and '{second}'")]
    ConflictingLink {
        table: String,
        column: String,
        first: String,
        second: String,
    },

    #[error("Invalid field '{field}' of '{collection}': {message}")]
    InvalidFieldSpec {
        collection: String,
        field: String,
        message: String,
    },
}
