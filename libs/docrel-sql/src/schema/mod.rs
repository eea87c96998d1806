// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Relational schema derived from a mapping, and the DDL to create it from scratch.

mod column_spec;
mod constraint;
mod database_spec;
mod index_spec;
mod statement;
mod table_spec;

pub use column_spec::ColumnSpec;
pub use constraint::ForeignKeySpec;
pub use database_spec::DatabaseSpec;
pub use index_spec::IndexSpec;
pub use statement::SchemaStatement;
pub use table_spec::TableSpec;

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
