// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::mapping::CREATION_TIMESTAMP_COLUMN;

use super::quote;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSpec {
    /// An index over a single column
    Column {
        name: String,
        column: String,
        descending: bool,
    },
    /// A user-supplied definition such as `INDEX idx_name ON users (name)`
    Fragment(String),
}

impl IndexSpec {
    pub fn on_column(table: &str, column: &str) -> Self {
        IndexSpec::Column {
            name: format!("idx_{}_{}", table.replace('.', "_"), column),
            column: column.to_string(),
            descending: false,
        }
    }

    /// Newest rows first: `idx_<table>__creation_timestamp`
    pub fn creation_timestamp(table: &str) -> Self {
        IndexSpec::Column {
            name: format!("idx_{}__{}", table.replace('.', "_"), CREATION_TIMESTAMP_COLUMN),
            column: CREATION_TIMESTAMP_COLUMN.to_string(),
            descending: true,
        }
    }

    pub fn column(&self) -> Option<&str> {
        match self {
            IndexSpec::Column { column, .. } => Some(column),
            IndexSpec::Fragment(_) => None,
        }
    }

    pub(super) fn creation_sql(&self, table: &str) -> String {
        match self {
            IndexSpec::Column {
                name,
                column,
                descending,
            } => format!(
                "CREATE INDEX {} ON {} ({}{})",
                quote(name),
                quote(table),
                quote(column),
                if *descending { " DESC" } else { "" }
            ),
            IndexSpec::Fragment(fragment) => format!("CREATE {}", fragment.trim()),
        }
    }
}
