// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::quote;

/// A foreign key from a child table (the target of an array field) to its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeySpec {
    pub table: String,
    pub column: String,
    pub foreign_table: String,
    pub foreign_column: String,
}

impl ForeignKeySpec {
    pub fn constraint_name(&self) -> String {
        format!("{}_{}_fk", self.table, self.column)
    }

    /// The constraint is checked at commit, so parent and child rows may be inserted in any
    /// order within a transaction. Removing a parent removes its children.
    pub(super) fn creation_sql(&self) -> String {
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED",
            quote(&self.table),
            quote(&self.constraint_name()),
            quote(&self.column),
            quote(&self.foreign_table),
            quote(&self.foreign_column),
        )
    }
}
