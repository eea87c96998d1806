// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::{self, Display, Formatter};

/// An SQL statement along with statements that must run around it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchemaStatement {
    pub statement: String,
    // statements that need to be executed before this statement. For example, when creating a table,
    // any existing table with the same name needs to be dropped first.
    pub pre_statements: Vec<String>,
    // statements that need to be executed after this statement. For example, indices can only be
    // created once the table exists.
    pub post_statements: Vec<String>,
}

impl SchemaStatement {
    /// All statements in execution order. An empty main statement is skipped.
    pub fn flatten(&self) -> impl Iterator<Item = &str> {
        self.pre_statements
            .iter()
            .map(String::as_str)
            .chain(Some(self.statement.as_str()).filter(|s| !s.is_empty()))
            .chain(self.post_statements.iter().map(String::as_str))
    }
}

impl Display for SchemaStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for statement in self.flatten() {
            writeln!(f, "{statement};")?;
        }
        Ok(())
    }
}
