// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{ExpressionBuilder, SQLBuilder, values::TypedValue};

/// A delete operation of the form `DELETE FROM <table> WHERE <column> = <value>`.
#[derive(Debug)]
pub struct Delete<'a> {
    /// The table to delete from.
    pub table: &'a str,
    /// The column rows are matched on.
    pub column: &'a str,
    pub value: TypedValue<'a>,
}

impl ExpressionBuilder for Delete<'_> {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_str("DELETE FROM ");
        builder.push_identifier(self.table);
        builder.push_str(" WHERE ");
        builder.push_identifier(self.column);
        builder.push_str(" = ");
        self.value.build(builder);
    }
}
