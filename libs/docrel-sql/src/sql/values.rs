// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{ExpressionBuilder, SQLBuilder, SqlValue};

/// A value along with the type it should be cast to.
#[derive(Debug, Clone, Copy)]
pub struct TypedValue<'a> {
    pub value: &'a SqlValue,
    pub sql_type: &'a str,
}

impl ExpressionBuilder for TypedValue<'_> {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_value(self.value, self.sql_type);
    }
}

/// A `VALUES` list such as `VALUES (1, 'a'), (2, 'b')`.
#[derive(Debug)]
pub struct Values<'a> {
    pub rows: Vec<Vec<TypedValue<'a>>>,
}

impl ExpressionBuilder for Values<'_> {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_str("VALUES (");
        builder.push_iter(self.rows.iter(), "), (", |builder, row| {
            builder.push_elems(row, ", ");
        });
        builder.push(')');
    }
}
