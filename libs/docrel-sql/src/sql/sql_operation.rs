// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{ExpressionBuilder, SQLBuilder, insert::Insert, values::Values};

/// The operations a common table expression (or the statement following it) can carry.
#[derive(Debug)]
pub enum SQLOperation<'a> {
    Values(Values<'a>),
    Insert(Insert<'a>),
}

impl ExpressionBuilder for SQLOperation<'_> {
    fn build(&self, builder: &mut SQLBuilder) {
        match self {
            SQLOperation::Values(values) => values.build(builder),
            SQLOperation::Insert(insert) => insert.build(builder),
        }
    }
}
