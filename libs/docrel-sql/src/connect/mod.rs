// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod database_client;

use async_trait::async_trait;

use crate::{database_error::DatabaseError, sql::SqlStatement};

pub use database_client::DatabaseClient;

/// Runs statements in a transaction with deferred constraints. Either every statement is applied
/// or none is.
#[async_trait]
pub trait TransactionExecutor: Send {
    async fn execute_transaction(
        &mut self,
        statements: &[SqlStatement],
    ) -> Result<(), DatabaseError>;
}
