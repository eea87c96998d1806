// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::str::FromStr;

use async_trait::async_trait;
use tokio_postgres::{Config, NoTls};
use tracing::debug;

use crate::{
    database_error::{DatabaseError, WithContext},
    sql::SqlStatement,
};

use super::TransactionExecutor;

/// A long-lived connection to PostgreSQL
pub struct DatabaseClient {
    client: tokio_postgres::Client,
}

impl DatabaseClient {
    pub async fn from_url(url: &str) -> Result<Self, DatabaseError> {
        let config = Config::from_str(url).map_err(|e| {
            DatabaseError::Delegate(e)
                .with_context("Failed to parse PostgreSQL connection string".into())
        })?;

        let (client, connection) = config.connect(NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("connection error: {}", e);
            }
        });

        Ok(Self { client })
    }
}

#[async_trait]
impl TransactionExecutor for DatabaseClient {
    async fn execute_transaction(
        &mut self,
        statements: &[SqlStatement],
    ) -> Result<(), DatabaseError> {
        // Dropping the transaction without committing rolls it back
        let tx = self.client.transaction().await.map_err(|e| {
            DatabaseError::Delegate(e).with_context("Unable to start transaction".into())
        })?;

        tx.batch_execute("SET CONSTRAINTS ALL DEFERRED").await?;

        for statement in statements {
            debug!("Executing SQL statement: {statement}, params: {:?}", statement.params);
            tx.execute(statement.sql.as_str(), &statement.pg_params())
                .await
                .map_err(DatabaseError::Delegate)
                .with_context(format!("Failed to execute '{}'", statement.sql))?;
        }

        tx.commit().await.map_err(|e| {
            DatabaseError::Delegate(e).with_context("Failed to commit transaction".into())
        })
    }
}
