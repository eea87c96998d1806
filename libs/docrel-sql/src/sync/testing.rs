// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    connect::TransactionExecutor, database_error::DatabaseError, mapping::Namespace,
    sql::SqlStatement,
};

use super::DocumentSource;

/// Records the statements of each committed transaction instead of running them.
#[derive(Default)]
pub(crate) struct RecordingExecutor {
    pub committed: Vec<Vec<SqlStatement>>,
    /// Number of transactions attempted, including failed ones
    pub calls: usize,
    /// The (0-based) transaction that should fail
    pub fail_on: Option<usize>,
}

impl RecordingExecutor {
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TransactionExecutor for RecordingExecutor {
    async fn execute_transaction(
        &mut self,
        statements: &[SqlStatement],
    ) -> Result<(), DatabaseError> {
        let call = self.calls;
        self.calls += 1;

        if self.fail_on == Some(call) {
            return Err(DatabaseError::Transaction(format!(
                "transaction {call} rolled back"
            )));
        }

        self.committed.push(statements.to_vec());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemorySource {
    documents: Vec<(Namespace, Value, Value)>,
}

impl MemorySource {
    pub fn with(mut self, namespace: &Namespace, document_id: Value, document: Value) -> Self {
        self.documents
            .push((namespace.clone(), document_id, document));
        self
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    async fn find_by_id(
        &self,
        namespace: &Namespace,
        document_id: &Value,
    ) -> Result<Option<Value>, DatabaseError> {
        Ok(self
            .documents
            .iter()
            .find(|(ns, id, _)| ns == namespace && id == document_id)
            .map(|(_, _, document)| document.clone()))
    }
}
