// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::{connect::TransactionExecutor, database_error::DatabaseError, mapping::Namespace};

use super::{Outcome, Replicator, SyncError};

/// Position of a change in the source's operation log
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OplogTimestamp(pub i64);

impl Display for OplogTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read access to the documents of the source database.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// The current content of a document, or `None` if it no longer exists.
    async fn find_by_id(
        &self,
        namespace: &Namespace,
        document_id: &Value,
    ) -> Result<Option<Value>, DatabaseError>;
}

/// The operations a change stream reader drives.
///
/// The timestamp of each change is carried along for tracing only.
#[async_trait]
pub trait ChangeHandler: Send {
    async fn upsert(
        &mut self,
        document: &Value,
        namespace: &Namespace,
        timestamp: OplogTimestamp,
    ) -> Result<Outcome, SyncError>;

    async fn bulk_upsert(
        &mut self,
        documents: Box<dyn Iterator<Item = Value> + Send>,
        namespace: &Namespace,
        timestamp: OplogTimestamp,
    ) -> Result<Outcome, SyncError>;

    async fn update(
        &mut self,
        document_id: &Value,
        update_spec: &Value,
        namespace: &Namespace,
        timestamp: OplogTimestamp,
    ) -> Result<Outcome, SyncError>;

    async fn remove(
        &mut self,
        document_id: &Value,
        namespace: &Namespace,
        timestamp: OplogTimestamp,
    ) -> Result<Outcome, SyncError>;

    async fn initialize_schema(&mut self) -> Result<(), SyncError>;
}

/// A replicator paired with the source it re-reads updated documents from.
pub struct SourcedReplicator<E: TransactionExecutor, S: DocumentSource> {
    pub replicator: Replicator<E>,
    pub source: S,
}

impl<E: TransactionExecutor, S: DocumentSource> SourcedReplicator<E, S> {
    pub fn new(replicator: Replicator<E>, source: S) -> Self {
        Self { replicator, source }
    }
}

#[async_trait]
impl<E, S> ChangeHandler for SourcedReplicator<E, S>
where
    E: TransactionExecutor,
    S: DocumentSource,
{
    #[instrument(name = "change::upsert", skip_all, fields(%namespace, %timestamp))]
    async fn upsert(
        &mut self,
        document: &Value,
        namespace: &Namespace,
        timestamp: OplogTimestamp,
    ) -> Result<Outcome, SyncError> {
        self.replicator.upsert(document, namespace).await
    }

    #[instrument(name = "change::bulk_upsert", skip_all, fields(%namespace, %timestamp))]
    async fn bulk_upsert(
        &mut self,
        documents: Box<dyn Iterator<Item = Value> + Send>,
        namespace: &Namespace,
        timestamp: OplogTimestamp,
    ) -> Result<Outcome, SyncError> {
        self.replicator.bulk_upsert(documents, namespace).await
    }

    #[instrument(name = "change::update", skip_all, fields(%namespace, %timestamp))]
    async fn update(
        &mut self,
        document_id: &Value,
        update_spec: &Value,
        namespace: &Namespace,
        timestamp: OplogTimestamp,
    ) -> Result<Outcome, SyncError> {
        self.replicator
            .update(document_id, update_spec, namespace, &self.source)
            .await
    }

    #[instrument(name = "change::remove", skip_all, fields(%namespace, %timestamp))]
    async fn remove(
        &mut self,
        document_id: &Value,
        namespace: &Namespace,
        timestamp: OplogTimestamp,
    ) -> Result<Outcome, SyncError> {
        self.replicator.remove(document_id, namespace).await
    }

    #[instrument(name = "change::initialize_schema", skip_all)]
    async fn initialize_schema(&mut self) -> Result<(), SyncError> {
        self.replicator.initialize_schema().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use test_log::test;

    use super::*;
    use crate::{
        mapping::Mapping,
        sync::testing::{MemorySource, RecordingExecutor},
    };

    fn handler(source: MemorySource) -> SourcedReplicator<RecordingExecutor, MemorySource> {
        let mapping = Mapping::from_json(
            r#"{"shop": {"orders": {"pk": "_id", "_id": {"type": "TEXT"}, "total": {"type": "INT"}}}}"#,
        )
        .unwrap();

        SourcedReplicator::new(
            Replicator::new(RecordingExecutor::default(), Arc::new(mapping), 10),
            source,
        )
    }

    #[test(tokio::test)]
    async fn update_reads_the_current_document() {
        let namespace: Namespace = "shop.orders".parse().unwrap();
        let source = MemorySource::default().with(
            &namespace,
            json!("o1"),
            json!({"_id": "o1", "total": 12}),
        );
        let mut handler = handler(source);

        let outcome = handler
            .update(
                &json!("o1"),
                &json!({"$set": {"total": 12}}),
                &namespace,
                OplogTimestamp(42),
            )
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Applied { documents: 1 });
        let committed = &handler.replicator.executor().committed;
        assert_eq!(committed.len(), 1);
        assert_eq!(
            committed[0][0].sql,
            r#"DELETE FROM "orders" WHERE "_id" = CAST($1::text AS TEXT)"#
        );
        assert_eq!(committed[0][1].params, vec!["o1", "12"]);
    }

    #[test(tokio::test)]
    async fn update_of_a_vanished_document_is_skipped() {
        let namespace: Namespace = "shop.orders".parse().unwrap();
        let mut handler = handler(MemorySource::default());

        let outcome = handler
            .update(&json!("gone"), &json!({}), &namespace, OplogTimestamp(1))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Skipped);
        assert_eq!(handler.replicator.executor().calls, 0);
    }

    #[test(tokio::test)]
    async fn bulk_upsert_through_a_boxed_iterator() {
        let namespace: Namespace = "shop.orders".parse().unwrap();
        let mut handler = handler(MemorySource::default());

        let documents = vec![
            json!({"_id": "a", "total": 1}),
            json!({"_id": "b", "total": 2}),
        ];
        let outcome = handler
            .bulk_upsert(Box::new(documents.into_iter()), &namespace, OplogTimestamp(7))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Applied { documents: 2 });
        assert_eq!(handler.replicator.inserted_count(&namespace), 2);
    }
}
