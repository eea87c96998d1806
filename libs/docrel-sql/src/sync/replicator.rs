// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{borrow::Borrow, collections::HashMap, sync::Arc};

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    connect::TransactionExecutor,
    mapping::{Collection, Mapping, Namespace},
    normalize::{Normalizer, RowForest, scalar_value},
    schema::DatabaseSpec,
    sql::{
        Binding, ExpressionBuilder, SqlStatement, SqlValue, delete::Delete, truncate::Truncate,
        values::TypedValue,
    },
    transform::InsertChain,
};

use super::{DocumentSource, Outcome, SyncError};

/// Replicates documents through a transaction executor.
///
/// Every operation takes `&mut self`, so operations on a replicator never overlap.
pub struct Replicator<E: TransactionExecutor> {
    executor: E,
    mapping: Arc<Mapping>,
    database_spec: DatabaseSpec,
    chunk_size: usize,
    binding: Binding,
    /// Documents inserted so far, per namespace
    inserted: HashMap<Namespace, usize>,
}

impl<E: TransactionExecutor> Replicator<E> {
    pub fn new(executor: E, mapping: Arc<Mapping>, chunk_size: usize) -> Self {
        let database_spec = DatabaseSpec::from_mapping(&mapping);

        Self {
            executor,
            mapping,
            database_spec,
            chunk_size: chunk_size.max(1),
            binding: Binding::Parameterized,
            inserted: HashMap::new(),
        }
    }

    /// Render data values with `binding` instead of parameters. Inline values make the statements
    /// readable when they are printed rather than executed.
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.binding = binding;
        self
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn database_spec(&self) -> &DatabaseSpec {
        &self.database_spec
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn inserted_count(&self, namespace: &Namespace) -> usize {
        self.inserted.get(namespace).copied().unwrap_or(0)
    }

    /// Drop and recreate every mapped table, in a single transaction.
    #[instrument(skip_all)]
    pub async fn initialize_schema(&mut self) -> Result<(), SyncError> {
        let statements: Vec<_> = self
            .database_spec
            .creation_sql()
            .into_iter()
            .map(SqlStatement::raw)
            .collect();

        if let Err(e) = self.executor.execute_transaction(&statements).await {
            error!("A fatal error occurred during tables creation: {e}");
            return Err(SyncError::Schema(e));
        }

        info!("Created {} tables", self.database_spec.tables().len());
        Ok(())
    }

    /// Replace the rows of a document (and of its array elements) with its current content.
    #[instrument(skip_all, fields(namespace = %namespace))]
    pub async fn upsert(
        &mut self,
        document: &Value,
        namespace: &Namespace,
    ) -> Result<Outcome, SyncError> {
        let Some(collection) = self.mapping.namespace_collection(namespace) else {
            debug!("Skipping a document of unmapped {namespace}");
            return Ok(Outcome::Skipped);
        };

        let normalizer = Normalizer::new(&self.mapping, &self.database_spec);
        let forest = normalizer
            .normalize(namespace, document)
            .map_err(|source| {
                error!("Impossible to upsert a document of {namespace}: {source}");
                SyncError::Normalize {
                    namespace: namespace.clone(),
                    source,
                }
            })?;

        let key = normalizer.primary_key_value(collection, document);
        let mut statements = vec![];
        match &key {
            Some(key) => {
                statements.push(delete_statement(
                    &self.database_spec,
                    collection,
                    key,
                    self.binding,
                ));
            }
            None => warn!(
                "A document of {namespace} has no '{}'; existing rows are not replaced",
                collection.primary_key
            ),
        }
        statements.extend(
            InsertChain::new(&self.database_spec, self.binding).build(&forest),
        );

        if let Err(source) = self.executor.execute_transaction(&statements).await {
            error!(
                "Impossible to upsert document {} to {namespace}: {source}",
                document_id(key.as_ref())
            );
            return Err(SyncError::Database {
                namespace: namespace.clone(),
                source,
            });
        }

        *self.inserted.entry(namespace.clone()).or_default() += 1;
        Ok(Outcome::Applied { documents: 1 })
    }

    /// Replace all rows of a collection (and of its child tables) with the given documents.
    ///
    /// The tables are truncated first. Documents are then inserted in chunks of `chunk_size`,
    /// each in its own transaction. A failing chunk stops the load, but earlier chunks stay.
    #[instrument(skip_all, fields(namespace = %namespace))]
    pub async fn bulk_upsert<I>(
        &mut self,
        documents: I,
        namespace: &Namespace,
    ) -> Result<Outcome, SyncError>
    where
        I: IntoIterator,
        I::Item: Borrow<Value>,
    {
        let Some(collection) = self.mapping.namespace_collection(namespace) else {
            debug!("Skipping documents of unmapped {namespace}");
            return Ok(Outcome::Skipped);
        };

        info!("Deleting all rows of {namespace} before the bulk load");
        let mut tables = vec![collection.name.as_str()];
        tables.extend(
            self.mapping
                .child_tables(&namespace.database, &collection.name),
        );
        let truncate = Truncate { tables }.to_sql(self.binding);

        if let Err(source) = self.executor.execute_transaction(&[truncate]).await {
            error!("Impossible to delete the rows of {namespace}: {source}");
            return Err(SyncError::Database {
                namespace: namespace.clone(),
                source,
            });
        }

        let normalizer = Normalizer::new(&self.mapping, &self.database_spec);
        let chain = InsertChain::new(&self.database_spec, self.binding);

        let mut documents = documents.into_iter();
        let mut copied = 0;

        loop {
            let chunk: Vec<_> = documents.by_ref().take(self.chunk_size).collect();
            if chunk.is_empty() {
                break;
            }

            let mut forest = RowForest::new();
            for document in chunk.iter() {
                let document_forest = normalizer
                    .normalize(namespace, document.borrow())
                    .map_err(|source| {
                        error!("Impossible to bulk insert documents in {namespace}: {source}");
                        SyncError::Normalize {
                            namespace: namespace.clone(),
                            source,
                        }
                    })?;
                forest.append(document_forest);
            }

            if let Some(statement) = chain.build(&forest) {
                if let Err(source) = self.executor.execute_transaction(&[statement]).await {
                    error!(
                        "Impossible to bulk insert documents {}..{} in {namespace}: {source}",
                        copied,
                        copied + chunk.len()
                    );
                    return Err(SyncError::Database {
                        namespace: namespace.clone(),
                        source,
                    });
                }
            }

            copied += chunk.len();
            *self.inserted.entry(namespace.clone()).or_default() += chunk.len();
            info!("{copied} documents of {namespace} copied");
        }

        Ok(Outcome::Applied { documents: copied })
    }

    /// Remove a document's row. Rows of its array elements are removed by cascade.
    #[instrument(skip_all, fields(namespace = %namespace))]
    pub async fn remove(
        &mut self,
        document_id: &Value,
        namespace: &Namespace,
    ) -> Result<Outcome, SyncError> {
        let Some(collection) = self.mapping.namespace_collection(namespace) else {
            debug!("Skipping a removal from unmapped {namespace}");
            return Ok(Outcome::Skipped);
        };

        let key = scalar_value(document_id);
        let statement = delete_statement(&self.database_spec, collection, &key, self.binding);

        if let Err(source) = self.executor.execute_transaction(&[statement]).await {
            error!("Impossible to remove document {key} from {namespace}: {source}");
            return Err(SyncError::Database {
                namespace: namespace.clone(),
                source,
            });
        }

        info!("Document {key} of {namespace} deleted");
        Ok(Outcome::Applied { documents: 1 })
    }

    /// Re-read a changed document from its source and upsert it.
    #[instrument(skip_all, fields(namespace = %namespace))]
    pub async fn update<S>(
        &mut self,
        document_id: &Value,
        update_spec: &Value,
        namespace: &Namespace,
        source: &S,
    ) -> Result<Outcome, SyncError>
    where
        S: DocumentSource + ?Sized,
    {
        if !self.mapping.is_mapped(namespace) {
            debug!("Skipping an update of unmapped {namespace}");
            return Ok(Outcome::Skipped);
        }

        debug!("Update of {document_id} in {namespace}: {update_spec}");

        let document = match source.find_by_id(namespace, document_id).await {
            Ok(Some(document)) => document,
            Ok(None) => {
                info!("Document {document_id} of {namespace} no longer exists, skipping");
                return Ok(Outcome::Skipped);
            }
            Err(e) => {
                error!("Impossible to fetch document {document_id} of {namespace}: {e}");
                return Err(SyncError::Database {
                    namespace: namespace.clone(),
                    source: e,
                });
            }
        };

        self.upsert(&document, namespace).await
    }
}

fn delete_statement(
    database_spec: &DatabaseSpec,
    collection: &Collection,
    key: &SqlValue,
    binding: Binding,
) -> SqlStatement {
    let primary_key = collection.primary_key.as_str();
    Delete {
        table: &collection.name,
        column: primary_key,
        value: TypedValue {
            value: key,
            sql_type: database_spec
                .column_type(&collection.name, primary_key)
                .unwrap_or("TEXT"),
        },
    }
    .to_sql(binding)
}

fn document_id(key: Option<&SqlValue>) -> String {
    key.map(SqlValue::to_string)
        .unwrap_or_else(|| "<generated>".to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_log::test;

    use super::*;
    use crate::sync::testing::{MemorySource, RecordingExecutor};

    const MAPPING: &str = r#"{
        "shop": {
            "orders": {
                "pk": "_id",
                "_id": { "type": "TEXT" },
                "total": { "type": "INT" },
                "items": { "type": "ARRAY", "dest": "order_items", "fk": "order_id" },
                "tags": { "type": "ARRAY_OF_SCALARS", "dest": "order_tags", "fk": "order_id", "valueField": "tag" }
            },
            "order_items": { "pk": "id", "sku": { "type": "TEXT" } },
            "order_tags": { "pk": "id" },
            "events": { "pk": "id", "kind": { "type": "TEXT" } }
        }
    }"#;

    fn replicator(executor: RecordingExecutor, chunk_size: usize) -> Replicator<RecordingExecutor> {
        let mapping = Mapping::from_json(MAPPING).unwrap();
        Replicator::new(executor, Arc::new(mapping), chunk_size)
    }

    fn orders() -> Namespace {
        Namespace::new("shop", "orders")
    }

    fn documents(count: usize) -> Vec<Value> {
        (0..count)
            .map(|i| json!({"_id": format!("o{i}"), "total": i}))
            .collect()
    }

    #[test(tokio::test)]
    async fn bulk_upsert_in_chunks() {
        let mut replicator = replicator(RecordingExecutor::default(), 2);

        let outcome = replicator
            .bulk_upsert(documents(5), &orders())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Applied { documents: 5 });
        assert_eq!(replicator.inserted_count(&orders()), 5);

        let committed = &replicator.executor().committed;
        assert_eq!(committed.len(), 4);
        assert_eq!(
            committed[0][0].sql,
            r#"TRUNCATE "orders", "order_items", "order_tags""#
        );

        let params: Vec<_> = committed[1..]
            .iter()
            .map(|transaction| {
                assert_eq!(transaction.len(), 1);
                transaction[0].params.len()
            })
            .collect();
        assert_eq!(params, vec![4, 4, 2]);
    }

    #[test(tokio::test)]
    async fn failed_chunk_keeps_earlier_chunks() {
        let mut replicator = replicator(RecordingExecutor::failing_on(2), 2);

        let result = replicator.bulk_upsert(documents(5), &orders()).await;

        assert!(matches!(result, Err(SyncError::Database { .. })));
        assert_eq!(replicator.executor().calls, 3);
        assert_eq!(replicator.executor().committed.len(), 2);
        assert_eq!(replicator.inserted_count(&orders()), 2);
    }

    #[test(tokio::test)]
    async fn bulk_upsert_of_nothing_only_truncates() {
        let mut replicator = replicator(RecordingExecutor::default(), 2);

        let outcome = replicator
            .bulk_upsert(Vec::<Value>::new(), &orders())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Applied { documents: 0 });
        assert_eq!(replicator.executor().committed.len(), 1);
    }

    #[test(tokio::test)]
    async fn upsert_replaces_existing_rows() {
        let mut replicator = replicator(RecordingExecutor::default(), 10);

        let outcome = replicator
            .upsert(
                &json!({"_id": "o1", "total": 3, "tags": ["new"]}),
                &orders(),
            )
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Applied { documents: 1 });

        let committed = &replicator.executor().committed;
        assert_eq!(committed.len(), 1);

        let transaction = &committed[0];
        assert_eq!(transaction.len(), 2);
        assert_eq!(
            transaction[0].sql,
            r#"DELETE FROM "orders" WHERE "_id" = CAST($1::text AS TEXT)"#
        );
        assert_eq!(transaction[0].params, vec!["o1"]);

        assert!(transaction[1].sql.starts_with(r#"WITH "orders_0_data""#));
        assert!(
            transaction[1]
                .sql
                .contains(r#"INSERT INTO "order_tags" ("creation_timestamp", "order_id", "tag")"#)
        );
        assert_eq!(transaction[1].params, vec!["o1", "3", "new"]);
    }

    #[test(tokio::test)]
    async fn inline_binding() {
        let mut replicator =
            replicator(RecordingExecutor::default(), 10).with_binding(Binding::Inline);

        replicator
            .upsert(&json!({"_id": "o1", "total": 3}), &orders())
            .await
            .unwrap();

        let transaction = &replicator.executor().committed[0];
        assert_eq!(
            transaction[0].sql,
            r#"DELETE FROM "orders" WHERE "_id" = CAST('o1' AS TEXT)"#
        );
        assert!(transaction.iter().all(|statement| statement.params.is_empty()));
    }

    #[test(tokio::test)]
    async fn upsert_without_key_only_inserts() {
        let mut replicator = replicator(RecordingExecutor::default(), 10);
        let events = Namespace::new("shop", "events");

        replicator
            .upsert(&json!({"kind": "click"}), &events)
            .await
            .unwrap();

        let transaction = &replicator.executor().committed[0];
        assert_eq!(transaction.len(), 1);
        assert!(transaction[0].sql.contains(r#"INSERT INTO "events" ("creation_timestamp", "kind")"#));
        assert_eq!(replicator.inserted_count(&events), 1);
    }

    #[test(tokio::test)]
    async fn unmapped_namespaces_are_skipped() {
        let mut replicator = replicator(RecordingExecutor::default(), 10);
        let unmapped = Namespace::new("shop", "carts");

        let document = json!({"_id": "c1"});
        assert_eq!(
            replicator.upsert(&document, &unmapped).await.unwrap(),
            Outcome::Skipped
        );
        assert_eq!(
            replicator
                .bulk_upsert([document.clone()], &unmapped)
                .await
                .unwrap(),
            Outcome::Skipped
        );
        assert_eq!(
            replicator.remove(&json!("c1"), &unmapped).await.unwrap(),
            Outcome::Skipped
        );
        assert_eq!(
            replicator
                .update(&json!("c1"), &json!({}), &unmapped, &MemorySource::default())
                .await
                .unwrap(),
            Outcome::Skipped
        );

        assert_eq!(replicator.executor().calls, 0);
    }

    #[test(tokio::test)]
    async fn non_document_is_rejected() {
        let mut replicator = replicator(RecordingExecutor::default(), 10);

        let result = replicator.upsert(&json!([1, 2]), &orders()).await;

        assert!(matches!(result, Err(SyncError::Normalize { .. })));
        assert_eq!(replicator.executor().calls, 0);
    }

    #[test(tokio::test)]
    async fn remove_deletes_by_key() {
        let mut replicator = replicator(RecordingExecutor::default(), 10);

        let outcome = replicator
            .remove(&json!({"$oid": "507f1f77bcf86cd799439011"}), &orders())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Applied { documents: 1 });
        let statement = &replicator.executor().committed[0][0];
        assert_eq!(
            statement.sql,
            r#"DELETE FROM "orders" WHERE "_id" = CAST($1::text AS TEXT)"#
        );
        assert_eq!(statement.params, vec!["507f1f77bcf86cd799439011"]);
    }

    #[test(tokio::test)]
    async fn update_upserts_the_fetched_document() {
        let mut replicator = replicator(RecordingExecutor::default(), 10);
        let source = MemorySource::default().with(
            &orders(),
            json!("o9"),
            json!({"_id": "o9", "total": 9}),
        );

        let outcome = replicator
            .update(&json!("o9"), &json!({"$set": {"total": 9}}), &orders(), &source)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Applied { documents: 1 });
        assert_eq!(replicator.executor().committed[0].len(), 2);

        let outcome = replicator
            .update(&json!("o10"), &json!({}), &orders(), &source)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped);
        assert_eq!(replicator.executor().calls, 1);
    }

    #[test(tokio::test)]
    async fn schema_is_created_in_one_transaction() {
        let mut replicator = replicator(RecordingExecutor::default(), 10);

        replicator.initialize_schema().await.unwrap();

        let committed = &replicator.executor().committed;
        assert_eq!(committed.len(), 1);
        assert_eq!(
            committed[0][0].sql,
            r#"DROP TABLE IF EXISTS "orders" CASCADE"#
        );
        assert!(
            committed[0]
                .iter()
                .any(|statement| statement.sql.contains("DEFERRABLE INITIALLY DEFERRED"))
        );
    }

    #[test(tokio::test)]
    async fn failed_schema_creation() {
        let mut replicator = replicator(RecordingExecutor::failing_on(0), 10);

        let result = replicator.initialize_schema().await;

        assert!(matches!(result, Err(SyncError::Schema(_))));
    }
}
