// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

/// Replication of document collections into relational tables.
///
/// A [mapping::Mapping] declares, per collection, which document fields become columns and which
/// array fields become child tables. From it, [schema::DatabaseSpec] derives the tables, keys and
/// indices along with the DDL to create them. A document is flattened by
/// [normalize::Normalizer] into a [normalize::RowForest] (rows linked to their parent rows), and
/// [transform::InsertChain] turns a forest into a single statement that inserts every row,
/// chaining database-generated keys from parent to child rows through `RETURNING` clauses.
///
/// [sync::Replicator] ties these together to apply document changes (upserts, bulk loads,
/// removals) through a [TransactionExecutor], one transaction per operation.
///
/// This crate also contains, but doesn't expose, lower level primitives for SQL statements.
#[macro_use]
mod sql;
mod connect;
mod database_error;

pub mod mapping;
pub mod normalize;
pub mod schema;
pub mod sync;
pub mod transform;

pub use connect::{DatabaseClient, TransactionExecutor};
pub use database_error::{DatabaseError, WithContext};
pub use sql::{Binding, SqlStatement, SqlValue};
