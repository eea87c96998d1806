// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Applying document changes to the database.

mod config;
mod handler;
mod replicator;

#[cfg(test)]
mod testing;

use thiserror::Error;

use crate::{database_error::DatabaseError, mapping::Namespace, normalize::NormalizeError};

pub use config::{
    CHUNK_SIZE_PARAM, ConfigError, MAPPING_FILE_PARAM, POSTGRES_URL_PARAM, SyncConfig,
};
pub use handler::{ChangeHandler, DocumentSource, OplogTimestamp, SourcedReplicator};
pub use replicator::Replicator;

/// What an operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The namespace is not mapped, or the document no longer exists
    Skipped,
    Applied { documents: usize },
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to create the schema: {0}")]
    Schema(#[source] DatabaseError),

    #[error("Failed to normalize a document of '{namespace}': {source}")]
    Normalize {
        namespace: Namespace,
        #[source]
        source: NormalizeError,
    },

    #[error("Failed to apply changes to '{namespace}': {source}")]
    Database {
        namespace: Namespace,
        #[source]
        source: DatabaseError,
    },
}
