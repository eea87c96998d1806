// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::ArgMatches;
use docrel_env::{Environment, MapEnvironment};
use docrel_sql::{
    DatabaseClient,
    mapping::Mapping,
    sync::{CHUNK_SIZE_PARAM, MAPPING_FILE_PARAM, POSTGRES_URL_PARAM, Replicator, SyncConfig},
};

use crate::commands::command::get;

/// The configuration from the environment, with the common flags taking precedence.
pub fn sync_config(matches: &ArgMatches, env: Arc<dyn Environment>) -> Result<SyncConfig> {
    let mut overrides = MapEnvironment::new_with_fallback(env);

    if let Some(mappings) = get::<PathBuf>(matches, "mappings") {
        overrides.set(MAPPING_FILE_PARAM, &mappings.to_string_lossy());
    }
    if let Some(database) = get::<String>(matches, "database") {
        overrides.set(POSTGRES_URL_PARAM, &database);
    }
    if let Some(chunk_size) = get::<usize>(matches, "chunk-size") {
        overrides.set(CHUNK_SIZE_PARAM, &chunk_size.to_string());
    }

    Ok(SyncConfig::from_env(&overrides)?)
}

pub fn load_mapping(config: &SyncConfig) -> Result<Mapping> {
    config.load_mapping().with_context(|| {
        format!(
            "Unable to load the mapping from `{}`",
            config.mapping_file.display()
        )
    })
}

/// Connect to the database and create a replicator for the configured mapping.
pub async fn connect(config: &SyncConfig) -> Result<Replicator<DatabaseClient>> {
    let mapping = load_mapping(config)?;
    let client = DatabaseClient::from_url(config.postgres_url()?).await?;

    Ok(Replicator::new(client, Arc::new(mapping), config.chunk_size))
}
