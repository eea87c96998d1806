// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::PathBuf;

use docrel_env::{EnvError, Environment, get_parsed};
use thiserror::Error;

use crate::{
    database_error::DatabaseError,
    mapping::{ConfigurationError, Mapping},
};

pub const POSTGRES_URL_PARAM: &str = "DOCREL_POSTGRES_URL";
pub const MAPPING_FILE_PARAM: &str = "DOCREL_MAPPING_FILE";
pub const CHUNK_SIZE_PARAM: &str = "DOCREL_CHUNK_SIZE";

const DEFAULT_MAPPING_FILE: &str = "mappings.json";
const DEFAULT_CHUNK_SIZE: usize = 100;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("{0} must be greater than zero")]
    ZeroChunkSize(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub postgres_url: Option<String>,
    pub mapping_file: PathBuf,
    /// Number of documents per transaction during bulk loads
    pub chunk_size: usize,
}

impl SyncConfig {
    pub fn from_env(env: &dyn Environment) -> Result<Self, ConfigError> {
        let chunk_size = get_parsed(env, CHUNK_SIZE_PARAM, DEFAULT_CHUNK_SIZE)?;
        if chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize(CHUNK_SIZE_PARAM));
        }

        Ok(Self {
            postgres_url: env.get(POSTGRES_URL_PARAM).filter(|url| !url.trim().is_empty()),
            mapping_file: PathBuf::from(env.get_or_else(MAPPING_FILE_PARAM, DEFAULT_MAPPING_FILE)),
            chunk_size,
        })
    }

    pub fn postgres_url(&self) -> Result<&str, DatabaseError> {
        self.postgres_url.as_deref().ok_or_else(|| {
            DatabaseError::Config(format!("Env {POSTGRES_URL_PARAM} must be provided"))
        })
    }

    pub fn load_mapping(&self) -> Result<Mapping, ConfigurationError> {
        Mapping::from_file(&self.mapping_file)
    }
}
