// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use clap::{Arg, ArgMatches, Command};
use docrel_env::Environment;

use crate::{
    commands::command::{CommandDefinition, common_args, get_required, namespace_arg},
    config,
    util::DocumentReader,
};

use super::{namespace_value, report};

pub(crate) struct LoadCommandDefinition {}

#[async_trait]
impl CommandDefinition for LoadCommandDefinition {
    fn command(&self) -> Command {
        Command::new("load")
            .about("Replace all rows of a collection with the documents of a file")
            .args(common_args())
            .arg(namespace_arg())
            .arg(
                Arg::new("documents")
                    .help("A newline-delimited JSON file, with one document per line.")
                    .required(true)
                    .value_parser(clap::value_parser!(PathBuf))
                    .index(2),
            )
    }

    async fn execute(&self, matches: &ArgMatches, env: Arc<dyn Environment>) -> Result<()> {
        let config = config::sync_config(matches, env)?;
        let namespace = namespace_value(matches)?;
        let path: PathBuf = get_required(matches, "documents")?;

        let mut documents = DocumentReader::open(&path)?;
        let mut replicator = config::connect(&config).await?;

        let outcome = replicator.bulk_upsert(&mut documents, &namespace).await?;
        documents.finish()?;
        report(outcome, &namespace);

        Ok(())
    }
}
