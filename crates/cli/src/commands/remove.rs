// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::{Arg, ArgMatches, Command};
use docrel_env::Environment;

use crate::{
    commands::command::{CommandDefinition, common_args, get_required, namespace_arg},
    config,
    util::parse_document_id,
};

use super::{namespace_value, report};

pub(crate) struct RemoveCommandDefinition {}

#[async_trait]
impl CommandDefinition for RemoveCommandDefinition {
    fn command(&self) -> Command {
        Command::new("remove")
            .about("Remove a document's rows")
            .args(common_args())
            .arg(namespace_arg())
            .arg(
                Arg::new("id")
                    .help("The document id. Parsed as JSON when possible (`42`, `{\"$oid\": \"...\"}`), otherwise taken as a string.")
                    .required(true)
                    .index(2),
            )
    }

    async fn execute(&self, matches: &ArgMatches, env: Arc<dyn Environment>) -> Result<()> {
        let config = config::sync_config(matches, env)?;
        let namespace = namespace_value(matches)?;
        let id: String = get_required(matches, "id")?;

        let mut replicator = config::connect(&config).await?;
        let outcome = replicator
            .remove(&parse_document_id(&id), &namespace)
            .await?;
        report(outcome, &namespace);

        Ok(())
    }
}
