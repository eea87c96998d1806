// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use clap::{ArgMatches, Command};
use docrel_env::Environment;
use docrel_sql::schema::DatabaseSpec;

use crate::{
    commands::command::{CommandDefinition, common_args, flag_arg, get, output_arg},
    config,
    util::open_file_for_output,
};

pub(crate) struct SchemaCommandDefinition {}

#[async_trait]
impl CommandDefinition for SchemaCommandDefinition {
    fn command(&self) -> Command {
        Command::new("schema")
            .about("Print the DDL for the mapped tables, or recreate them")
            .args(common_args())
            .arg(output_arg())
            .arg(flag_arg(
                "apply",
                "Drop and recreate every mapped table in the database. Existing rows are lost.",
            ))
    }

    async fn execute(&self, matches: &ArgMatches, env: Arc<dyn Environment>) -> Result<()> {
        let config = config::sync_config(matches, env)?;

        if matches.get_flag("apply") {
            let mut replicator = config::connect(&config).await?;
            replicator.initialize_schema().await?;
            println!(
                "Created {} tables",
                replicator.database_spec().tables().len()
            );
            return Ok(());
        }

        let mapping = config::load_mapping(&config)?;
        let output: Option<PathBuf> = get(matches, "output");
        let mut buffer = open_file_for_output(output.as_deref())?;

        for statement in DatabaseSpec::from_mapping(&mapping).creation_statements() {
            write!(buffer, "{statement}")?;
        }

        Ok(())
    }
}
