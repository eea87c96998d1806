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
use docrel_sql::{Binding, DatabaseError, SqlStatement, TransactionExecutor, sync::Replicator};

use crate::{
    commands::command::{CommandDefinition, common_args, flag_arg, get_required, namespace_arg},
    config,
    util::read_document,
};

use super::{namespace_value, report};

pub(crate) struct UpsertCommandDefinition {}

#[async_trait]
impl CommandDefinition for UpsertCommandDefinition {
    fn command(&self) -> Command {
        Command::new("upsert")
            .about("Replace the rows of a single document")
            .args(common_args())
            .arg(namespace_arg())
            .arg(
                Arg::new("document")
                    .help("A JSON file holding the document.")
                    .required(true)
                    .value_parser(clap::value_parser!(PathBuf))
                    .index(2),
            )
            .arg(flag_arg(
                "print",
                "Print the statements instead of executing them. No database connection is made.",
            ))
    }

    async fn execute(&self, matches: &ArgMatches, env: Arc<dyn Environment>) -> Result<()> {
        let config = config::sync_config(matches, env)?;
        let namespace = namespace_value(matches)?;
        let path: PathBuf = get_required(matches, "document")?;
        let document = read_document(&path)?;

        if matches.get_flag("print") {
            let mapping = config::load_mapping(&config)?;
            let mut replicator =
                Replicator::new(PrintExecutor, Arc::new(mapping), config.chunk_size)
                    .with_binding(Binding::Inline);
            replicator.upsert(&document, &namespace).await?;
            return Ok(());
        }

        let mut replicator = config::connect(&config).await?;
        let outcome = replicator.upsert(&document, &namespace).await?;
        report(outcome, &namespace);

        Ok(())
    }
}

/// Writes each transaction to stdout instead of executing it.
struct PrintExecutor;

#[async_trait]
impl TransactionExecutor for PrintExecutor {
    async fn execute_transaction(
        &mut self,
        statements: &[SqlStatement],
    ) -> Result<(), DatabaseError> {
        println!("BEGIN;");
        for statement in statements {
            println!("{statement};");
        }
        println!("COMMIT;");
        Ok(())
    }
}
