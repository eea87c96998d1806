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
use docrel_env::SystemEnvironment;

use commands::{
    command::{CommandDefinition, SubcommandDefinition},
    load::LoadCommandDefinition,
    remove::RemoveCommandDefinition,
    schema::SchemaCommandDefinition,
    upsert::UpsertCommandDefinition,
};

mod commands;
mod config;
mod logging;
mod util;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;

    let subcommand_definition = SubcommandDefinition::new(
        "docrel",
        "Replicate document collections into PostgreSQL tables",
        vec![
            Box::new(SchemaCommandDefinition {}),
            Box::new(LoadCommandDefinition {}),
            Box::new(UpsertCommandDefinition {}),
            Box::new(RemoveCommandDefinition {}),
        ],
    );

    let command = subcommand_definition
        .command()
        .version(env!("CARGO_PKG_VERSION"));

    let matches = command.get_matches();

    subcommand_definition
        .execute(&matches, Arc::new(SystemEnvironment))
        .await
}
