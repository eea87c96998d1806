// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use clap::{Arg, ArgAction, ArgMatches, Command};
use docrel_env::Environment;

#[async_trait]
pub trait CommandDefinition: Send + Sync {
    fn command(&self) -> Command;

    async fn execute(&self, matches: &ArgMatches, env: Arc<dyn Environment>) -> Result<()>;
}

pub struct SubcommandDefinition {
    pub name: &'static str,
    pub about: &'static str,
    pub command_definitions: Vec<Box<dyn CommandDefinition>>,
}

impl SubcommandDefinition {
    pub fn new(
        name: &'static str,
        about: &'static str,
        command_definitions: Vec<Box<dyn CommandDefinition>>,
    ) -> Self {
        Self {
            name,
            about,
            command_definitions,
        }
    }
}

#[async_trait]
impl CommandDefinition for SubcommandDefinition {
    fn command(&self) -> Command {
        Command::new(self.name)
            .about(self.about)
            .subcommand_required(true)
            .arg_required_else_help(true)
            .disable_help_subcommand(true)
            .subcommands(
                self.command_definitions
                    .iter()
                    .map(|command_definition| command_definition.command()),
            )
    }

    async fn execute(&self, matches: &ArgMatches, env: Arc<dyn Environment>) -> Result<()> {
        let (name, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| anyhow!("A subcommand is required"))?;

        for command_definition in &self.command_definitions {
            if command_definition.command().get_name() == name {
                return command_definition.execute(sub_matches, env).await;
            }
        }

        Err(anyhow!("Unknown subcommand: {}", name))
    }
}

pub fn get_required<T: Clone + Send + Sync + 'static>(
    matches: &ArgMatches,
    arg_id: &str,
) -> Result<T> {
    get(matches, arg_id).ok_or_else(|| anyhow!("Required argument `{}` is not present", arg_id))
}

pub fn get<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, arg_id: &str) -> Option<T> {
    matches.get_one::<T>(arg_id).cloned()
}

/// Flags accepted by every command. Each overrides the corresponding environment variable.
pub fn common_args() -> [Arg; 3] {
    [mappings_arg(), database_arg(), chunk_size_arg()]
}

fn mappings_arg() -> Arg {
    Arg::new("mappings")
        .help("The path to the mapping file. If not specified, `DOCREL_MAPPING_FILE` is used, defaulting to `mappings.json`.")
        .short('m')
        .long("mappings")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .num_args(1)
}

fn database_arg() -> Arg {
    Arg::new("database")
        .help("The PostgreSQL database connection string to use. If not specified, the program will attempt to read it from the environment (`DOCREL_POSTGRES_URL`).")
        .long("database")
        .required(false)
}

fn chunk_size_arg() -> Arg {
    Arg::new("chunk-size")
        .help("Number of documents inserted per transaction during bulk loads (`DOCREL_CHUNK_SIZE`).")
        .long("chunk-size")
        .required(false)
        .value_parser(clap::value_parser!(usize))
        .num_args(1)
}

pub fn namespace_arg() -> Arg {
    Arg::new("namespace")
        .help("The source namespace, in the form `<database>.<collection>`.")
        .required(true)
        .index(1)
}

pub fn output_arg() -> Arg {
    Arg::new("output")
        .help("If specified, the output will be written to this file path instead of stdout.")
        .short('o')
        .long("output")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .num_args(1)
}

pub fn flag_arg(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .help(help)
        .long(id)
        .required(false)
        .action(ArgAction::SetTrue)
}
