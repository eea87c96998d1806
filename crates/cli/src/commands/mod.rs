// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

pub(crate) mod command;
pub(crate) mod load;
pub(crate) mod remove;
pub(crate) mod schema;
pub(crate) mod upsert;

use anyhow::Result;
use clap::ArgMatches;
use docrel_sql::{mapping::Namespace, sync::Outcome};

use command::get_required;

fn namespace_value(matches: &ArgMatches) -> Result<Namespace> {
    let namespace: String = get_required(matches, "namespace")?;
    Ok(namespace.parse::<Namespace>()?)
}

fn report(outcome: Outcome, namespace: &Namespace) {
    match outcome {
        Outcome::Skipped => println!("Nothing to do for {namespace}"),
        Outcome::Applied { documents } => println!("{documents} documents of {namespace} applied"),
    }
}
