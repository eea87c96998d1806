// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Flattening of nested documents into rows.

mod normalizer;
mod row_forest;
mod value;

use thiserror::Error;

use crate::mapping::Namespace;

pub use normalizer::Normalizer;
pub use row_forest::{NodeId, RowForest, RowNode, RowValue};
pub use value::{object_id_timestamp, scalar_value};

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Namespace '{0}' is not mapped")]
    Unmapped(Namespace),

    #[error("Expected a document of '{namespace}', found {found}")]
    NotADocument {
        namespace: Namespace,
        found: &'static str,
    },
}
