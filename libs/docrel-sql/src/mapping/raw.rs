// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The mapping file as written by users, before validation.

use std::io::Read;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::ConfigurationError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawMapping {
    pub databases: IndexMap<String, IndexMap<String, RawCollection>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCollection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indices: Vec<String>,
    #[serde(flatten)]
    pub fields: IndexMap<String, RawField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fk: Option<String>,
    #[serde(
        rename = "valueField",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub value_field: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub index: bool,
}

impl RawMapping {
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Default every field's `dest` to the field's own name.
    pub fn prepare(&mut self) {
        for collections in self.databases.values_mut() {
            for collection in collections.values_mut() {
                for (name, field) in collection.fields.iter_mut() {
                    field.dest.get_or_insert_with(|| name.clone());
                }
            }
        }
    }
}
