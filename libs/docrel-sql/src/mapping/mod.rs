// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The declarative mapping from document collections to tables.
//!
//! A mapping is read from JSON into a [`RawMapping`], and then validated once into a
//! [`Mapping`], which is immutable afterwards.

mod collection;
mod error;
mod field_spec;
mod namespace;
mod raw;

use std::{
    collections::{HashMap, HashSet, VecDeque},
    path::Path,
};

use indexmap::IndexMap;
use serde_json::Value;

pub use collection::Collection;
pub use error::ConfigurationError;
pub use field_spec::FieldSpec;
pub use namespace::{InvalidNamespace, Namespace};
pub use raw::{RawCollection, RawField, RawMapping};

/// The system column holding the time a document was created
pub const CREATION_TIMESTAMP_COLUMN: &str = "creation_timestamp";

#[derive(Debug, Clone)]
pub struct Mapping {
    databases: IndexMap<String, IndexMap<String, Collection>>,
}

/// Names of the array fields present (and non-empty) in a document
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ArrayFields<'a> {
    pub documents: Vec<&'a str>,
    pub scalars: Vec<&'a str>,
}

impl Mapping {
    pub fn load(mut raw: RawMapping) -> Result<Mapping, ConfigurationError> {
        raw.prepare();

        let mut table_owners: HashMap<&str, &str> = HashMap::new();
        let mut databases = IndexMap::new();

        for (database, raw_collections) in raw.databases.iter() {
            let mut collections = IndexMap::new();
            let mut links: HashMap<(String, String), String> = HashMap::new();

            for (name, raw_collection) in raw_collections.iter() {
                if let Some(first) = table_owners.insert(name, database) {
                    return Err(ConfigurationError::DuplicateTable {
                        table: name.clone(),
                        first: format!("{first}.{name}"),
                        second: format!("{database}.{name}"),
                    });
                }

                let primary_key = raw_collection
                    .pk
                    .clone()
                    .filter(|pk| !pk.is_empty())
                    .ok_or_else(|| ConfigurationError::MissingPrimaryKey {
                        database: database.clone(),
                        collection: name.clone(),
                    })?;

                let mut columns: HashMap<&str, &str> = HashMap::new();
                let mut tables: HashMap<&str, &str> = HashMap::new();
                let mut fields = IndexMap::new();

                for (field, raw_field) in raw_collection.fields.iter() {
                    let spec = FieldSpec::from_raw(name, field, raw_field)?;

                    if !spec.is_array() && spec.dest() == CREATION_TIMESTAMP_COLUMN {
                        return Err(ConfigurationError::ReservedColumn {
                            collection: name.clone(),
                            field: field.clone(),
                            dest: spec.dest().to_string(),
                        });
                    }

                    if spec.is_array() && !raw_collections.contains_key(spec.dest()) {
                        return Err(ConfigurationError::UndefinedTarget {
                            database: database.clone(),
                            collection: name.clone(),
                            field: field.clone(),
                            target: spec.dest().to_string(),
                        });
                    }

                    let dest = raw_field.dest.as_deref().unwrap_or(field);
                    let destinations = if spec.is_array() {
                        &mut tables
                    } else {
                        &mut columns
                    };
                    if let Some(first) = destinations.insert(dest, field) {
                        return Err(ConfigurationError::DuplicateDestination {
                            collection: name.clone(),
                            first: first.to_string(),
                            second: field.clone(),
                            dest: dest.to_string(),
                        });
                    }

                    if let Some(foreign_key) = spec.foreign_key_column() {
                        let link = (spec.dest().to_string(), foreign_key.to_string());
                        if let Some(first) = links.get(&link) {
                            return Err(ConfigurationError::ConflictingLink {
                                table: link.0,
                                column: link.1,
                                first: first.clone(),
                                second: name.clone(),
                            });
                        }
                        links.insert(link, name.clone());
                    }

                    fields.insert(field.clone(), spec);
                }

                collections.insert(
                    name.clone(),
                    Collection {
                        name: name.clone(),
                        primary_key,
                        fields,
                        extra_indices: raw_collection.indices.clone(),
                    },
                );
            }

            databases.insert(database.clone(), collections);
        }

        Ok(Mapping { databases })
    }

    pub fn from_json(json: &str) -> Result<Mapping, ConfigurationError> {
        Self::load(RawMapping::from_json(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Mapping, ConfigurationError> {
        let file = std::fs::File::open(path).map_err(|source| ConfigurationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load(RawMapping::from_reader(std::io::BufReader::new(file))?)
    }

    /// All collections along with their database, in mapping order
    pub fn collections(&self) -> impl Iterator<Item = (&str, &Collection)> {
        self.databases.iter().flat_map(|(database, collections)| {
            collections
                .values()
                .map(move |collection| (database.as_str(), collection))
        })
    }

    pub fn collection(&self, database: &str, collection: &str) -> Option<&Collection> {
        self.databases.get(database)?.get(collection)
    }

    pub fn namespace_collection(&self, namespace: &Namespace) -> Option<&Collection> {
        self.collection(&namespace.database, &namespace.collection)
    }

    pub fn resolve_primary_key(&self, database: &str, collection: &str) -> Option<&str> {
        self.collection(database, collection)
            .map(|collection| collection.primary_key.as_str())
    }

    pub fn is_mapped(&self, namespace: &Namespace) -> bool {
        self.namespace_collection(namespace).is_some()
    }

    /// The array fields of `collection` that are present in `document` with at least one element
    pub fn enumerate_array_fields<'a>(
        &'a self,
        database: &str,
        collection: &str,
        document: &Value,
    ) -> ArrayFields<'a> {
        let mut array_fields = ArrayFields::default();

        let Some(collection) = self.collection(database, collection) else {
            return array_fields;
        };

        for (path, spec) in collection.array_fields() {
            let present = matches!(
                lookup_path(document, path),
                Some(Value::Array(elements)) if !elements.is_empty()
            );

            if present {
                match spec {
                    FieldSpec::ArrayOfScalars { .. } => array_fields.scalars.push(path),
                    _ => array_fields.documents.push(path),
                }
            }
        }

        array_fields
    }

    /// Tables reachable from `collection` through array fields, transitively. The collection's own
    /// table is not included.
    pub fn child_tables(&self, database: &str, collection: &str) -> Vec<&str> {
        let mut visited: HashSet<&str> = HashSet::from([collection]);
        let mut queue = VecDeque::from([collection]);
        let mut children = vec![];

        while let Some(current) = queue.pop_front() {
            let Some(current) = self.collection(database, current) else {
                continue;
            };

            for (_, spec) in current.array_fields() {
                let table = spec.dest();
                if visited.insert(table) {
                    children.push(table);
                    queue.push_back(table);
                }
            }
        }

        children
    }
}

/// Look up a field by its path. A path with dots (`a.b.c`) walks through nested objects, unless
/// the document has a field literally named after the full path.
pub fn lookup_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    if let Some(value) = document.get(path) {
        return Some(value);
    }

    path.split('.')
        .try_fold(document, |current, segment| current.get(segment))
}
