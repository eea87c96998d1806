// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{fmt::Display, str::FromStr};

use thiserror::Error;

/// A `database.collection` pair identifying the source of a document.
///
/// The string form is split at the first `.`, so the collection part may itself contain dots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid namespace '{0}' (expected 'database.collection')")]
pub struct InvalidNamespace(pub String);

impl FromStr for Namespace {
    type Err = InvalidNamespace;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((database, collection)) if !database.is_empty() && !collection.is_empty() => {
                Ok(Namespace::new(database, collection))
            }
            _ => Err(InvalidNamespace(s.to_string())),
        }
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_at_first_dot() {
        let ns: Namespace = "shop.orders.archive".parse().unwrap();
        assert_eq!(ns.database, "shop");
        assert_eq!(ns.collection, "orders.archive");
        assert_eq!(ns.to_string(), "shop.orders.archive");
    }

    #[test]
    fn rejects_incomplete_namespaces() {
        assert!("shop".parse::<Namespace>().is_err());
        assert!(".orders".parse::<Namespace>().is_err());
        assert!("shop.".parse::<Namespace>().is_err());
    }

    #[test]
    fn invalid_namespace_is_an_error() {
        let error = "shop".parse::<Namespace>().unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid namespace 'shop' (expected 'database.collection')"
        );

        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(error);
        assert!(boxed.source().is_none());
    }
}
