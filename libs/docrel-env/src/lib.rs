// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Access to configuration values supplied through environment variables.
//!
//! Code that reads configuration takes a `&dyn Environment` rather than calling `std::env`
//! directly, so tests (and the CLI, for flags that override variables) can supply values
//! through a [`MapEnvironment`].

mod map;

use std::str::FromStr;

pub use map::MapEnvironment;

pub trait Environment: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn get_or_else(&self, key: &str, default_value: &str) -> String {
        self.get(key).unwrap_or(default_value.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("Invalid value for {key}: {value} ({message})")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

/// Parse the value of `key`, falling back to `default_value` if it is not set.
pub fn get_parsed<T>(env: &dyn Environment, key: &str, default_value: T) -> Result<T, EnvError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env.get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| EnvError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
                value,
            }),
        None => Ok(default_value),
    }
}

pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_parsed_reports_bad_values() {
        let env = MapEnvironment::from([("SIZE", " 25 "), ("BAD", "lots")]);

        assert_eq!(get_parsed::<usize>(&env, "SIZE", 100).unwrap(), 25);
        assert_eq!(get_parsed::<usize>(&env, "MISSING", 100).unwrap(), 100);

        let err = get_parsed::<usize>(&env, "BAD", 100).unwrap_err();
        assert!(err.to_string().starts_with("Invalid value for BAD: lots"));
    }

    #[test]
    fn get_or_else_falls_back() {
        let env = MapEnvironment::from([("URL", "postgres://localhost/db")]);

        assert_eq!(env.get_or_else("URL", "unused"), "postgres://localhost/db");
        assert_eq!(env.get_or_else("MISSING", "fallback"), "fallback");
    }
}
