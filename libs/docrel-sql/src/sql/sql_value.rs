// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use chrono::NaiveDateTime;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A literal value destined for a column.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// An integer outside the `i64` range, in its decimal form
    Numeric(String),
    Text(String),
    Timestamp(NaiveDateTime),
    /// Structured data (objects or arrays) mapped to a single column
    Json(serde_json::Value),
}

impl SqlValue {
    /// Encode the value as an SQL literal.
    ///
    /// Strings have Unicode control characters removed and embedded single quotes doubled.
    pub fn to_sql_value(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(true) => "TRUE".to_string(),
            SqlValue::Bool(false) => "FALSE".to_string(),
            SqlValue::Int(value) => value.to_string(),
            SqlValue::Float(value) if value.is_finite() => value.to_string(),
            SqlValue::Float(value) => quote(&non_finite_text(*value)),
            SqlValue::Numeric(value) => value.clone(),
            SqlValue::Text(value) => quote(&remove_control_chars(value)),
            SqlValue::Timestamp(value) => quote(&value.format(TIMESTAMP_FORMAT).to_string()),
            SqlValue::Json(value) => quote(&remove_control_chars(&value.to_string())),
        }
    }

    /// The text form sent as a statement parameter, or `None` for `NULL`.
    ///
    /// Strings lose their control characters, the same as in the literal form.
    pub fn to_param_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Bool(value) => Some(value.to_string()),
            SqlValue::Int(value) => Some(value.to_string()),
            SqlValue::Float(value) if value.is_finite() => Some(value.to_string()),
            SqlValue::Float(value) => Some(non_finite_text(*value)),
            SqlValue::Numeric(value) => Some(value.clone()),
            SqlValue::Text(value) => Some(remove_control_chars(value)),
            SqlValue::Timestamp(value) => Some(value.format(TIMESTAMP_FORMAT).to_string()),
            SqlValue::Json(value) => Some(remove_control_chars(&value.to_string())),
        }
    }
}

impl Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_sql_value())
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn remove_control_chars(s: &str) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}

fn non_finite_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_sign_positive() {
        "Infinity".to_string()
    } else {
        "-Infinity".to_string()
    }
}
