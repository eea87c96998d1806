// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, NaiveDateTime};
use serde_json::{Map, Value};

use crate::sql::SqlValue;

/// Convert a document value mapped to a scalar column. Extended JSON wrappers (`{"$oid": ...}`,
/// `{"$date": ...}`, `{"$numberLong": ...}` etc.) are unwrapped; any other object or array is
/// kept as JSON.
pub fn scalar_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Int(i),
            None if n.is_u64() => SqlValue::Numeric(n.to_string()),
            None => SqlValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Object(object) => {
            extended_value(object).unwrap_or_else(|| SqlValue::Json(value.clone()))
        }
        Value::Array(_) => SqlValue::Json(value.clone()),
    }
}

fn extended_value(object: &Map<String, Value>) -> Option<SqlValue> {
    if object.len() != 1 {
        return None;
    }
    let (key, inner) = object.iter().next()?;

    match (key.as_str(), inner) {
        ("$oid", Value::String(hex)) => Some(SqlValue::Text(hex.clone())),
        ("$date", inner) => date_value(inner).map(SqlValue::Timestamp),
        ("$numberLong" | "$numberInt", Value::String(s)) => Some(
            s.trim()
                .parse()
                .map(SqlValue::Int)
                .unwrap_or_else(|_| SqlValue::Text(s.clone())),
        ),
        ("$numberDouble", Value::String(s)) => Some(
            s.trim()
                .parse()
                .map(SqlValue::Float)
                .unwrap_or_else(|_| SqlValue::Text(s.clone())),
        ),
        ("$numberDecimal", Value::String(s)) => Some(SqlValue::Text(s.clone())),
        _ => None,
    }
}

/// `$date` holds either an RFC 3339 string or milliseconds since the epoch (possibly wrapped in
/// `$numberLong`)
fn date_value(value: &Value) -> Option<NaiveDateTime> {
    let millis = match value {
        Value::String(s) => {
            return DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|date| date.naive_utc());
        }
        Value::Number(n) => n.as_i64()?,
        Value::Object(object) => object.get("$numberLong")?.as_str()?.trim().parse().ok()?,
        _ => return None,
    };

    DateTime::from_timestamp_millis(millis).map(|date| date.naive_utc())
}

/// The creation time encoded in an ObjectId (a 24 digit hex string, possibly wrapped in `$oid`):
/// its first four bytes are the big-endian seconds since the epoch.
pub fn object_id_timestamp(value: &Value) -> Option<NaiveDateTime> {
    let hex = match value {
        Value::String(s) => s.as_str(),
        Value::Object(object) if object.len() == 1 => object.get("$oid")?.as_str()?,
        _ => return None,
    };

    if hex.len() != 24 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let seconds = u32::from_str_radix(&hex[..8], 16).ok()?;
    DateTime::from_timestamp(i64::from(seconds), 0).map(|date| date.naive_utc())
}
