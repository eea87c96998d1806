// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::quote;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub sql_type: String,
    pub is_pk: bool,
    /// Whether the database produces the value (for example, a `SERIAL` primary key)
    pub is_generated: bool,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            is_pk: false,
            is_generated: false,
        }
    }

    /// The type values of this column are stored as. Same as the declared type, except for
    /// the serial pseudo-types, which are stored as integers.
    pub fn cast_type(&self) -> &str {
        storage_type(&self.sql_type)
    }

    pub(super) fn creation_sql(&self) -> String {
        let mut sql = format!("{} {}", quote(&self.name), self.sql_type);
        if self.is_pk {
            sql.push_str(" PRIMARY KEY");
        }
        sql
    }
}

pub fn is_serial(sql_type: &str) -> bool {
    storage_type(sql_type) != sql_type
}

fn storage_type(sql_type: &str) -> &str {
    match sql_type.to_ascii_uppercase().as_str() {
        "SERIAL" | "SERIAL4" => "INTEGER",
        "BIGSERIAL" | "SERIAL8" => "BIGINT",
        "SMALLSERIAL" | "SERIAL2" => "SMALLINT",
        _ => sql_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_types_are_stored_as_integers() {
        assert_eq!(ColumnSpec::new("id", "SERIAL").cast_type(), "INTEGER");
        assert_eq!(ColumnSpec::new("id", "bigserial").cast_type(), "BIGINT");
        assert_eq!(ColumnSpec::new("id", "SMALLSERIAL").cast_type(), "SMALLINT");
        assert_eq!(ColumnSpec::new("id", "TEXT").cast_type(), "TEXT");

        assert!(is_serial("serial"));
        assert!(!is_serial("INTEGER"));
    }

    #[test]
    fn column_definition() {
        let mut column = ColumnSpec::new("_id", "TEXT");
        assert_eq!(column.creation_sql(), r#""_id" TEXT"#);

        column.is_pk = true;
        assert_eq!(column.creation_sql(), r#""_id" TEXT PRIMARY KEY"#);
    }
}
