// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

macro_rules! assert_params {
    ($actual_params:expr) => {
        assert!($actual_params.is_empty(), "unexpected params: {:?}", $actual_params);
    };
    ($actual_params:expr, $($expected:expr), +) => {
        let expected: Vec<String> = vec![$($expected.to_string()), +];
        assert_eq!($actual_params, expected);
    };
}

macro_rules! assert_binding {
    ($actual:expr, $expected_stmt:expr) => {
        let actual = $actual;
        assert_eq!(actual.sql.as_str(), $expected_stmt);
        assert_params!(actual.params);
    };
    ($actual:expr, $expected_stmt:expr, $($rest:expr), *) => {
        let actual = $actual;
        assert_eq!(actual.sql.as_str(), $expected_stmt);
        assert_params!(actual.params, $($rest), *);
    };
}
