// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{
    fs::File,
    io::{BufRead, BufReader, Lines, Write, stdout},
    iter::Enumerate,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde_json::Value;

pub fn open_file_for_output(output: Option<&Path>) -> Result<Box<dyn Write + Send>> {
    match output {
        Some(output) => Ok(Box::new(File::create(output).with_context(|| {
            format!("Unable to create `{}`", output.display())
        })?)),
        None => Ok(Box::new(stdout())),
    }
}

pub fn read_document(path: &Path) -> Result<Value> {
    let file = File::open(path).with_context(|| format!("Unable to open `{}`", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("`{}` is not valid JSON", path.display()))
}

/// Documents of a newline-delimited JSON file, read one line at a time. Blank lines are
/// ignored.
///
/// Iteration stops at the first line that cannot be read or parsed. Its error is returned by
/// [`DocumentReader::finish`].
pub struct DocumentReader {
    path: PathBuf,
    lines: Enumerate<Lines<BufReader<File>>>,
    error: Option<anyhow::Error>,
}

impl DocumentReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Unable to open `{}`", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines().enumerate(),
            error: None,
        })
    }

    pub fn finish(self) -> Result<()> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Iterator for DocumentReader {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        while self.error.is_none() {
            let (index, line) = self.lines.next()?;
            let location = || format!("{}:{}", self.path.display(), index + 1);

            let error = match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => match serde_json::from_str(&line) {
                    Ok(document) => return Some(document),
                    Err(e) => anyhow::Error::new(e).context(format!("Invalid JSON at {}", location())),
                },
                Err(e) => anyhow::Error::new(e).context(format!("Unable to read {}", location())),
            };
            self.error = Some(error);
        }

        None
    }
}

/// A document id given on the command line: JSON if it parses (`42`, `{"$oid": "..."}`),
/// otherwise the plain string.
pub fn parse_document_id(id: &str) -> Value {
    serde_json::from_str(id).unwrap_or_else(|_| Value::String(id.to_string()))
}
