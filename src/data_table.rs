// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Data table support for steps and examples.
//!
//! A [`DataTable`] is a rectangular block of `|`-delimited rows; the first
//! row is the header. Column-count consistency is enforced as rows are
//! pushed, and [`DataTable::hashes()`] converts the body to a sequence of
//! header-keyed maps.

use std::fmt;

use derive_more::{Display, Error};
use itertools::Itertools as _;
use linked_hash_map::LinkedHashMap;

/// A rectangular data table attached to a step or an `Examples:` block.
///
/// # Example
///
/// ```rust
/// use cornichon::DataTable;
///
/// let table = DataTable::from(vec![
///     vec!["name", "age"],
///     vec!["alice", "30"],
/// ]);
///
/// let hashes = table.hashes();
/// assert_eq!(hashes[0].get("name").map(String::as_str), Some("alice"));
/// assert_eq!(hashes[0].get("age").map(String::as_str), Some("30"));
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DataTable {
    rows: Vec<Vec<String>>,
}

/// Error of pushing a row whose column count differs from the header row's.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[display("column count mismatch in data table (expected {expected}, found {found})")]
pub struct ColumnMismatch {
    /// Column count fixed by the first (header) row.
    pub expected: usize,

    /// Column count of the offending row.
    pub found: usize,
}

impl DataTable {
    /// Creates an empty [`DataTable`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits a trimmed `|a|b|c|` source line into its cells.
    ///
    /// The caller guarantees the line starts and ends with `|`; cells are
    /// trimmed of the whitespace padding around their separators.
    #[must_use]
    pub fn parse_row(line: &str) -> Vec<String> {
        let inner = line
            .strip_prefix('|')
            .and_then(|rest| rest.strip_suffix('|'))
            .unwrap_or(line);
        inner.split('|').map(|cell| cell.trim().to_owned()).collect()
    }

    /// Appends a row, validating its column count against the first row's.
    ///
    /// # Errors
    ///
    /// [`ColumnMismatch`] if the table already has a header row and `cells`
    /// has a different width.
    pub fn push(&mut self, cells: Vec<String>) -> Result<(), ColumnMismatch> {
        if let Some(header) = self.rows.first() {
            if header.len() != cells.len() {
                return Err(ColumnMismatch {
                    expected: header.len(),
                    found: cells.len(),
                });
            }
        }
        self.rows.push(cells);
        Ok(())
    }

    /// Returns the raw table data, header row included.
    #[must_use]
    pub fn raw(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Returns the table rows without the header row.
    #[must_use]
    pub fn body(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// Converts the table body to a sequence of maps, keyed by the header
    /// row and preserving column order.
    ///
    /// An empty or header-only table converts to an empty sequence.
    #[must_use]
    pub fn hashes(&self) -> Vec<LinkedHashMap<String, String>> {
        let Some(header) = self.rows.first() else {
            return Vec::new();
        };
        self.body()
            .iter()
            .map(|row| {
                header
                    .iter()
                    .zip(row.iter())
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .collect()
    }

    /// Converts a two-column table (header included) into a single map of
    /// first-column keys to second-column values.
    ///
    /// Returns [`None`] if any row doesn't have exactly two columns.
    #[must_use]
    pub fn rows_hash(&self) -> Option<LinkedHashMap<String, String>> {
        self.rows
            .iter()
            .map(|row| match row.as_slice() {
                [key, value] => Some((key.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }

    /// Number of rows, header included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Indicates whether the table has no rows at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column count fixed by the header row, if any.
    #[must_use]
    pub fn width(&self) -> Option<usize> {
        self.rows.first().map(Vec::len)
    }
}

impl<S: Into<String>> From<Vec<Vec<S>>> for DataTable {
    fn from(rows: Vec<Vec<S>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }
}

impl fmt::Display for DataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .rows
            .iter()
            .map(|row| format!("| {} |", row.iter().join(" | ")))
            .join("\n");
        write!(f, "{rendered}")
    }
}
