// src/table/mod.rs
//! # Temporal wide table
//!
//! One table per entity category. Row 0 is the header, every other row is an
//! entity keyed by its first cell.
//!
//! ```text
//!  header:  ""   | T1 | ""  | T2 | ""      (W = 2, two runs)
//!  row:     key  | v1 | v2  | v1 | v2
//!  row:     key2 |    |     | v1 | v2     (first seen in run 2)
//! ```
//!
//! Each run appends one group of `W` header cells (timestamp + `W-1` blanks).
//! Rows only ever grow, by one `W`-wide slot per run they were observed in;
//! earlier runs a key missed are blank-padded when the key first shows up.
//!
//! - `store`  reads and writes the table file.
//! - `schema` opens a new run by extending the header.
//! - `merge`  folds one batch of observations into the in-memory snapshot.

pub mod merge;
pub mod schema;
pub mod store;

use std::collections::HashMap;

use crate::error::StoreError;

pub use merge::{merge, BatchReport};
pub use schema::{begin_new_run, extended_header, initial_header, run_timestamp};
pub use store::TableStore;

/// One observed entity for the current run: key plus exactly `W` metric cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub key: String,
    pub metrics: Vec<String>,
}

impl Observation {
    pub fn new(key: impl Into<String>, metrics: Vec<String>) -> Self {
        Self { key: key.into(), metrics }
    }

    /// `[key, metrics...]`, the row shape of a key seen for the first time in run 1.
    pub fn into_row(self) -> Vec<String> {
        let mut row = Vec::with_capacity(1 + self.metrics.len());
        row.push(self.key);
        row.extend(self.metrics);
        row
    }
}

/// In-memory snapshot of a table plus a key → row index.
///
/// The index is rebuilt on load and never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    index: HashMap<String, usize>,
}

impl Table {
    /// Header only, no entity rows.
    pub fn with_header(header: Vec<String>) -> Self {
        Self { header, rows: Vec::new(), index: HashMap::new() }
    }

    /// Build from a header and parsed entity rows. Rejects rows wider than
    /// the header and repeated keys; no repair is attempted.
    pub fn from_rows<I>(header: Vec<String>, rows: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut table = Self::with_header(header);
        for row in rows {
            let key = row.first().cloned().unwrap_or_default();
            if row.len() > table.header.len() {
                return Err(StoreError::RowTooWide {
                    key,
                    width: row.len(),
                    header: table.header.len(),
                });
            }
            if table.index.contains_key(&key) {
                return Err(StoreError::DuplicateKey { key });
            }
            table.push_row(row);
        }
        Ok(table)
    }

    pub fn header(&self) -> &[String] { &self.header }
    pub fn header_width(&self) -> usize { self.header.len() }

    /// Entity rows in insertion order (header excluded).
    pub fn rows(&self) -> &[Vec<String>] { &self.rows }
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.index.get(key).map(|&i| self.rows[i].as_slice())
    }

    /// Header followed by entity rows, the on-disk row order.
    pub fn all_rows(&self) -> impl Iterator<Item = &Vec<String>> {
        std::iter::once(&self.header).chain(self.rows.iter())
    }

    /// Run timestamps recorded in the header, oldest first.
    pub fn run_stamps(&self, width: usize) -> Vec<&str> {
        self.header
            .iter()
            .skip(1)
            .step_by(width.max(1))
            .map(String::as_str)
            .collect()
    }

    pub(crate) fn set_header(&mut self, header: Vec<String>) {
        self.header = header;
    }

    pub(crate) fn row_mut(&mut self, key: &str) -> Option<&mut Vec<String>> {
        let i = *self.index.get(key)?;
        Some(&mut self.rows[i])
    }

    /// Append a row whose key is not present yet.
    pub(crate) fn push_row(&mut self, row: Vec<String>) {
        let key = row.first().cloned().unwrap_or_default();
        self.index.insert(key, self.rows.len());
        self.rows.push(row);
    }
}
