// src/error.rs
//! Error types, one enum per failure family.
//!
//! - `FetchError` / `ExtractionError` are per-page or per-item: the run logs them,
//!   skips the affected page or item, and keeps going.
//! - `StoreError` is fatal for the run: a header extended in memory but never
//!   persisted cannot be recovered, so the controller stops at the first one.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Table I/O and table-shape failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("table not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing the temp file succeeded but swapping it into place did not.
    #[error("could not replace '{path}': {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported table encoding '{0}'")]
    UnknownEncoding(String),

    #[error("table '{0}' has no header row")]
    EmptyHeader(PathBuf),

    /// Header cells after the key column must come in whole slot groups.
    #[error("header has {width} cells, not 1 + a multiple of the slot width {slot}")]
    HeaderWidth { width: usize, slot: usize },

    /// Header has the key column but no run group to write into.
    #[error("header has {width} cells, no run of slot width {slot} is open")]
    NoOpenRun { width: usize, slot: usize },

    #[error("row '{key}' has {width} cells but the header only has {header}")]
    RowTooWide { key: String, width: usize, header: usize },

    #[error("key '{key}' appears in more than one row")]
    DuplicateKey { key: String },

    #[error("row '{key}' carries {actual} metrics, expected {expected}")]
    SlotWidth { key: String, expected: usize, actual: usize },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io { path: path.into(), source }
    }
}

/// Network or markup failure for one page or item.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {code} for {url}")]
    Status { url: String, code: u16 },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("could not read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: io::Error,
    },

    /// The page came back but the expected structure was not there.
    #[error("{what} not found on {url}")]
    Markup { url: String, what: &'static str },

    #[error("page {page} is outside the listing (1..={count})")]
    PageOutOfRange { page: u32, count: u32 },
}

/// A listing item whose key or metric could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("item has no {what}")]
    MissingKey { what: &'static str },

    #[error("{key}: {what} not found")]
    MissingMetric { key: String, what: &'static str },
}

/// Reasons a whole run stops.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Without a page count there is nothing to schedule.
    #[error("could not discover listing pages: {0}")]
    Listing(#[source] FetchError),
}
