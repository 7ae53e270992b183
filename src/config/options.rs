// src/config/options.rs
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use super::consts::*;
use crate::error::StoreError;
use crate::table::TableStore;

/// Entity categories, one table each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum Category {
    /// Course catalog: weekly views per course (1 metric)
    Courses,
    /// Author directory: views + reviews per author (2 metrics)
    Authors,
    /// Forum threads: participants + views per thread (2 metrics)
    Threads,
}

impl Category {
    /// Metric cells recorded per run (the slot width `W`).
    pub fn width(self) -> usize {
        match self {
            Category::Courses => 1,
            Category::Authors | Category::Threads => 2,
        }
    }

    pub fn default_url(self) -> &'static str {
        match self {
            Category::Courses => COURSES_URL,
            Category::Authors => AUTHORS_URL,
            Category::Threads => THREADS_URL,
        }
    }

    /// File stem of the category's table inside the store directory.
    pub fn table_id(self) -> &'static str {
        match self {
            Category::Courses => "courses",
            Category::Authors => "authors",
            Category::Threads => "threads",
        }
    }
}

/// Whether the first batch opens a new run or continues the open one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    NewRun,
    Resume,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrapeOptions {
    pub category: Category,
    base_url: Option<String>,
    pub start_page: u32,
    pub store_dir: PathBuf,
    /// Encoding label of the table files.
    pub encoding: String,
    pub workers: usize,
}

impl ScrapeOptions {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            base_url: None,
            start_page: 1,
            store_dir: PathBuf::from(STORE_DIR),
            encoding: s!(TABLE_ENCODING),
            workers: WORKERS,
        }
    }

    /// Listing URL, user override or the category default. No trailing `/`.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(self.category.default_url())
            .trim_end_matches('/')
    }

    /// Blank input keeps the default.
    pub fn set_base_url(&mut self, text: &str) {
        let s = text.trim();
        self.base_url = if s.is_empty() { None } else { Some(s!(s)) };
    }

    pub fn with_store_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.store_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Blank input keeps the default.
    pub fn set_encoding(&mut self, label: &str) {
        let l = label.trim();
        self.encoding = if l.is_empty() { s!(TABLE_ENCODING) } else { s!(l) };
    }

    /// Table store for these options; fails on an unknown encoding label.
    pub fn table_store(&self) -> Result<TableStore, StoreError> {
        TableStore::new(&self.store_dir).with_encoding(&self.encoding)
    }

    /// Starting past page 1 continues the run already open in the table.
    pub fn mode(&self) -> RunMode {
        if self.start_page <= 1 { RunMode::NewRun } else { RunMode::Resume }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}
