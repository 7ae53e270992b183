// src/scrape/mod.rs
mod collect;
mod source;

pub use collect::{collect, RunSummary};
pub use source::{PageBatch, PageSource, SiteSource, SkippedItem};
