// src/specs/mod.rs
//! # Page specs
//!
//! Pure HTML parsing for the listing and detail pages, one file per entity
//! category. Each parser knows *where* a key and its metrics live in the markup
//! and nothing else: no fetching, no table I/O, no logging.
//!
//! ## Call chain
//! ```text
//! run::RunController ← scrape::collect ← scrape::SiteSource ← specs::<category>
//!                                          (fetches pages)    (parses them)
//! ```
//!
//! ## Conventions
//! - Per-item results are `Result<Observation, ExtractionError>`; the caller
//!   drops the failures (counted as skipped) so the merge only ever sees
//!   well-formed `(key, metrics[W])` rows.
//! - Counters that are simply absent on an item default to `"0"`; a missing
//!   *key* or a missing detail metric is an extraction failure.
//! - Selectors match class *tokens*, tolerant of attribute order, quoting and case.
//!
//! ## Testing notes
//! Parsers are tested offline against small inline fixtures shaped like the
//! live markup.
pub mod authors;
pub mod courses;
pub mod navigation;
pub mod threads;
