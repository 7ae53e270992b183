// src/run.rs
//! Run controller: the single writer for one table during one run.
//!
//! Batches arrive one at a time (one per fetched listing page, in whatever
//! order the fetches finish). The first batch decides how the run starts:
//!
//! ```text
//! table missing            → create(header ["", stamp, ...], batch)
//! NewRun, table present    → load → begin_new_run → merge → save
//! Resume, table present    → load → merge → save          (no new header group)
//! every later batch        → merge → save
//! ```
//!
//! The loaded snapshot stays in memory between batches; every batch still
//! ends in a full save, so a crash between batches loses at most the batch
//! in flight.

use tracing::{debug, info};

use crate::config::RunMode;
use crate::error::StoreError;
use crate::table::{begin_new_run, merge, BatchReport, Observation, Table, TableStore};

pub struct RunController {
    store: TableStore,
    table_id: String,
    width: usize,
    stamp: String,
    mode: RunMode,
    snapshot: Option<Table>,
    stats: BatchReport,
    batches: usize,
}

/// Totals for a finished (or aborted) run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunTotals {
    pub stamp: String,
    pub batches: usize,
    pub rows: usize,
    pub stats: BatchReport,
}

impl RunController {
    pub fn new(
        store: TableStore,
        table_id: impl Into<String>,
        width: usize,
        stamp: impl Into<String>,
        mode: RunMode,
    ) -> Self {
        Self {
            store,
            table_id: table_id.into(),
            width,
            stamp: stamp.into(),
            mode,
            snapshot: None,
            stats: BatchReport::default(),
            batches: 0,
        }
    }

    /// True until the first batch has been persisted.
    pub fn is_first_batch(&self) -> bool {
        self.snapshot.is_none()
    }

    pub fn stamp(&self) -> &str { &self.stamp }

    /// Current snapshot, once the first batch went through.
    pub fn table(&self) -> Option<&Table> { self.snapshot.as_ref() }

    /// Merge one batch and persist the whole table.
    ///
    /// Any error is fatal for the run; the table on disk is still the one
    /// written by the previous successful call.
    pub fn accept(&mut self, batch: Vec<Observation>) -> Result<BatchReport, StoreError> {
        let report = match self.snapshot.as_mut() {
            Some(table) => {
                let report = merge(table, batch, self.width)?;
                self.store.save(&self.table_id, table)?;
                report
            }
            None => {
                let (table, report) = self.open(batch)?;
                self.snapshot = Some(table);
                report
            }
        };

        self.batches += 1;
        self.stats += report;
        debug!(
            table = %self.table_id,
            batch = self.batches,
            filled = report.filled,
            appended = report.appended,
            backfilled = report.backfilled,
            unchanged = report.unchanged,
            "batch merged"
        );
        Ok(report)
    }

    pub fn finish(self) -> RunTotals {
        RunTotals {
            rows: self.snapshot.as_ref().map_or(0, Table::len),
            stamp: self.stamp,
            batches: self.batches,
            stats: self.stats,
        }
    }

    fn open(&self, batch: Vec<Observation>) -> Result<(Table, BatchReport), StoreError> {
        if !self.store.exists(&self.table_id) {
            let observed = batch.len();
            let table = self.store.create(&self.table_id, self.width, &self.stamp, batch)?;
            info!(table = %self.table_id, run = %self.stamp, path = %self.store.path(&self.table_id).display(), "table created");
            let report = BatchReport {
                appended: table.len(),
                unchanged: observed - table.len(),
                ..Default::default()
            };
            return Ok((table, report));
        }

        let mut table = self.store.load(&self.table_id)?;
        let width = table.header_width();
        if width == 0 || (width - 1) % self.width != 0 {
            return Err(StoreError::HeaderWidth { width, slot: self.width });
        }

        match self.mode {
            RunMode::NewRun => {
                table = begin_new_run(table, self.width, &self.stamp);
                info!(table = %self.table_id, run = %self.stamp, runs = table.run_stamps(self.width).len(), "run opened");
            }
            RunMode::Resume if width < 1 + self.width => {
                return Err(StoreError::NoOpenRun { width, slot: self.width });
            }
            RunMode::Resume => {
                let open = table.run_stamps(self.width).last().map(|s| s.to_string()).unwrap_or_default();
                info!(table = %self.table_id, run = %open, "resuming open run");
            }
        }

        let report = merge(&mut table, batch, self.width)?;
        self.store.save(&self.table_id, &table)?;
        Ok((table, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(key: &str, v: &str) -> Observation {
        Observation::new(key, cells![v])
    }

    #[test]
    fn first_batch_flag_flips_after_one_accept() {
        let dir = tempfile::tempdir().unwrap();
        let mut run = RunController::new(TableStore::new(dir.path()), "courses", 1, "T1", RunMode::NewRun);
        assert!(run.is_first_batch());
        run.accept(vec![obs("k1", "10")]).unwrap();
        assert!(!run.is_first_batch());
    }

    #[test]
    fn header_extended_once_per_run_across_batches() {
        let dir = tempfile::tempdir().unwrap();
        let store = TableStore::new(dir.path());
        store.create("courses", 1, "T1", vec![obs("a", "1"), obs("b", "2")]).unwrap();

        let mut run = RunController::new(store.clone(), "courses", 1, "T2", RunMode::NewRun);
        run.accept(vec![obs("a", "3")]).unwrap();
        run.accept(vec![obs("b", "4")]).unwrap();
        run.accept(vec![]).unwrap();

        assert_eq!(store.header("courses").unwrap(), cells!["", "T1", "T2"]);
        let t = store.load("courses").unwrap();
        assert_eq!(t.get("a"), Some(&cells!["a", "1", "3"][..]));
        assert_eq!(t.get("b"), Some(&cells!["b", "2", "4"][..]));

        let totals = run.finish();
        assert_eq!(totals.batches, 3);
        assert_eq!(totals.stats.filled, 2);
    }

    #[test]
    fn resume_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = TableStore::new(dir.path());
        let mut run = RunController::new(store.clone(), "courses", 1, "T1", RunMode::NewRun);
        run.accept(vec![obs("a", "1")]).unwrap();

        let mut resumed = RunController::new(store.clone(), "courses", 1, "ignored", RunMode::Resume);
        resumed.accept(vec![obs("b", "2")]).unwrap();
        assert_eq!(store.header("courses").unwrap(), cells!["", "T1"]);
        assert_eq!(store.load("courses").unwrap().len(), 2);
    }

    #[test]
    fn resume_on_header_only_table_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = TableStore::new(dir.path());
        std::fs::write(store.path("authors"), "\"\"\n").unwrap();

        let mut run = RunController::new(store.clone(), "authors", 2, "T1", RunMode::Resume);
        let err = run.accept(vec![Observation::new("a", cells!["1", "2"])]).unwrap_err();
        assert!(matches!(err, StoreError::NoOpenRun { width: 1, slot: 2 }));

        // Untouched, and still loadable.
        assert_eq!(std::fs::read_to_string(store.path("authors")).unwrap(), "\"\"\n");
        assert!(store.load("authors").unwrap().is_empty());
    }

    #[test]
    fn new_run_on_header_only_table_opens_first_group() {
        let dir = tempfile::tempdir().unwrap();
        let store = TableStore::new(dir.path());
        std::fs::write(store.path("authors"), "\"\"\n").unwrap();

        let mut run = RunController::new(store.clone(), "authors", 2, "T1", RunMode::NewRun);
        run.accept(vec![Observation::new("a", cells!["1", "2"])]).unwrap();
        assert_eq!(std::fs::read_to_string(store.path("authors")).unwrap(), ",T1,\na,1,2\n");
    }

    #[test]
    fn mismatched_slot_width_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = TableStore::new(dir.path());
        // Written with one metric per run: header ["", "T1"].
        store.create("authors", 1, "T1", vec![obs("a", "1")]).unwrap();

        let mut run = RunController::new(store, "authors", 2, "T2", RunMode::NewRun);
        let err = run.accept(vec![]).unwrap_err();
        assert!(matches!(err, StoreError::HeaderWidth { width: 2, slot: 2 }));
    }
}
