// src/progress.rs
use crate::table::BatchReport;

/// Progress reporting for a run. Frontends implement this to surface status;
/// every method has a no-op default.
pub trait Progress {
    /// Called once the listing is known, with the number of pages to fetch.
    fn begin(&mut self, _pages: usize) {}

    /// A page's batch was merged and saved.
    fn page_done(&mut self, _page: u32, _report: &BatchReport, _skipped: usize) {}

    /// A page could not be fetched; the run goes on without it.
    fn page_failed(&mut self, _page: u32, _error: &str) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}
