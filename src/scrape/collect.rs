// src/scrape/collect.rs
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::{error, info, warn};

use crate::config::consts::{JITTER_MS, REQUEST_PAUSE_MS};
use crate::config::ScrapeOptions;
use crate::error::{FetchError, RunError};
use crate::progress::Progress;
use crate::run::{RunController, RunTotals};

use super::source::{PageBatch, PageSource, SkippedItem};

/// What a run did, for the end-of-run report.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub pages_total: u32,
    pub pages_merged: usize,
    pub failed_pages: Vec<(u32, String)>,
    pub skipped_items: Vec<SkippedItem>,
    pub totals: RunTotals,
}

/// Fetch pages `start_page..=page_count` on a pool of workers and feed every
/// batch, as it arrives, to `controller` on the calling thread.
///
/// Workers only fetch. The calling thread is the one writer for the table,
/// so merge + save never run concurrently however many workers there are.
/// A failed page is recorded and skipped; a store failure stops the workers
/// and ends the run.
pub fn collect(
    source: &dyn PageSource,
    mut controller: RunController,
    opts: &ScrapeOptions,
    mut progress: Option<&mut dyn Progress>,
) -> Result<RunSummary, RunError> {
    let pages_total = source.page_count().map_err(RunError::Listing)?;
    let pages: Vec<u32> = (opts.start_page.max(1)..=pages_total).collect();
    info!(pages = pages.len(), total = pages_total, start = opts.start_page, "run started");

    if let Some(p) = progress.as_deref_mut() {
        p.begin(pages.len());
    }

    type Fetched = (u32, Result<PageBatch, FetchError>);
    let (res_tx, res_rx) = mpsc::channel::<Fetched>();
    let next = AtomicUsize::new(0);
    let stop = AtomicBool::new(false);
    let workers = opts.worker_count().min(pages.len()).max(1);

    let mut pages_merged = 0usize;
    let mut failed_pages = Vec::new();
    let mut skipped_items = Vec::new();

    let merged = thread::scope(|scope| {
        for _ in 0..workers {
            let tx = res_tx.clone();
            let (pages, next, stop) = (&pages, &next, &stop);
            scope.spawn(move || {
                loop {
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    let Some(&page) = pages.get(i) else { break };
                    let result = source.fetch_page(page);
                    if tx.send((page, result)).is_err() {
                        break;
                    }
                    thread::sleep(polite_pause()); // be polite
                }
            });
        }
        drop(res_tx); // this thread is the sole receiver now

        for (page, result) in res_rx.iter() {
            match result {
                Ok(batch) => {
                    let skipped = batch.skipped.len();
                    skipped_items.extend(batch.skipped);
                    match controller.accept(batch.rows) {
                        Ok(report) => {
                            pages_merged += 1;
                            if let Some(p) = progress.as_deref_mut() {
                                p.page_done(page, &report, skipped);
                            }
                        }
                        Err(e) => {
                            stop.store(true, Ordering::Relaxed);
                            error!(page, error = %e, "table write failed, stopping run");
                            return Err(e);
                        }
                    }
                }
                Err(e) => {
                    warn!(page, error = %e, "page skipped");
                    if let Some(p) = progress.as_deref_mut() {
                        p.page_failed(page, &e.to_string());
                    }
                    failed_pages.push((page, e.to_string()));
                }
            }
        }
        Ok(())
    });

    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }
    merged?;

    if pages_merged == 0 && controller.is_first_batch() {
        warn!("no page could be merged; table left untouched");
    }
    failed_pages.sort_by_key(|(page, _)| *page);

    Ok(RunSummary {
        pages_total,
        pages_merged,
        failed_pages,
        skipped_items,
        totals: controller.finish(),
    })
}

/// Base pause plus a random `0..JITTER_MS`, so workers drift apart.
fn polite_pause() -> Duration {
    let jitter = rand::thread_rng().gen_range(0..JITTER_MS);
    Duration::from_millis(REQUEST_PAUSE_MS + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_stays_within_jitter_window() {
        let lo = Duration::from_millis(REQUEST_PAUSE_MS);
        let hi = Duration::from_millis(REQUEST_PAUSE_MS + JITTER_MS);
        let pauses: Vec<Duration> = (0..200).map(|_| polite_pause()).collect();
        assert!(pauses.iter().all(|p| *p >= lo && *p < hi));
        // Not one fixed value.
        assert!(pauses.iter().any(|p| *p != pauses[0]));
    }
}
