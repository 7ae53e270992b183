// src/cli.rs
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use crate::config::consts::{STORE_DIR, TABLE_ENCODING, WORKERS};
use crate::config::{Category, ScrapeOptions};
use crate::core::HttpClient;
use crate::progress::Progress;
use crate::run::RunController;
use crate::scrape::{self, RunSummary, SiteSource};
use crate::table::{run_timestamp, BatchReport, Table, TableStore};

pub type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Skipped items listed individually in the end-of-run report.
const SKIPPED_SHOWN: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "catalog_scrape", version, about = "Record per-run catalog metrics into wide CSV tables")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding one table per category
    #[arg(long, global = true, default_value = STORE_DIR)]
    pub store: PathBuf,

    /// Text encoding of the table files (e.g. windows-1251, utf-8)
    #[arg(long, global = true, default_value = TABLE_ENCODING)]
    pub encoding: String,

    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape a category and record one run
    Run {
        category: Category,

        /// Listing page to start from; past 1 continues the open run instead of starting a new one
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        start_page: u32,

        /// Base listing URL (defaults per category)
        #[arg(long, conflicts_with = "prompt")]
        url: Option<String>,

        /// Ask for the base listing URL on stdin; empty input keeps the default
        #[arg(long)]
        prompt: bool,

        #[arg(long, default_value_t = WORKERS)]
        workers: usize,
    },

    /// Show the runs recorded in a category's table
    Status {
        category: Category,

        /// Also load the whole table and validate it
        #[arg(long)]
        check: bool,
    },
}

pub fn run(cli: Cli) -> CliResult<()> {
    crate::log::init(cli.verbose, &cli.store);

    match cli.command {
        Command::Run { category, start_page, url, prompt, workers } => {
            let mut opts = ScrapeOptions::new(category).with_store_dir(&cli.store);
            opts.set_encoding(&cli.encoding);
            opts.start_page = start_page;
            opts.workers = workers;
            if let Some(u) = url {
                opts.set_base_url(&u);
            } else if prompt {
                opts.set_base_url(&prompt_url(category)?);
            }
            scrape_category(&opts)
        }
        Command::Status { category, check } => {
            let store = TableStore::new(&cli.store).with_encoding(&cli.encoding)?;
            status(&store, category, check)
        }
    }
}

fn scrape_category(opts: &ScrapeOptions) -> CliResult<()> {
    let started = Instant::now();
    let category = opts.category;
    let store = opts.table_store()?;
    let controller = RunController::new(
        store,
        category.table_id(),
        category.width(),
        run_timestamp(),
        opts.mode(),
    );
    let source = SiteSource::new(HttpClient::new(), category, opts.base_url());

    let mut progress = CliProgress::default();
    let summary = scrape::collect(&source, controller, opts, Some(&mut progress))?;
    print_summary(&summary, started);
    Ok(())
}

fn prompt_url(category: Category) -> CliResult<String> {
    let mut err = io::stderr();
    write!(
        err,
        "Enter main page url for {} (press Enter to use default '{}'): ",
        category.table_id(),
        category.default_url()
    )?;
    err.flush()?;
    let mut line = s!();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

fn status(store: &TableStore, category: Category, check: bool) -> CliResult<()> {
    let id = category.table_id();
    let header = store.header(id)?;
    let width = category.width();

    println!("{} (W={})", store.path(id).display(), width);
    let table = Table::with_header(header);
    for (i, stamp) in table.run_stamps(width).into_iter().enumerate() {
        println!("  run {:>3}  {}", i + 1, stamp);
    }
    if check {
        let table = store.load(id)?;
        println!("  {} entities, header width {}, ok", table.len(), table.header_width());
    }
    Ok(())
}

fn print_summary(s: &RunSummary, started: Instant) {
    let t = &s.totals;
    println!(
        "Run {}: {}/{} pages merged, {} rows in table",
        t.stamp, s.pages_merged, s.pages_total, t.rows
    );
    println!(
        "  filled {}, new {}, backfilled {}, unchanged {}",
        t.stats.filled, t.stats.appended, t.stats.backfilled, t.stats.unchanged
    );
    if !s.failed_pages.is_empty() {
        println!("  {} pages failed:", s.failed_pages.len());
        for (page, err) in &s.failed_pages {
            println!("    page {page}: {err}");
        }
    }
    if !s.skipped_items.is_empty() {
        println!("  {} items skipped:", s.skipped_items.len());
        for item in s.skipped_items.iter().take(SKIPPED_SHOWN) {
            println!("    page {} item {}: {}", item.page, item.item, item.reason);
        }
        if s.skipped_items.len() > SKIPPED_SHOWN {
            println!("    …and {} more", s.skipped_items.len() - SKIPPED_SHOWN);
        }
    }
    println!("Duration: {:.1?}", started.elapsed());
}

/// Page counter on stderr.
#[derive(Default)]
struct CliProgress {
    total: usize,
    done: usize,
}

impl Progress for CliProgress {
    fn begin(&mut self, pages: usize) {
        self.total = pages;
        eprintln!("{pages} pages to fetch");
    }

    fn page_done(&mut self, page: u32, report: &BatchReport, skipped: usize) {
        self.done += 1;
        eprintln!(
            "[{}/{}] page {page}: {} rows merged, {} skipped",
            self.done, self.total, report.touched(), skipped
        );
    }

    fn page_failed(&mut self, page: u32, error: &str) {
        self.done += 1;
        eprintln!("[{}/{}] page {page} failed: {error}", self.done, self.total);
    }
}
