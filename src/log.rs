// src/log.rs
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt::time::Uptime;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::EnvFilter;

use crate::config::consts::LOG_FILE;

/// Install the global subscriber: stderr, plus `<dir>/debug.log` when it can
/// be opened. `RUST_LOG` overrides the level picked by `verbose`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(verbose: bool, dir: &Path) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let file = fs::create_dir_all(dir)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(dir.join(LOG_FILE)));

    let writer = match file {
        Ok(file) => BoxMakeWriter::new(std::io::stderr.and(Mutex::new(file))),
        Err(_) => BoxMakeWriter::new(std::io::stderr),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(Uptime::default())
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .try_init();
}
