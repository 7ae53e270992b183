// src/config/consts.rs

// Table store
pub const STORE_DIR: &str = "csv";
pub const STORE_SEP: char = ',';
pub const TABLE_EXT: &str = "csv";
pub const LOG_FILE: &str = "debug.log";
/// Encoding label for table files; the deployed tables are cp1251.
pub const TABLE_ENCODING: &str = "windows-1251";

// Listing sites
pub const COURSES_URL: &str = "https://info-hit.ru/catalog";
pub const AUTHORS_URL: &str = "https://info-hit.ru/authors";
pub const THREADS_URL: &str = "https://s107.skladchina.biz";
/// Course detail pages are linked by path only.
pub const DETAIL_HOST: &str = "https://info-hit.ru";
/// Listing pagination query parameter.
pub const PAGE_PARAM: &str = "PAGEN_1";
/// Forum category whose sections hold the tracked threads.
pub const THREADS_CATEGORY_CLASS: &str = "node_46";

// Net
pub const HTTP_TIMEOUT_SECS: u64 = 15;
pub const RETRIES: u32 = 3;
pub const BACKOFF_MS: u64 = 500; // doubles per attempt

// Concurrency
pub const WORKERS: usize = 4;
pub const REQUEST_PAUSE_MS: u64 = 75; // be polite
pub const JITTER_MS: u64 = 50; // random extra 0..50 ms
