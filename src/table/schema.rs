// src/table/schema.rs
use chrono::Local;

use super::Table;

/// Timestamp written into the header cell that opens a run.
pub fn run_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// `header ++ [timestamp] ++ blanks(width - 1)`.
pub fn extended_header(header: &[String], width: usize, timestamp: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(header.len() + width);
    out.extend_from_slice(header);
    out.push(s!(timestamp));
    out.extend(std::iter::repeat_with(String::new).take(width.saturating_sub(1)));
    out
}

/// Header of a table that does not exist yet: `["", timestamp, blanks(width - 1)]`.
pub fn initial_header(width: usize, timestamp: &str) -> Vec<String> {
    extended_header(&[s!()], width, timestamp)
}

/// Open a new run on `table`: extend the header by one slot group.
///
/// Entity rows are left exactly as they were; their new slot is filled by
/// the merge as batches arrive, never pre-padded here. Call once per run,
/// before the first merge of that run.
pub fn begin_new_run(mut table: Table, width: usize, timestamp: &str) -> Table {
    let header = extended_header(table.header(), width, timestamp);
    table.set_header(header);
    table
}
