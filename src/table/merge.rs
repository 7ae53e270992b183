// src/table/merge.rs
use std::ops::AddAssign;

use crate::error::StoreError;

use super::{Observation, Table};

/// What one merge did to the snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Existing rows whose current-run slot was filled.
    pub filled: usize,
    /// New keys appended at natural width (first run of the table).
    pub appended: usize,
    /// New keys appended with blank slots for the runs they missed.
    pub backfilled: usize,
    /// Observations left alone: slot already filled, or row not at the fill boundary.
    pub unchanged: usize,
}

impl BatchReport {
    pub fn touched(&self) -> usize {
        self.filled + self.appended + self.backfilled
    }
}

impl AddAssign for BatchReport {
    fn add_assign(&mut self, rhs: Self) {
        self.filled += rhs.filled;
        self.appended += rhs.appended;
        self.backfilled += rhs.backfilled;
        self.unchanged += rhs.unchanged;
    }
}

/// Merge one batch of current-run observations into `table`, in batch order.
///
/// For each observation:
/// - known key whose row is exactly one slot short of the header: append the metrics;
/// - known key otherwise: leave the row alone (duplicate within the run);
/// - new key: append it, padding blanks between key and metrics when the
///   header already covers earlier runs.
///
/// Every observation must carry exactly `width` metrics, and the header must
/// already hold at least one run. Both are checked before the table is
/// touched, so a rejected batch leaves it unchanged.
pub fn merge(table: &mut Table, batch: Vec<Observation>, width: usize) -> Result<BatchReport, StoreError> {
    let header_width = table.header_width();
    if header_width < 1 + width {
        return Err(StoreError::NoOpenRun { width: header_width, slot: width });
    }
    if let Some(bad) = batch.iter().find(|o| o.metrics.len() != width) {
        return Err(StoreError::SlotWidth {
            key: bad.key.clone(),
            expected: width,
            actual: bad.metrics.len(),
        });
    }

    let fill_boundary = header_width - width;
    let mut report = BatchReport::default();

    for obs in batch {
        if let Some(row) = table.row_mut(&obs.key) {
            if row.len() == fill_boundary {
                row.extend(obs.metrics);
                report.filled += 1;
            } else {
                report.unchanged += 1;
            }
            continue;
        }

        let natural = 1 + obs.metrics.len();
        if natural == header_width {
            table.push_row(obs.into_row());
            report.appended += 1;
        } else {
            let pad = header_width - natural;
            let mut row = Vec::with_capacity(header_width);
            row.push(obs.key);
            row.extend(std::iter::repeat_with(String::new).take(pad));
            row.extend(obs.metrics);
            table.push_row(row);
            report.backfilled += 1;
        }
    }

    Ok(report)
}
