// tests/properties.rs
use std::collections::HashSet;

use proptest::prelude::*;

use catalog_scrape::table::{begin_new_run, initial_header, merge, Observation, Table};

const WIDTH: usize = 2;

fn batch_strategy() -> impl Strategy<Value = Vec<Observation>> {
    prop::collection::vec(
        ("k[0-9]{1,2}", prop::collection::vec("[0-9]{1,3}", WIDTH)),
        0..12,
    )
    .prop_map(|items| items.into_iter().map(|(k, m)| Observation::new(k, m)).collect())
}

/// Replay `runs` into a fresh table, one batch per run.
fn replay(runs: &[Vec<Observation>]) -> Table {
    let mut table = Table::with_header(initial_header(WIDTH, "R1"));
    for (i, batch) in runs.iter().enumerate() {
        if i > 0 {
            table = begin_new_run(table, WIDTH, &format!("R{}", i + 1));
        }
        merge(&mut table, batch.clone(), WIDTH).unwrap();
    }
    table
}

proptest! {
    #[test]
    fn merging_a_batch_twice_changes_nothing(
        runs in prop::collection::vec(batch_strategy(), 1..5),
        again in batch_strategy(),
    ) {
        let mut table = replay(&runs);
        merge(&mut table, again.clone(), WIDTH).unwrap();
        let once = table.clone();
        let report = merge(&mut table, again, WIDTH).unwrap();
        prop_assert_eq!(report.touched(), 0);
        prop_assert_eq!(table, once);
    }

    #[test]
    fn rows_never_outgrow_the_header(runs in prop::collection::vec(batch_strategy(), 1..6)) {
        let table = replay(&runs);
        prop_assert_eq!((table.header_width() - 1) % WIDTH, 0);
        for row in table.rows() {
            prop_assert!(row.len() <= table.header_width());
            prop_assert_eq!((row.len() - 1) % WIDTH, 0);
        }
        // Keys seen in every run, and keys new in the last one, reach the last slot.
        let (last, earlier) = runs.split_last().unwrap();
        for obs in last {
            let in_all = earlier.iter().all(|b| b.iter().any(|o| o.key == obs.key));
            let is_new = earlier.iter().flatten().all(|o| o.key != obs.key);
            if in_all || is_new {
                prop_assert_eq!(table.get(&obs.key).unwrap().len(), table.header_width());
            }
        }
    }

    #[test]
    fn keys_stay_unique(runs in prop::collection::vec(batch_strategy(), 1..6)) {
        let table = replay(&runs);
        let mut seen = HashSet::new();
        for row in table.rows() {
            prop_assert!(seen.insert(row[0].clone()), "duplicate key {}", row[0]);
        }
        let observed: HashSet<_> = runs.iter().flatten().map(|o| o.key.clone()).collect();
        prop_assert_eq!(seen, observed);
    }

    #[test]
    fn earlier_runs_are_never_rewritten(
        runs in prop::collection::vec(batch_strategy(), 1..5),
        next in batch_strategy(),
    ) {
        let before = replay(&runs);
        let mut after = begin_new_run(before.clone(), WIDTH, "next");
        merge(&mut after, next, WIDTH).unwrap();

        prop_assert_eq!(&after.header()[..before.header_width()], before.header());
        for row in before.rows() {
            let now = after.get(&row[0]).unwrap();
            prop_assert_eq!(&now[..row.len()], &row[..]);
        }
    }
}
