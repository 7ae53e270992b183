// src/specs/authors.rs
//! Author directory: two metrics per run (views, reviews), read straight from
//! the listing cards. The author's display name is the key.

use crate::core::html::{find_all, find_first, text};
use crate::core::sanitize::counter_or_zero;
use crate::error::ExtractionError;
use crate::table::Observation;

pub fn parse_page(doc: &str) -> Vec<Result<Observation, ExtractionError>> {
    find_all(doc, "div", "author-item_wrap")
        .into_iter()
        .map(parse_card)
        .collect()
}

fn parse_card(card: &str) -> Result<Observation, ExtractionError> {
    let name = find_first(card, "div", "author-item-name")
        .map(text)
        .filter(|n| !n.is_empty())
        .ok_or(ExtractionError::MissingKey { what: "author name" })?;

    // First two <li> of the stat list: views, then reviews.
    let stats: Vec<Option<String>> = find_first(card, "div", "author-item-stat")
        .and_then(|stat| find_first(stat, "ul", ""))
        .map(|ul| {
            find_all(ul, "li", "")
                .into_iter()
                .take(2)
                .map(|li| find_first(li, "span", "").map(text))
                .collect()
        })
        .unwrap_or_default();

    let mut counters = stats.into_iter();
    let views = counter_or_zero(counters.next().flatten());
    let reviews = counter_or_zero(counters.next().flatten());
    Ok(Observation::new(name, vec![views, reviews]))
}
