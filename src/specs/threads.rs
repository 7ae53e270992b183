// src/specs/threads.rs
//! Forum threads: two metrics per run (participants, views) from the thread
//! lists of every section under one forum category. The thread link path is
//! the key.

use crate::core::html::{attr, contains_class, find_all, find_first, text};
use crate::core::sanitize::counter_or_zero;
use crate::error::ExtractionError;
use crate::table::Observation;

/// Section paths listed under the category `li` carrying `category_class`,
/// in page order, without repeats. `None` when the category block is absent.
pub fn section_paths(doc: &str, category_class: &str) -> Option<Vec<String>> {
    let category = find_first(doc, "li", category_class)?;
    let list = find_first(category, "ol", "nodeList")?;

    let mut out: Vec<String> = Vec::new();
    for li in find_all(list, "li", "") {
        let href = find_first(li, "h3", "nodeTitle")
            .and_then(|h3| find_first(h3, "a", ""))
            .and_then(|a| attr(a, "href"));
        if let Some(href) = href.filter(|h| !h.is_empty()) {
            if !out.contains(&href) {
                out.push(href);
            }
        }
    }
    Some(out)
}

/// `<root>/<section>page-<n>`
pub fn section_page_url(root: &str, section: &str, page: u32) -> String {
    format!("{}/{}page-{}", root.trim_end_matches('/'), section.trim_start_matches('/'), page)
}

/// Non-sticky threads of one section page.
pub fn parse_page(doc: &str) -> Vec<Result<Observation, ExtractionError>> {
    find_all(doc, "li", "discussionListItem")
        .into_iter()
        .filter(|li| !contains_class(li, "sticky"))
        .map(parse_thread)
        .collect()
}

fn parse_thread(li: &str) -> Result<Observation, ExtractionError> {
    let key = find_first(li, "a", "")
        .and_then(|a| attr(a, "href"))
        .filter(|h| !h.is_empty())
        .ok_or(ExtractionError::MissingKey { what: "thread link" })?;

    let stats = find_first(li, "div", "stats");
    let counter = |class: &str| {
        stats
            .and_then(|s| find_first(s, "dl", class))
            .and_then(|dl| find_first(dl, "dd", ""))
            .map(text)
    };
    let participants = counter_or_zero(counter("major"));
    let views = counter_or_zero(counter("minor"));
    Ok(Observation::new(key, vec![participants, views]))
}
