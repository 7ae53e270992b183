// src/specs/courses.rs
//! Course catalog: one metric per run, the weekly view count shown on each
//! course's detail page. The key is the detail page path from the listing.

use crate::core::html::{attr, find_all, find_first, text};
use crate::core::sanitize::first_number;
use crate::error::ExtractionError;
use crate::table::Observation;

/// Current and legacy listing layouts, tried in this order.
const ITEM_LAYOUTS: [(&str, &str); 2] = [
    ("catalog__item", "catalog__item__link"),
    ("courses-cards__list__item", "course-card__wrap"),
];

/// Detail page paths listed on one catalog page, in page order.
///
/// Items linking off-site (`away.php` redirects) are dropped; an item with no
/// usable link is an extraction failure.
pub fn listing_links(doc: &str) -> Vec<Result<String, ExtractionError>> {
    for (item_class, _) in ITEM_LAYOUTS {
        let items = find_all(doc, "div", item_class);
        if items.is_empty() {
            continue;
        }
        return items
            .into_iter()
            .map(item_link)
            .filter(|r| !matches!(r, Ok(href) if is_external(href)))
            .collect();
    }
    Vec::new()
}

fn item_link(item: &str) -> Result<String, ExtractionError> {
    ITEM_LAYOUTS
        .iter()
        .find_map(|(_, link_class)| find_first(item, "a", link_class))
        .and_then(|a| attr(a, "href"))
        .filter(|href| !href.is_empty())
        .ok_or(ExtractionError::MissingKey { what: "course link" })
}

pub fn is_external(href: &str) -> bool {
    href.contains("away.php")
}

/// Weekly views from a course detail page (`span.cp-hero__rating-text`).
pub fn weekly_views(doc: &str, key: &str) -> Result<Observation, ExtractionError> {
    let missing = || ExtractionError::MissingMetric { key: s!(key), what: "weekly views" };
    let span = find_first(doc, "span", "cp-hero__rating-text").ok_or_else(missing)?;
    let label = text(span);
    let views = first_number(&label).ok_or_else(missing)?;
    Ok(Observation::new(key, cells![views]))
}
