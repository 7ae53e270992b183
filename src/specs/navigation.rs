// src/specs/navigation.rs
use crate::core::html::{find_all, find_first, text};

/// Page count from a pager block: the second-to-last link is the last page
/// number (the last one is "next").
fn count_from_pager(pager: &str) -> Option<u32> {
    let links = find_all(pager, "a", "");
    let n = links.len();
    if n < 2 {
        return None;
    }
    text(links[n - 2]).parse().ok()
}

/// Listing pages of the course catalog and author directory (`div.navigation`).
pub fn listing_page_count(doc: &str) -> Option<u32> {
    find_first(doc, "div", "navigation").and_then(count_from_pager)
}

/// Pages of one forum section (`div.PageNav nav`). Sections without a pager
/// have a single page.
pub fn section_page_count(doc: &str) -> u32 {
    find_first(doc, "div", "PageNav")
        .and_then(|nav_div| find_first(nav_div, "nav", ""))
        .and_then(count_from_pager)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_count_is_second_to_last_link() {
        let doc = r#"
            <div class="navigation">
              <a href="?PAGEN_1=1">1</a><a href="?PAGEN_1=2">2</a>
              <span>…</span><a href="?PAGEN_1=37">37</a><a href="?PAGEN_1=2">Next</a>
            </div>"#;
        assert_eq!(listing_page_count(doc), Some(37));
    }

    #[test]
    fn listing_without_pager_is_none() {
        assert_eq!(listing_page_count("<div class=\"content\"></div>"), None);
    }

    #[test]
    fn section_defaults_to_one_page() {
        assert_eq!(section_page_count("<ol class=\"discussionListItems\"></ol>"), 1);
        let doc = r#"<div class="PageNav" data-last="4"><nav>
            <a href="page-1">1</a><a href="page-2">2</a><a href="page-4">4</a><a class="text">Next &gt;</a>
        </nav></div>"#;
        assert_eq!(section_page_count(doc), 4);
    }
}
