// src/scrape/source.rs
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::consts::{DETAIL_HOST, PAGE_PARAM, REQUEST_PAUSE_MS, THREADS_CATEGORY_CLASS};
use crate::config::Category;
use crate::core::HttpClient;
use crate::error::FetchError;
use crate::specs::{authors, courses, navigation, threads};
use crate::table::Observation;

/// Well-formed rows from one listing page, plus what was dropped on the way.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageBatch {
    pub page: u32,
    pub rows: Vec<Observation>,
    pub skipped: Vec<SkippedItem>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedItem {
    pub page: u32,
    /// 1-based position on the page.
    pub item: usize,
    pub reason: String,
}

impl PageBatch {
    /// Split per-item results into rows and skipped items.
    pub fn from_items<E: Display>(page: u32, items: Vec<Result<Observation, E>>) -> Self {
        let mut batch = PageBatch { page, ..Default::default() };
        for (i, item) in items.into_iter().enumerate() {
            match item {
                Ok(obs) => batch.rows.push(obs),
                Err(e) => {
                    debug!(page, item = i + 1, error = %e, "item skipped");
                    batch.skipped.push(SkippedItem { page, item: i + 1, reason: e.to_string() });
                }
            }
        }
        batch
    }
}

/// Where batches come from. Pages are numbered `1..=page_count()`.
pub trait PageSource: Send + Sync {
    fn page_count(&self) -> Result<u32, FetchError>;
    fn fetch_page(&self, page: u32) -> Result<PageBatch, FetchError>;
}

/// Live listing for one category.
///
/// Forum threads span several sections with their own paging; their pages
/// are flattened section by section into one numbering the first time the
/// listing is discovered. The first page of each section, fetched then to
/// read its pager, is kept and served once instead of being fetched again.
pub struct SiteSource {
    http: HttpClient,
    category: Category,
    base_url: String,
    pages: OnceLock<Vec<String>>,
    prefetched: Mutex<HashMap<String, String>>,
}

impl SiteSource {
    pub fn new(http: HttpClient, category: Category, base_url: impl Into<String>) -> Self {
        Self {
            http,
            category,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            pages: OnceLock::new(),
            prefetched: Mutex::new(HashMap::new()),
        }
    }

    fn stash(&self, url: String, doc: String) {
        if let Ok(mut docs) = self.prefetched.lock() {
            docs.insert(url, doc);
        }
    }

    /// A page body already fetched during discovery, handed out once.
    fn take_prefetched(&self, url: &str) -> Option<String> {
        self.prefetched.lock().ok()?.remove(url)
    }

    fn page_urls(&self) -> Result<&[String], FetchError> {
        if let Some(urls) = self.pages.get() {
            return Ok(urls);
        }
        let urls = match self.category {
            Category::Courses | Category::Authors => self.listing_urls()?,
            Category::Threads => self.thread_section_urls()?,
        };
        info!(category = ?self.category, pages = urls.len(), "listing discovered");
        Ok(self.pages.get_or_init(|| urls))
    }

    fn listing_urls(&self) -> Result<Vec<String>, FetchError> {
        let doc = self.http.get(&self.base_url)?;
        let count = navigation::listing_page_count(&doc).ok_or_else(|| FetchError::Markup {
            url: self.base_url.clone(),
            what: "pagination",
        })?;
        Ok((1..=count)
            .map(|n| format!("{}/?{}={}", self.base_url, PAGE_PARAM, n))
            .collect())
    }

    fn thread_section_urls(&self) -> Result<Vec<String>, FetchError> {
        let doc = self.http.get(&self.base_url)?;
        let sections = threads::section_paths(&doc, THREADS_CATEGORY_CLASS).ok_or_else(|| {
            FetchError::Markup { url: self.base_url.clone(), what: "forum category" }
        })?;

        let mut urls = Vec::new();
        for section in &sections {
            let first = threads::section_page_url(&self.base_url, section, 1);
            // A section whose pager cannot be read still has its first page.
            let count = match self.http.get(&first) {
                Ok(doc) => {
                    let count = navigation::section_page_count(&doc);
                    self.stash(first, doc);
                    count
                }
                Err(e) => {
                    warn!(%section, error = %e, "section pager unreadable, assuming one page");
                    1
                }
            };
            urls.extend((1..=count).map(|n| threads::section_page_url(&self.base_url, section, n)));
        }
        Ok(urls)
    }

    fn course_rows(&self, listing: &str) -> Vec<Result<Observation, String>> {
        courses::listing_links(listing)
            .into_iter()
            .map(|link| {
                let href = link.map_err(|e| e.to_string())?;
                let detail = self.http.get(&format!("{DETAIL_HOST}{href}")).map_err(|e| e.to_string());
                thread::sleep(Duration::from_millis(REQUEST_PAUSE_MS));
                courses::weekly_views(&detail?, &href).map_err(|e| e.to_string())
            })
            .collect()
    }
}

impl PageSource for SiteSource {
    fn page_count(&self) -> Result<u32, FetchError> {
        Ok(self.page_urls()?.len() as u32)
    }

    fn fetch_page(&self, page: u32) -> Result<PageBatch, FetchError> {
        let urls = self.page_urls()?;
        let url = page
            .checked_sub(1)
            .and_then(|i| urls.get(i as usize))
            .ok_or(FetchError::PageOutOfRange { page, count: urls.len() as u32 })?;

        let doc = match self.take_prefetched(url) {
            Some(doc) => doc,
            None => self.http.get(url)?,
        };
        let batch = match self.category {
            Category::Courses => PageBatch::from_items(page, self.course_rows(&doc)),
            Category::Authors => PageBatch::from_items(page, authors::parse_page(&doc)),
            Category::Threads => PageBatch::from_items(page, threads::parse_page(&doc)),
        };
        info!(page, rows = batch.rows.len(), skipped = batch.skipped.len(), "page fetched");
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;

    #[test]
    fn from_items_splits_rows_and_skips() {
        let items: Vec<Result<Observation, ExtractionError>> = vec![
            Ok(Observation::new("a", cells!["1"])),
            Err(ExtractionError::MissingKey { what: "course link" }),
            Ok(Observation::new("b", cells!["2"])),
        ];
        let batch = PageBatch::from_items(4, items);
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.skipped, vec![SkippedItem {
            page: 4,
            item: 2,
            reason: s!("item has no course link"),
        }]);
    }

    #[test]
    fn section_first_page_is_served_from_discovery() {
        let source = SiteSource::new(HttpClient::new(), Category::Threads, "http://forum.invalid");
        let first = threads::section_page_url("http://forum.invalid", "forums/courses.47/", 1);
        source.pages.get_or_init(|| vec![first.clone()]);
        source.stash(first.clone(), s!(r#"
            <li class="discussionListItem"><a href="threads/a.1/">A</a>
              <div class="stats"><dl class="major"><dd>3</dd></dl><dl class="minor"><dd>40</dd></dl></div>
            </li>"#));

        let batch = source.fetch_page(1).unwrap();
        assert_eq!(batch.rows, vec![Observation::new("threads/a.1/", cells!["3", "40"])]);
        assert!(source.take_prefetched(&first).is_none());
    }
}
