// src/core/html.rs
//! Tolerant, allocation-light HTML scanning.
//!
//! Not a DOM: elements are located by tag name + class token on a lowercased
//! copy of the document, then matched to their closing tag with a depth
//! count so nested `<div>`s do not end a block early. Lowercasing touches
//! ASCII only, so byte offsets are shared between the copy and the original.

use super::sanitize::{normalize_entities, normalize_ws};

pub fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

/// Every `<tag ...>` element carrying `class` as one of its class tokens, as
/// outer HTML, in document order. An empty `class` matches any element.
/// Nested matches are included.
pub fn find_all<'a>(doc: &'a str, tag: &str, class: &str) -> Vec<&'a str> {
    let lc = to_lower(doc);
    let tag = to_lower(tag);
    let open_pat = format!("<{tag}");
    let mut out = Vec::new();
    let mut pos = 0usize;

    while let Some(start) = find_boundary(&lc, &open_pat, pos) {
        let Some(open_end) = lc[start..].find('>').map(|i| start + i + 1) else { break };
        pos = open_end;
        if !class.is_empty() && !has_class(&doc[start..open_end], class) {
            continue;
        }
        let end = element_end(&lc, open_end, &tag);
        out.push(&doc[start..end]);
    }
    out
}

pub fn find_first<'a>(doc: &'a str, tag: &str, class: &str) -> Option<&'a str> {
    find_all(doc, tag, class).into_iter().next()
}

/// True if any element inside `doc` carries `class` as a class token.
pub fn contains_class(doc: &str, class: &str) -> bool {
    let lc = to_lower(doc);
    let mut pos = 0usize;
    while let Some(i) = lc[pos..].find("class=").map(|i| pos + i) {
        pos = i + "class=".len();
        if class_tokens(&doc[pos..]).any(|t| t == class) {
            return true;
        }
    }
    false
}

/// Attribute value from the opening tag of `block` (quoted or bare).
pub fn attr(block: &str, name: &str) -> Option<String> {
    let open_end = block.find('>').unwrap_or(block.len());
    let tag = &block[..open_end];
    let lc = to_lower(tag);
    let pat = format!("{}=", to_lower(name));
    let mut from = 0usize;

    while let Some(i) = lc[from..].find(&pat).map(|i| from + i) {
        let value_at = i + pat.len();
        let at_boundary = i > 0 && lc.as_bytes()[i - 1].is_ascii_whitespace();
        if at_boundary {
            return Some(attr_value(&tag[value_at..]).to_string());
        }
        from = value_at;
    }
    None
}

/// Content between the opening tag and the final closing tag.
pub fn inner(block: &str) -> &str {
    let Some(oe) = block.find('>') else { return "" };
    match block.rfind("</") {
        Some(cs) if cs > oe => &block[oe + 1..cs],
        _ => &block[oe + 1..],
    }
}

/// Visible text of an element: tags dropped, entities and whitespace normalized.
pub fn text(block: &str) -> String {
    strip_tags(normalize_entities(inner(block)))
}

pub fn strip_tags<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();

    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;

    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => { in_tag = false; out.push(' '); }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&out)
}

/* ---------- helpers ---------- */

/// Next `pat` at or after `from` that is followed by whitespace, `>` or `/`
/// (so `<a` does not match `<abbr`).
fn find_boundary(lc: &str, pat: &str, from: usize) -> Option<usize> {
    let mut pos = from;
    while let Some(i) = lc.get(pos..)?.find(pat).map(|i| pos + i) {
        let next = lc.as_bytes().get(i + pat.len()).copied();
        match next {
            Some(b) if b.is_ascii_whitespace() || b == b'>' || b == b'/' => return Some(i),
            None => return None,
            _ => pos = i + pat.len(),
        }
    }
    None
}

/// End offset (exclusive) of the element whose opening tag ends at `open_end`.
/// Unclosed elements run to the end of the document. Only container tags are
/// searched for, so there is no void-element handling.
fn element_end(lc: &str, open_end: usize, tag: &str) -> usize {
    let open_pat = format!("<{tag}");
    let close_pat = format!("</{tag}");
    let mut depth = 1usize;
    let mut pos = open_end;

    loop {
        let next_open = find_boundary(lc, &open_pat, pos);
        let Some(close) = find_boundary(lc, &close_pat, pos) else { return lc.len() };
        match next_open {
            Some(o) if o < close => {
                depth += 1;
                pos = o + open_pat.len();
            }
            _ => {
                let end = lc[close..].find('>').map_or(lc.len(), |i| close + i + 1);
                depth -= 1;
                if depth == 0 {
                    return end;
                }
                pos = end;
            }
        }
    }
}

fn has_class(open_tag: &str, class: &str) -> bool {
    attr(open_tag, "class")
        .map(|v| v.split_whitespace().any(|t| t == class))
        .unwrap_or(false)
}

fn attr_value(rest: &str) -> &str {
    match rest.chars().next() {
        Some(q @ ('"' | '\'')) => rest[1..].split(q).next().unwrap_or(""),
        _ => rest.split(|c: char| c.is_whitespace() || c == '>').next().unwrap_or(""),
    }
}

fn class_tokens(rest: &str) -> impl Iterator<Item = &str> {
    attr_value(rest).split_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <div class="catalog">
          <div class="catalog__item">
            <div class="inner"><a class="catalog__item__link" href="/course/a/">A</a></div>
          </div>
          <DIV CLASS="catalog__item extra">
            <div><div>deep</div></div>
            <a class='catalog__item__link' href=/course/b/>B</a>
          </DIV>
        </div>
    "#;

    #[test]
    fn find_all_balances_nested_divs() {
        let items = find_all(LISTING, "div", "catalog__item");
        assert_eq!(items.len(), 2);
        assert!(items[0].trim_end().ends_with("</div>"));
        assert!(items[0].contains("/course/a/"));
        assert!(!items[0].contains("/course/b/"));
        assert!(items[1].contains("deep") && items[1].contains("/course/b/"));
    }

    #[test]
    fn class_match_is_by_token_not_substring() {
        assert!(find_all(LISTING, "div", "catalog__").is_empty());
        assert_eq!(find_all(LISTING, "div", "extra").len(), 1);
    }

    #[test]
    fn attr_reads_quoted_and_bare_values() {
        let items = find_all(LISTING, "a", "catalog__item__link");
        assert_eq!(attr(items[0], "href").as_deref(), Some("/course/a/"));
        assert_eq!(attr(items[1], "href").as_deref(), Some("/course/b/"));
        assert_eq!(attr(items[0], "title"), None);
    }

    #[test]
    fn tag_prefix_does_not_match_longer_tag() {
        let doc = r#"<abbr class="x">no</abbr><a class="x" href="/y">yes</a>"#;
        let found = find_all(doc, "a", "x");
        assert_eq!(found, vec![r#"<a class="x" href="/y">yes</a>"#]);
    }

    #[test]
    fn text_strips_tags_and_entities() {
        let block = "<span class=\"n\"> 1&nbsp;234 <b>views</b>\n</span>";
        assert_eq!(text(block), "1 234 views");
    }

    #[test]
    fn contains_class_scans_whole_block() {
        let li = r#"<li class="discussionListItem"><div class="iconKey"><span class="sticky">S</span></div></li>"#;
        assert!(contains_class(li, "sticky"));
        assert!(!contains_class(li, "stick"));
    }
}
