// src/core/sanitize.rs
use std::sync::OnceLock;

use regex::Regex;

pub fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// First run of ASCII digits, e.g. `"Просмотров за неделю: 154"` → `"154"`.
pub fn first_number(s: &str) -> Option<&str> {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let re = DIGITS.get_or_init(|| Regex::new(r"[0-9]+").expect("static regex"));
    re.find(s).map(|m| m.as_str())
}

/// Counter text as shown on the page, `"0"` when the counter is missing or blank.
pub fn counter_or_zero(text: Option<String>) -> String {
    match text {
        Some(t) if !t.trim().is_empty() => t.trim().to_string(),
        _ => s!("0"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_number_picks_first_digit_run() {
        assert_eq!(first_number("Просмотров: 154 за 7 дней"), Some("154"));
        assert_eq!(first_number("нет данных"), None);
    }

    #[test]
    fn counters_default_to_zero() {
        assert_eq!(counter_or_zero(None), "0");
        assert_eq!(counter_or_zero(Some(s!("  "))), "0");
        assert_eq!(counter_or_zero(Some(s!(" 1 204 "))), "1 204");
    }

    #[test]
    fn entities_then_whitespace() {
        assert_eq!(normalize_ws(&normalize_entities("a&nbsp;&amp;\n b")), "a & b");
    }
}
