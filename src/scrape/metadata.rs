//! Publish-date inference from unreliable page metadata.
//!
//! Pages rarely agree on where the publish date lives, so this tries a
//! strict priority order: JSON-LD structured data, then known meta-tag
//! combinations, then an inline `<time datetime>` attribute. No date is
//! an empty string, never a guess from surrounding prose.
//!
//! Callers must run this on the full parsed document, before any
//! boilerplate removal: JSON-LD lives inside `<script>` tags that
//! cleanup passes delete.

use chrono::NaiveDate;
use scraper::{Html, Selector};
use serde_json::Value;

/// `(attribute, keys)` meta-tag combinations, tried in order.
const META_DATE_KEYS: [(&str, &[&str]); 3] = [
    ("property", &["article:published_time", "og:published_time"]),
    ("name", &["publish_date", "date", "DC.date.issued"]),
    ("itemprop", &["datePublished", "uploadDate"]),
];

/// Extract a best-effort publish date from a parsed page, normalized to
/// `Mon DD, YYYY`. Empty string when nothing usable is found.
pub fn extract_pub_date(doc: &Html) -> String {
    // 1. JSON-LD blocks, possibly several, possibly list-wrapped.
    let ld_selector = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();
    for script in doc.select(&ld_selector) {
        let raw: String = script.text().collect();
        let Ok(mut data) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        if let Value::Array(items) = data {
            data = items.into_iter().next().unwrap_or(Value::Null);
        }
        let date = data
            .get("datePublished")
            .or_else(|| data.get("uploadDate"))
            .and_then(Value::as_str);
        if let Some(date) = date {
            return format_pub_date(date);
        }
    }

    // 2. Known meta-tag name/property/itemprop combinations.
    for (attr, keys) in META_DATE_KEYS {
        for key in keys {
            let selector = Selector::parse(&format!(r#"meta[{attr}="{key}"]"#)).unwrap();
            if let Some(meta) = doc.select(&selector).next()
                && let Some(content) = meta.value().attr("content")
                && !content.trim().is_empty()
            {
                return format_pub_date(content);
            }
        }
    }

    // 3. Inline time element with a machine-readable datetime.
    let time_selector = Selector::parse("time[datetime]").unwrap();
    if let Some(time) = doc.select(&time_selector).next()
        && let Some(datetime) = time.value().attr("datetime")
    {
        return format_pub_date(datetime);
    }

    String::new()
}

/// Normalize an ISO-ish date string to `Mon DD, YYYY`.
///
/// Only the leading `YYYY-MM-DD` is considered; anything that does not
/// start with one is returned trimmed but otherwise untouched, so an
/// already-human-readable date survives.
pub fn format_pub_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let head: String = trimmed.chars().take(10).collect();
    match NaiveDate::parse_from_str(&head, "%Y-%m-%d") {
        Ok(date) => date.format("%b %d, %Y").to_string(),
        Err(_) => trimmed.to_string(),
    }
}
