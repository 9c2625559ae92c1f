//! Generic strategy: the catch-all for self-hosted blogs and anything
//! else without a known shape.
//!
//! Broader boilerplate removal than the article strategy, a looser set
//! of container heuristics with `<body>` as the final fallback, and a
//! minimum-length noise filter instead of structural selection.

use scraper::{ElementRef, Html, Selector};
use tracing::instrument;

use crate::error::ExtractError;
use crate::models::ExtractionResult;
use crate::scrape::{collect_text_lines, element_skipped, fetch_page, metadata};

const SKIP_TAGS: [&str; 10] = [
    "script", "style", "noscript", "nav", "footer", "header", "aside", "form", "button", "iframe",
];

const SKIP_CLASS_KEYWORDS: [&str; 11] = [
    "nav", "menu", "sidebar", "footer", "header", "ad", "banner", "cookie", "popup",
    "subscribe", "social",
];

/// Common content containers, in priority order. `<body>` catches
/// whatever is left.
const CONTAINER_SELECTORS: [&str; 7] = [
    "main",
    "article",
    "div#content",
    "div.content",
    "div.post",
    "div.entry-content",
    "body",
];

/// Lines at or below this many characters are treated as navigation
/// noise and dropped.
const MIN_LINE_CHARS: usize = 5;

#[instrument(level = "info", skip(client))]
pub async fn scrape(client: &reqwest::Client, url: &str) -> Result<ExtractionResult, ExtractError> {
    let html = fetch_page(client, url).await?;
    extract_from_html(&html, url)
}

/// Pure extraction from fetched markup, separated for testability.
pub fn extract_from_html(html: &str, url: &str) -> Result<ExtractionResult, ExtractError> {
    let doc = Html::parse_document(html);

    // Metadata first, before the removal lists hide the <script> blocks
    // it reads.
    let publish_date = metadata::extract_pub_date(&doc);

    let container =
        find_container(&doc).ok_or_else(|| ExtractError::NoContainer(url.to_string()))?;

    let lines = collect_text_lines(container, &SKIP_TAGS, &SKIP_CLASS_KEYWORDS);
    let text = lines
        .into_iter()
        .filter(|line| line.chars().count() > MIN_LINE_CHARS)
        .collect::<Vec<_>>()
        .join("\n\n");

    if text.trim().is_empty() {
        return Err(ExtractError::EmptyContent(url.to_string()));
    }
    Ok(ExtractionResult { text, publish_date })
}

/// First container candidate that is not itself boilerplate.
fn find_container(doc: &Html) -> Option<ElementRef<'_>> {
    for sel in CONTAINER_SELECTORS {
        let selector = Selector::parse(sel).unwrap();
        for el in doc.select(&selector) {
            if !element_skipped(&el, &SKIP_TAGS, &SKIP_CLASS_KEYWORDS) {
                return Some(el);
            }
        }
    }
    None
}
