//! Article strategy: hosted long-form newsletters (Substack and
//! friends).
//!
//! These pages have a predictable shape — title, optional subtitle, one
//! main content container — plus a thick layer of subscription prompts
//! and paywall chrome that has to be stripped before the text is usable.

use scraper::{ElementRef, Html, Selector};
use tracing::instrument;

use crate::error::ExtractError;
use crate::models::ExtractionResult;
use crate::scrape::{element_text, fetch_page, inside_skipped, metadata};

/// Known content containers, tried in order; first match wins.
const CONTAINER_SELECTORS: [&str; 2] = ["div.available-content", "div.post-content"];

/// Interactive/boilerplate tags removed from the content.
const SKIP_TAGS: [&str; 3] = ["button", "script", "style"];

/// Class-name keywords marking paywall/subscription chrome.
const SKIP_CLASS_KEYWORDS: [&str; 4] = ["paywall", "subscribe", "cta", "button"];

#[instrument(level = "info", skip(client))]
pub async fn scrape(client: &reqwest::Client, url: &str) -> Result<ExtractionResult, ExtractError> {
    let html = fetch_page(client, url).await?;
    extract_from_html(&html, url)
}

/// Pure extraction from fetched markup, separated for testability.
pub fn extract_from_html(html: &str, url: &str) -> Result<ExtractionResult, ExtractError> {
    let doc = Html::parse_document(html);

    // Metadata first: it depends on <script> elements the cleanup below
    // would otherwise hide from us.
    let publish_date = metadata::extract_pub_date(&doc);

    let title = doc
        .select(&Selector::parse("h1").unwrap())
        .next()
        .map(|el| element_text(el, &SKIP_TAGS, &SKIP_CLASS_KEYWORDS))
        .unwrap_or_default();

    let subtitle = doc
        .select(&Selector::parse("h3.subtitle, div.subtitle").unwrap())
        .next()
        .map(|el| element_text(el, &SKIP_TAGS, &SKIP_CLASS_KEYWORDS))
        .unwrap_or_default();

    let container =
        find_container(&doc).ok_or_else(|| ExtractError::NoContainer(url.to_string()))?;

    let piece_selector = Selector::parse("h1, h2, h3, h4, p, li").unwrap();
    let mut parts = Vec::new();
    for el in container.select(&piece_selector) {
        if inside_skipped(&el, &container, &SKIP_TAGS, &SKIP_CLASS_KEYWORDS) {
            continue;
        }
        let text = element_text(el, &SKIP_TAGS, &SKIP_CLASS_KEYWORDS);
        if text.is_empty() {
            continue;
        }
        match el.value().name() {
            "h1" | "h2" | "h3" | "h4" => parts.push(format!("\n## {text}\n")),
            _ => parts.push(text),
        }
    }
    let body = parts.join("\n\n");

    let mut sections = Vec::new();
    if !title.is_empty() {
        sections.push(format!("# {title}"));
    }
    if !subtitle.is_empty() {
        sections.push(subtitle);
    }
    sections.push(body);
    let text = sections.join("\n\n");

    if text.trim().is_empty() {
        return Err(ExtractError::EmptyContent(url.to_string()));
    }
    Ok(ExtractionResult { text, publish_date })
}

/// Locate the main content container: the known selectors in order,
/// then any div whose class mentions "body", then a bare `<article>`.
fn find_container(doc: &Html) -> Option<ElementRef<'_>> {
    for sel in CONTAINER_SELECTORS {
        let selector = Selector::parse(sel).unwrap();
        if let Some(el) = doc.select(&selector).next() {
            return Some(el);
        }
    }

    let div_selector = Selector::parse("div[class]").unwrap();
    for el in doc.select(&div_selector) {
        if let Some(class) = el.value().attr("class")
            && class.to_ascii_lowercase().contains("body")
        {
            return Some(el);
        }
    }

    doc.select(&Selector::parse("article").unwrap()).next()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
        <script type="application/ld+json">{"datePublished":"2026-02-13T08:00:00Z"}</script>
    </head><body>
        <h1>Jeff Dean on the Future of Inference</h1>
        <h3 class="subtitle">A two-hour conversation</h3>
        <div class="available-content">
            <p>First paragraph of the transcript.</p>
            <h2>On scaling laws</h2>
            <p>Second paragraph.</p>
            <div class="subscribe-widget"><p>Subscribe for more!</p></div>
            <button>Share</button>
            <li>A list item</li>
        </div>
    </body></html>"#;

    #[test]
    fn extracts_title_subtitle_body_and_date() {
        let result = extract_from_html(PAGE, "https://example.substack.com/p/jeff").unwrap();
        assert!(result.text.starts_with("# Jeff Dean on the Future of Inference"));
        assert!(result.text.contains("A two-hour conversation"));
        assert!(result.text.contains("First paragraph of the transcript."));
        assert!(result.text.contains("\n## On scaling laws\n"));
        assert!(result.text.contains("A list item"));
        assert_eq!(result.publish_date, "Feb 13, 2026");
    }

    #[test]
    fn strips_subscription_prompts_and_buttons() {
        let result = extract_from_html(PAGE, "https://example.substack.com/p/jeff").unwrap();
        assert!(!result.text.contains("Subscribe for more!"));
        assert!(!result.text.contains("Share"));
    }

    #[test]
    fn falls_back_through_container_candidates() {
        let html = r#"<html><body>
            <h1>Title</h1>
            <div class="post-body-text"><p>Found via the body-class fallback.</p></div>
        </body></html>"#;
        let result = extract_from_html(html, "https://example.com/p/x").unwrap();
        assert!(result.text.contains("Found via the body-class fallback."));
    }

    #[test]
    fn missing_container_is_a_descriptive_error() {
        let html = "<html><body><h1>Just a heading</h1></body></html>";
        let err = extract_from_html(html, "https://example.com/p/x").unwrap_err();
        assert!(matches!(err, ExtractError::NoContainer(url) if url.contains("example.com")));
    }

    #[test]
    fn no_scraped_date_resolves_to_empty() {
        let html = r#"<html><body>
            <div class="available-content"><p>Content without any date.</p></div>
        </body></html>"#;
        let result = extract_from_html(html, "https://example.com/p/x").unwrap();
        assert_eq!(result.publish_date, "");
    }
}
