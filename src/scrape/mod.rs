//! Content extraction: strategy classification, dispatch, and shared
//! DOM plumbing.
//!
//! Every URL maps to exactly one strategy — [`classify`] is total, with
//! generic as the catch-all — and every strategy returns the same
//! [`ExtractionResult`] or a typed [`ExtractError`]. The orchestrator
//! never needs to know which strategy ran.

pub mod article;
pub mod asr;
pub mod generic;
pub mod metadata;
pub mod video;

use scraper::{ElementRef, Node};
use url::Url;

use crate::error::ExtractError;
use crate::models::{ExtractionResult, PageKind};

/// Hosts served by the article strategy (long-form hosted newsletters).
const ARTICLE_HOSTS: [&str; 3] = ["substack.com", "dwarkesh.com", "latent.space"];

/// Extraction seam. Production dispatches on URL classification; tests
/// substitute canned strategies.
pub trait Scrape {
    async fn extract(&self, url: &str) -> Result<ExtractionResult, ExtractError>;
}

/// HTTP-backed extraction over a shared client.
#[derive(Debug, Clone)]
pub struct WebScraper {
    client: reqwest::Client,
}

impl WebScraper {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Scrape for WebScraper {
    async fn extract(&self, url: &str) -> Result<ExtractionResult, ExtractError> {
        match classify(url) {
            PageKind::Video => video::scrape(&self.client, url).await,
            PageKind::Article => article::scrape(&self.client, url).await,
            PageKind::Generic => generic::scrape(&self.client, url).await,
        }
    }
}

/// Classify a URL into its extraction strategy. Total: unparseable URLs
/// and unknown hosts fall through to the generic strategy.
pub fn classify(url: &str) -> PageKind {
    let Ok(parsed) = Url::parse(url) else {
        return PageKind::Generic;
    };
    let host = parsed
        .host_str()
        .map(|h| h.trim_start_matches("www.").to_ascii_lowercase())
        .unwrap_or_default();

    if host == "youtu.be" || host == "youtube.com" || host.ends_with(".youtube.com") {
        return PageKind::Video;
    }

    let article_host = ARTICLE_HOSTS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")));
    if article_host || parsed.path().contains("/p/") {
        return PageKind::Article;
    }

    PageKind::Generic
}

/// Fetch a page body as text.
pub(crate) async fn fetch_page(
    client: &reqwest::Client,
    url: &str,
) -> Result<String, ExtractError> {
    Ok(client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?)
}

/// Whether this element should be pruned: known boilerplate tag, or a
/// class attribute containing any of the given keywords (substring
/// match, like the markup it has to cope with, not token match).
pub(crate) fn element_skipped(el: &ElementRef<'_>, skip_tags: &[&str], skip_keywords: &[&str]) -> bool {
    if skip_tags.contains(&el.value().name()) {
        return true;
    }
    if let Some(class) = el.value().attr("class") {
        let class = class.to_ascii_lowercase();
        if skip_keywords.iter().any(|kw| class.contains(kw)) {
            return true;
        }
    }
    false
}

/// Whether any ancestor strictly between `el` and `root` (or `el`
/// itself) is pruned.
pub(crate) fn inside_skipped(
    el: &ElementRef<'_>,
    root: &ElementRef<'_>,
    skip_tags: &[&str],
    skip_keywords: &[&str],
) -> bool {
    if element_skipped(el, skip_tags, skip_keywords) {
        return true;
    }
    for node in el.ancestors() {
        if node.id() == root.id() {
            break;
        }
        if let Some(ancestor) = ElementRef::wrap(node)
            && element_skipped(&ancestor, skip_tags, skip_keywords)
        {
            return true;
        }
    }
    false
}

/// Collect the trimmed text nodes under `root` in document order,
/// pruning skipped subtrees. The DOM equivalent of
/// `get_text(separator="\n", strip=True)` with removal folded in.
pub(crate) fn collect_text_lines(
    root: ElementRef<'_>,
    skip_tags: &[&str],
    skip_keywords: &[&str],
) -> Vec<String> {
    fn walk(
        node: ego_tree::NodeRef<'_, Node>,
        skip_tags: &[&str],
        skip_keywords: &[&str],
        out: &mut Vec<String>,
    ) {
        if let Some(el) = ElementRef::wrap(node) {
            if element_skipped(&el, skip_tags, skip_keywords) {
                return;
            }
        } else if let Some(text) = node.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
            return;
        }
        for child in node.children() {
            walk(child, skip_tags, skip_keywords, out);
        }
    }

    let mut out = Vec::new();
    for child in root.children() {
        walk(child, skip_tags, skip_keywords, &mut out);
    }
    out
}

/// Flat whitespace-normalized text of one element, pruning skipped
/// subtrees inside it.
pub(crate) fn element_text(
    el: ElementRef<'_>,
    skip_tags: &[&str],
    skip_keywords: &[&str],
) -> String {
    collect_text_lines(el, skip_tags, skip_keywords).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn classify_video_hosts() {
        assert_eq!(classify("https://www.youtube.com/watch?v=abc"), PageKind::Video);
        assert_eq!(classify("https://youtu.be/abc"), PageKind::Video);
        assert_eq!(classify("https://m.youtube.com/watch?v=abc"), PageKind::Video);
    }

    #[test]
    fn classify_article_hosts_and_path_hint() {
        assert_eq!(classify("https://www.dwarkesh.com/p/some-episode"), PageKind::Article);
        assert_eq!(classify("https://xyz.substack.com/p/post"), PageKind::Article);
        assert_eq!(classify("https://www.latent.space/feed-item"), PageKind::Article);
        // Unknown host, but the article path segment is recognizable.
        assert_eq!(classify("https://example.com/p/hidden-substack"), PageKind::Article);
    }

    #[test]
    fn classify_everything_else_is_generic() {
        assert_eq!(classify("https://lexfridman.com/episode-1"), PageKind::Generic);
        assert_eq!(classify("not a url at all"), PageKind::Generic);
    }

    #[test]
    fn collect_text_lines_prunes_skipped_subtrees() {
        let html = r#"<div id="root">
            <p>keep me</p>
            <div class="subscribe-banner"><p>drop me</p></div>
            <script>drop_this_too();</script>
            <p>and keep me</p>
        </div>"#;
        let doc = Html::parse_fragment(html);
        let root = doc
            .select(&Selector::parse("#root").unwrap())
            .next()
            .unwrap();
        let lines = collect_text_lines(root, &["script"], &["subscribe"]);
        assert_eq!(lines, vec!["keep me", "and keep me"]);
    }

    #[test]
    fn inside_skipped_sees_ancestors_up_to_root() {
        let html = r#"<div id="root"><div class="paywall"><p id="inner">x</p></div></div>"#;
        let doc = Html::parse_fragment(html);
        let root = doc.select(&Selector::parse("#root").unwrap()).next().unwrap();
        let inner = doc.select(&Selector::parse("#inner").unwrap()).next().unwrap();
        assert!(inside_skipped(&inner, &root, &[], &["paywall"]));
        assert!(!inside_skipped(&root, &root, &[], &["paywall"]));
    }
}
