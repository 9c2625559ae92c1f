//! Core data model for sources, episodes, and raw artifacts.
//!
//! The types here follow the lifecycle of one pipeline run:
//! - [`Source`]: a configured origin, immutable once loaded.
//! - [`CandidateEpisode`]: `(title, url, publish date or empty)` as produced
//!   by discovery; no identity beyond the tuple.
//! - [`NewEpisode`]: a candidate that survived deduplication, annotated with
//!   its slug, owning source, and resolved category.
//! - [`ExtractionResult`]: the uniform `(text, publish date or empty)` pair
//!   every extraction strategy returns.
//! - [`RawEpisode`]: the persisted artifact, keyed by slug, written exactly
//!   once and never mutated. Its existence is the single source of truth
//!   for "already ingested".

use std::fmt;

/// A configured content origin tracked for new episodes.
#[derive(Debug, Clone)]
pub struct Source {
    /// Display name, also the key for the `--source` filter.
    pub name: String,
    pub kind: SourceKind,
    /// Cap on new items considered per run.
    pub max_episodes: usize,
    /// Category used when no keyword rule matches (or always, when locked).
    pub category: String,
    /// When set, keyword matching is skipped and `category` is used verbatim.
    pub category_lock: bool,
}

/// Type-specific locator for a source.
#[derive(Debug, Clone)]
pub enum SourceKind {
    /// RSS or Atom feed fetched directly.
    Feed { url: String },
    /// A channel handle resolved to a durable channel id, then read through
    /// the channel's feed. The optional filter keeps only titles containing
    /// the given substring (case-insensitive).
    Channel {
        handle: String,
        title_filter: Option<String>,
    },
}

/// An item discovered from a source, before deduplication.
///
/// `pub_date` is already normalized to `Mon DD, YYYY`, or empty when the
/// feed supplied no usable timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEpisode {
    pub title: String,
    pub url: String,
    pub pub_date: String,
}

/// A candidate that passed the dedup check, ready for extraction.
#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub slug: String,
    pub title: String,
    pub url: String,
    /// Feed-supplied date; wins over any scraped date.
    pub pub_date: String,
    pub source_name: String,
    pub category: String,
}

/// Uniform result of every extraction strategy.
///
/// `text` is non-empty on success; strategies fail with a typed
/// [`ExtractError`](crate::error::ExtractError) instead of returning
/// placeholders.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub text: String,
    /// Scraped publish date, or empty when the page carried none.
    pub publish_date: String,
}

/// URL classification driving extraction strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Video,
    Article,
    Generic,
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PageKind::Video => "video",
            PageKind::Article => "article",
            PageKind::Generic => "generic",
        };
        f.write_str(s)
    }
}

/// Width of the separator line between artifact header and body.
const SEPARATOR_WIDTH: usize = 60;

/// The persisted ingestion artifact for one episode.
#[derive(Debug, Clone)]
pub struct RawEpisode {
    pub title: String,
    pub url: String,
    pub kind: PageKind,
    /// Resolved date: feed-supplied when present, otherwise scraped,
    /// otherwise empty.
    pub date: String,
    pub category: String,
    pub body: String,
}

impl RawEpisode {
    /// Render the artifact as stored on disk: a header block of
    /// fullwidth-colon `key：value` lines, a separator, then the body.
    pub fn render(&self) -> String {
        format!(
            "Title：{}\nURL：{}\nType：{}\nPublished：{}\nCategory：{}\n\n{}\n\n{}",
            self.title,
            self.url,
            self.kind,
            self.date,
            self.category,
            "=".repeat(SEPARATOR_WIDTH),
            self.body,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_kind_display_matches_artifact_vocabulary() {
        assert_eq!(PageKind::Video.to_string(), "video");
        assert_eq!(PageKind::Article.to_string(), "article");
        assert_eq!(PageKind::Generic.to_string(), "generic");
    }

    #[test]
    fn raw_episode_renders_header_then_separator_then_body() {
        let ep = RawEpisode {
            title: "Jeff Dean on Latent Space".into(),
            url: "https://www.latent.space/p/jeff-dean".into(),
            kind: PageKind::Article,
            date: "Feb 12, 2026".into(),
            category: "Google DeepMind".into(),
            body: "Body text.".into(),
        };
        let rendered = ep.render();
        assert!(rendered.starts_with("Title：Jeff Dean on Latent Space\n"));
        assert!(rendered.contains("URL：https://www.latent.space/p/jeff-dean\n"));
        assert!(rendered.contains("Type：article\n"));
        assert!(rendered.contains("Published：Feb 12, 2026\n"));
        assert!(rendered.contains("Category：Google DeepMind\n"));
        assert!(rendered.contains(&"=".repeat(60)));
        assert!(rendered.ends_with("Body text."));
    }

    #[test]
    fn raw_episode_renders_empty_date_verbatim() {
        let ep = RawEpisode {
            title: "t".into(),
            url: "u".into(),
            kind: PageKind::Generic,
            date: String::new(),
            category: "Other".into(),
            body: "b".into(),
        };
        assert!(ep.render().contains("Published：\n"));
    }
}
