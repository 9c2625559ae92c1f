//! RSS / Atom feed discovery.
//!
//! Feeds in the wild are unreliable: control characters that break strict
//! XML parsers, missing dates, links hidden behind Atom link relations.
//! This module scrubs the document, parses either dialect, and returns a
//! uniform candidate list with dates normalized to `Mon DD, YYYY`.

use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::DiscoveryError;
use crate::models::CandidateEpisode;

// -- RSS 2.0 ----------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Rss {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(default, rename = "item")]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default, rename = "pubDate")]
    pub_date: Option<String>,
}

// -- Atom -------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(default, rename = "entry")]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "link")]
    links: Vec<AtomLink>,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(default, rename = "@rel")]
    rel: Option<String>,
    #[serde(default, rename = "@href")]
    href: Option<String>,
}

/// Fetch and parse a feed, returning at most `max` candidates in feed
/// order (newest first for every feed we track).
#[instrument(level = "info", skip(client))]
pub async fn fetch_episodes(
    client: &reqwest::Client,
    feed_url: &str,
    max: usize,
) -> Result<Vec<CandidateEpisode>, DiscoveryError> {
    let body = client
        .get(feed_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let mut episodes = parse_feed(&body).map_err(|reason| DiscoveryError::Parse {
        url: feed_url.to_string(),
        reason,
    })?;
    if episodes.is_empty() {
        return Err(DiscoveryError::EmptyFeed(feed_url.to_string()));
    }

    episodes.truncate(max);
    debug!(count = episodes.len(), "parsed feed entries");
    Ok(episodes)
}

/// Parse a feed document (RSS 2.0 or Atom) into candidates.
///
/// Entries missing either title or link are dropped. The dialect is
/// chosen by the root element; anything else is rejected.
pub fn parse_feed(xml: &str) -> Result<Vec<CandidateEpisode>, String> {
    let clean = scrub_feed_text(xml);

    match root_element(&clean).as_deref() {
        Some("rss") => {
            let rss: Rss = quick_xml::de::from_str(&clean).map_err(|e| e.to_string())?;
            Ok(rss
                .channel
                .items
                .into_iter()
                .filter_map(rss_item_to_candidate)
                .collect())
        }
        Some("feed") => {
            let feed: AtomFeed = quick_xml::de::from_str(&clean).map_err(|e| e.to_string())?;
            Ok(feed
                .entries
                .into_iter()
                .filter_map(atom_entry_to_candidate)
                .collect())
        }
        Some(other) => Err(format!("unrecognized feed root element '{other}'")),
        None => Err("document has no root element".to_string()),
    }
}

/// Local name of the document's root element, if any.
fn root_element(xml: &str) -> Option<String> {
    let mut reader = quick_xml::Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(quick_xml::events::Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                return Some(name);
            }
            Ok(quick_xml::events::Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

fn rss_item_to_candidate(item: RssItem) -> Option<CandidateEpisode> {
    let title = item.title.map(|t| t.trim().to_string()).unwrap_or_default();
    let url = item.link.map(|l| l.trim().to_string()).unwrap_or_default();
    if title.is_empty() || url.is_empty() {
        return None;
    }
    let pub_date = item
        .pub_date
        .as_deref()
        .map(normalize_feed_date)
        .unwrap_or_default();
    Some(CandidateEpisode { title, url, pub_date })
}

fn atom_entry_to_candidate(entry: AtomEntry) -> Option<CandidateEpisode> {
    let title = entry.title.map(|t| t.trim().to_string()).unwrap_or_default();

    // Prefer the explicit alternate relation when several links exist.
    let url = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref() == Some("alternate"))
        .or_else(|| entry.links.iter().find(|l| l.rel.is_none()))
        .or_else(|| entry.links.first())
        .and_then(|l| l.href.as_deref())
        .map(|h| h.trim().to_string())
        .unwrap_or_default();

    if title.is_empty() || url.is_empty() {
        return None;
    }

    let pub_date = entry
        .published
        .as_deref()
        .or(entry.updated.as_deref())
        .map(normalize_feed_date)
        .unwrap_or_default();
    Some(CandidateEpisode { title, url, pub_date })
}

/// Normalize whichever timestamp dialect the entry used (RFC 2822 for
/// RSS `pubDate`, RFC 3339 for Atom) to `Mon DD, YYYY`. Unparseable
/// values resolve to empty, never a guess.
pub fn normalize_feed_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.format("%b %d, %Y").to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%b %d, %Y").to_string();
    }
    String::new()
}

/// Strip characters that break strict XML parsers: ASCII control
/// characters other than tab/newline/carriage-return, plus a handful of
/// HTML entities feeds smuggle into XML.
fn scrub_feed_text(xml: &str) -> String {
    let without_ctl: String = xml
        .chars()
        .filter(|&c| !c.is_control() || c == '\t' || c == '\n' || c == '\r')
        .collect();
    without_ctl
        .replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&rsquo;", "'")
        .replace("&lsquo;", "'")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
}
