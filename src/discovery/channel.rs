//! Channel-based discovery: human handle → durable channel id → feed.
//!
//! A channel handle is a human-facing alias with no feed of its own. We
//! resolve it to the durable `UC…` identifier by fetching the channel
//! page and reading the canonical link, falling back to a script scan
//! for `"channelId"`. The id then feeds the channel's Atom feed, which
//! goes through the normal feed path.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

use crate::discovery::feed;
use crate::error::DiscoveryError;
use crate::models::CandidateEpisode;

/// The channel feed cannot filter server-side, so when a title filter is
/// configured we over-fetch by this factor before filtering locally.
const FILTER_OVERFETCH: usize = 10;

static CHANNEL_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""channelId":"(UC[0-9A-Za-z_-]{10,})""#).unwrap());

/// List the newest episodes of a channel, filtered and capped.
#[instrument(level = "info", skip(client))]
pub async fn list_channel_episodes(
    client: &reqwest::Client,
    handle: &str,
    max: usize,
    title_filter: Option<&str>,
) -> Result<Vec<CandidateEpisode>, DiscoveryError> {
    let channel_id = resolve_channel_id(client, handle).await?;
    let feed_url = format!(
        "https://www.youtube.com/feeds/videos.xml?channel_id={channel_id}"
    );

    let fetch_cap = match title_filter {
        Some(_) => max * FILTER_OVERFETCH,
        None => max,
    };
    let episodes = feed::fetch_episodes(client, &feed_url, fetch_cap).await?;
    Ok(apply_title_filter(episodes, title_filter, max))
}

/// Resolve a handle (with or without a leading `@`) to a `UC…` channel id.
///
/// Handles already shaped like a channel id pass through unchanged.
#[instrument(level = "debug", skip(client))]
pub async fn resolve_channel_id(
    client: &reqwest::Client,
    handle: &str,
) -> Result<String, DiscoveryError> {
    let handle = handle.trim().trim_start_matches('@');
    if handle.is_empty() {
        return Err(DiscoveryError::UnresolvableHandle(handle.to_string()));
    }
    if handle.starts_with("UC") && handle.len() >= 20 {
        return Ok(handle.to_string());
    }

    let url = format!("https://www.youtube.com/@{}", urlencoding::encode(handle));
    let html = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    channel_id_from_html(&html)
        .inspect(|id| debug!(%id, "resolved channel handle"))
        .ok_or_else(|| DiscoveryError::UnresolvableHandle(handle.to_string()))
}

/// Pull the channel id out of a channel page: canonical-URL meta hint
/// first, embedded-script scan as fallback.
pub fn channel_id_from_html(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let canonical = Selector::parse(r#"link[rel="canonical"]"#).unwrap();
    for link in document.select(&canonical) {
        if let Some(href) = link.value().attr("href")
            && let Some((_, id)) = href.split_once("/channel/")
        {
            let id = id.trim_end_matches('/');
            if id.starts_with("UC") {
                return Some(id.to_string());
            }
        }
    }

    CHANNEL_ID_RE
        .captures(html)
        .map(|c| c[1].to_string())
}

/// Keep only titles containing the filter (case-insensitive), then cap.
pub fn apply_title_filter(
    episodes: Vec<CandidateEpisode>,
    title_filter: Option<&str>,
    max: usize,
) -> Vec<CandidateEpisode> {
    let mut kept: Vec<CandidateEpisode> = match title_filter {
        Some(filter) if !filter.is_empty() => {
            let needle = filter.to_lowercase();
            episodes
                .into_iter()
                .filter(|ep| ep.title.to_lowercase().contains(&needle))
                .collect()
        }
        _ => episodes,
    };
    kept.truncate(max);
    kept
}
