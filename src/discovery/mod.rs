//! Candidate-episode discovery for configured sources.
//!
//! One call per source per run. Feed-based sources go straight to the
//! feed parser; channel-based sources resolve their handle first and
//! then delegate to the same feed path. A failure here is scoped to the
//! source — the orchestrator reports it and moves on.

pub mod channel;
pub mod feed;

use crate::error::DiscoveryError;
use crate::models::{CandidateEpisode, Source, SourceKind};

/// Discovery seam. The production implementation talks HTTP; tests
/// substitute a canned one.
pub trait Discover {
    async fn discover(&self, source: &Source) -> Result<Vec<CandidateEpisode>, DiscoveryError>;
}

/// HTTP-backed discovery over a shared client.
#[derive(Debug, Clone)]
pub struct HttpDiscoverer {
    client: reqwest::Client,
}

impl HttpDiscoverer {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Discover for HttpDiscoverer {
    async fn discover(&self, source: &Source) -> Result<Vec<CandidateEpisode>, DiscoveryError> {
        match &source.kind {
            SourceKind::Feed { url } => {
                feed::fetch_episodes(&self.client, url, source.max_episodes).await
            }
            SourceKind::Channel { handle, title_filter } => {
                channel::list_channel_episodes(
                    &self.client,
                    handle,
                    source.max_episodes,
                    title_filter.as_deref(),
                )
                .await
            }
        }
    }
}
