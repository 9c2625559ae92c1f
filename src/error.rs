//! Error taxonomy for the ingestion pipeline.
//!
//! Errors are scoped to how far they are allowed to propagate:
//! - [`ConfigError`] is fatal to the whole run and aborts before any
//!   partial execution.
//! - [`DiscoveryError`] is scoped to one source; the orchestrator reports
//!   it and continues with the remaining sources.
//! - [`ExtractError`] is scoped to one episode; the episode is skipped
//!   (no raw artifact written) and stays eligible for the next run.
//!
//! Collaborator seams (summarization, publishing, notification) use
//! `anyhow::Result` instead — their internals are external concerns and
//! the orchestrator only needs a reportable message.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration failure. Nothing runs after one of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("source '{name}': {reason}")]
    InvalidSource { name: String, reason: String },

    #[error("no source matches filter '{0}'")]
    NoSuchSource(String),

    #[error("this run requires a '{0}' section in the config")]
    MissingCollaborator(&'static str),
}

/// Run-level failure the orchestrator cannot isolate to one item.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("artifact store unavailable: {0}")]
    Store(#[from] std::io::Error),

    #[error("no raw artifact for slug '{0}'")]
    MissingRawArtifact(String),
}

/// Per-source discovery failure. Reported, never fatal to the run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("cannot parse feed {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("feed {0} has no usable entries")]
    EmptyFeed(String),

    #[error("cannot resolve channel handle '{0}' to a channel id")]
    UnresolvableHandle(String),
}

/// Per-episode extraction failure. The episode is skipped and no raw
/// artifact is written, so the next run will retry it.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("page request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no video id recognized in url: {0}")]
    VideoId(String),

    #[error("no content container found at {0}")]
    NoContainer(String),

    /// The video genuinely has no captions. This is the only variant the
    /// video strategy converts into an ASR fallback attempt; network and
    /// decode failures propagate as themselves so they surface instead of
    /// silently triggering the most expensive path in the system.
    #[error("transcript unavailable for video {video_id}: {reason}")]
    TranscriptUnavailable { video_id: String, reason: String },

    /// A caption track existed but its payload would not decode. Not a
    /// fallback trigger: the captions are there, we failed to read them.
    #[error("transcript payload for video {video_id} unreadable: {reason}")]
    TranscriptDecode { video_id: String, reason: String },

    #[error("audio transcription failed: {0}")]
    Asr(String),

    #[error("extraction produced no text for {0}")]
    EmptyContent(String),

    #[error("writing raw artifact failed: {0}")]
    Store(#[from] std::io::Error),
}

impl ExtractError {
    /// True for the typed "content is not there" failure that licenses
    /// falling through to the next attempt in a fallback chain.
    pub fn is_content_unavailable(&self) -> bool {
        matches!(self, ExtractError::TranscriptUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_unavailable_is_fallback_eligible() {
        let e = ExtractError::TranscriptUnavailable {
            video_id: "abc123".into(),
            reason: "no caption tracks".into(),
        };
        assert!(e.is_content_unavailable());
    }

    #[test]
    fn other_errors_are_not_fallback_eligible() {
        assert!(!ExtractError::VideoId("https://example.com".into()).is_content_unavailable());
        assert!(!ExtractError::Asr("yt-dlp exited 1".into()).is_content_unavailable());
        assert!(
            !ExtractError::TranscriptDecode {
                video_id: "abc123".into(),
                reason: "expected value at line 1".into(),
            }
            .is_content_unavailable()
        );
        assert!(
            !ExtractError::NoContainer("https://example.com/post".into())
                .is_content_unavailable()
        );
    }
}
