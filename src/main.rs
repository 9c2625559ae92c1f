//! # podwatch
//!
//! A podcast and long-form content watcher that monitors configured RSS
//! feeds and video channels for new episodes, extracts their text
//! (article bodies, video transcripts, or a generic readable fallback),
//! and hands the raw artifacts to an LLM summarization pipeline.
//!
//! ## Usage
//!
//! ```sh
//! podwatch --config sources.yaml
//! podwatch --dry-run
//! podwatch --summarize some-episode-slug --force
//! ```
//!
//! ## Architecture
//!
//! One invocation is one straight-line run:
//! 1. **Discovery**: list recent episodes from each configured source
//! 2. **Deduplication**: drop episodes whose raw artifact already exists
//! 3. **Extraction**: scrape each new episode into a raw text artifact
//! 4. **Summarization**: produce a digest per new artifact
//! 5. **Publish & notify**: rebuild the site and push a digest message

use std::error::Error;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod discovery;
mod error;
mod identity;
mod models;
mod pipeline;
mod publish;
mod scrape;
mod store;
mod summarize;

use cli::Cli;
use config::Config;
use discovery::HttpDiscoverer;
use error::ConfigError;
use pipeline::{Collaborators, Pipeline, RunMode};
use publish::{CommandPublisher, WebhookNotifier};
use scrape::WebScraper;
use store::FsStore;
use summarize::HttpSummarizer;

/// Browser-alike user agent; several feed hosts reject default clients.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("podwatch starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.raw_dir, ?args.summary_dir, "parsed CLI arguments");

    // --- Config ---
    let config = Config::load(&args.config)?;
    let mut sources = config.sources()?;
    if let Some(filter) = &args.source {
        let needle = filter.to_lowercase();
        sources.retain(|s| s.name.to_lowercase().contains(&needle));
        if sources.is_empty() {
            return Err(ConfigError::NoSuchSource(filter.clone()).into());
        }
        info!(filter = %filter, matched = sources.len(), "source filter applied");
    }

    let mode = args.mode();
    let needs_summarizer = mode == RunMode::Full || !args.summarize.is_empty();
    if needs_summarizer && config.summarizer.is_none() {
        return Err(ConfigError::MissingCollaborator("summarizer").into());
    }

    // --- Wiring ---
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(HTTP_TIMEOUT)
        .build()?;

    let raw_store = FsStore::new(&args.raw_dir, "txt");
    let summary_store = FsStore::new(&args.summary_dir, "md");

    let discoverer = HttpDiscoverer::new(client.clone());
    let scraper = WebScraper::new(client.clone());
    let summarizer = HttpSummarizer::new(
        client.clone(),
        config.summarizer.clone(),
        summary_store.clone(),
    );
    let publisher = CommandPublisher::new(config.publish.as_ref().map(|p| p.command.clone()));
    let notifier = WebhookNotifier::new(
        client,
        config.notify.as_ref().map(|n| n.webhook_url.clone()),
        config.notify.as_ref().and_then(|n| n.site_url.clone()),
    );

    let pipeline = Pipeline::new(&sources, &discoverer, &scraper, &raw_store, &summary_store);

    // --- Explicit re-summarization, outside of discovery ---
    if !args.summarize.is_empty() {
        let report = pipeline
            .summarize_slugs(&args.summarize, args.force, &summarizer)
            .await?;
        info!(
            requested = args.summarize.len(),
            summarized = report.summarized,
            failed = report.summary_failures.len(),
            "summarization pass complete"
        );
        return Ok(());
    }

    // --- The run ---
    let collab = Collaborators { summarizer, publisher, notifier };
    let report = pipeline.run(mode, &collab).await?;

    let elapsed = start_time.elapsed();
    info!(
        discovered = report.discovered,
        new = report.new.len(),
        extracted = report.extracted.len(),
        summarized = report.summarized,
        secs = elapsed.as_secs(),
        "run complete"
    );
    if report.has_failures() {
        warn!(
            source_errors = report.source_errors.len(),
            extract_failures = report.extract_failures.len(),
            summary_failures = report.summary_failures.len(),
            publish_error = report.publish_error.is_some(),
            notify_error = report.notify_error.is_some(),
            "run finished with failures; see the log above"
        );
    }

    Ok(())
}
