//! Run orchestration: discovery, deduplication, extraction, and the
//! downstream collaborator stages, in that order.
//!
//! One run is a straight-line pass. Sources are discovered one at a
//! time, candidates are deduplicated against the raw store snapshot
//! taken at the start of the run, surviving episodes are extracted
//! sequentially, and only then do summarization, publishing, and
//! notification get a turn. Failures narrow: a source failure costs
//! that source, an episode failure costs that episode, and collaborator
//! failures are reported in the [`RunReport`] without unwinding the
//! artifacts already written.

use std::time::Duration;

use itertools::Itertools;
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

use crate::discovery::Discover;
use crate::error::{ExtractError, PipelineError};
use crate::identity::{detect_category, slugify};
use crate::models::{NewEpisode, RawEpisode, Source};
use crate::publish::{Notify, Publish};
use crate::scrape::{Scrape, classify};
use crate::store::ArtifactStore;
use crate::summarize::Summarize;

const SUMMARIZE_TIMEOUT: Duration = Duration::from_secs(20 * 60);
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// How far a run proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Discover, extract, summarize, publish, notify.
    Full,
    /// Discover and deduplicate only; report what would be ingested.
    DryRun,
    /// Discover and extract; stop before summarization.
    ScrapeOnly,
}

/// Tally of one run. Everything the final log line and the exit status
/// need, plus enough detail for tests to assert on.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Candidates produced by discovery, before deduplication.
    pub discovered: usize,
    /// Episodes that survived deduplication this run.
    pub new: Vec<NewEpisode>,
    /// `(source name, error)` for sources whose discovery failed.
    pub source_errors: Vec<(String, String)>,
    /// Episodes whose raw artifact was written this run.
    pub extracted: Vec<NewEpisode>,
    /// `(slug, error)` for episodes that failed extraction. No artifact
    /// was written, so they stay eligible for the next run.
    pub extract_failures: Vec<(String, String)>,
    /// Summaries produced this run (skipped pre-existing ones excluded).
    pub summarized: usize,
    /// `(slug, error)` for failed summarizations.
    pub summary_failures: Vec<(String, String)>,
    pub publish_error: Option<String>,
    pub notify_error: Option<String>,
}

impl RunReport {
    /// Whether anything in the run went wrong.
    pub fn has_failures(&self) -> bool {
        !self.source_errors.is_empty()
            || !self.extract_failures.is_empty()
            || !self.summary_failures.is_empty()
            || self.publish_error.is_some()
            || self.notify_error.is_some()
    }
}

/// Downstream collaborators for the post-extraction stages.
pub struct Collaborators<Z, P, N> {
    pub summarizer: Z,
    pub publisher: P,
    pub notifier: N,
}

/// One run's wiring: configured sources plus the seams the run flows
/// through. Stores are generic so tests run against in-memory doubles.
pub struct Pipeline<'a, D, X, R, S> {
    sources: &'a [Source],
    discoverer: &'a D,
    scraper: &'a X,
    raw_store: &'a R,
    summary_store: &'a S,
}

impl<'a, D, X, R, S> Pipeline<'a, D, X, R, S>
where
    D: Discover,
    X: Scrape,
    R: ArtifactStore,
    S: ArtifactStore,
{
    pub fn new(
        sources: &'a [Source],
        discoverer: &'a D,
        scraper: &'a X,
        raw_store: &'a R,
        summary_store: &'a S,
    ) -> Self {
        Self { sources, discoverer, scraper, raw_store, summary_store }
    }

    #[instrument(level = "info", skip_all, fields(mode = ?mode, sources = self.sources.len()))]
    pub async fn run<Z, P, N>(
        &self,
        mode: RunMode,
        collab: &Collaborators<Z, P, N>,
    ) -> Result<RunReport, PipelineError>
    where
        Z: Summarize,
        P: Publish,
        N: Notify,
    {
        // One snapshot per run; anything written mid-run is this run's
        // own output, never a dedup input.
        let known = self.raw_store.list_slugs()?;
        let mut report = RunReport::default();

        let mut fresh = Vec::new();
        for source in self.sources {
            match self.discoverer.discover(source).await {
                Ok(candidates) => {
                    info!(source = %source.name, count = candidates.len(), "discovery finished");
                    report.discovered += candidates.len();
                    for cand in candidates {
                        let slug = slugify(&cand.title);
                        if slug.is_empty() {
                            warn!(source = %source.name, title = %cand.title, "title yields no slug; skipping");
                            continue;
                        }
                        if known.contains(&slug) {
                            continue;
                        }
                        let category =
                            detect_category(&cand.title, &source.category, source.category_lock);
                        fresh.push(NewEpisode {
                            slug,
                            title: cand.title,
                            url: cand.url,
                            pub_date: cand.pub_date,
                            source_name: source.name.clone(),
                            category,
                        });
                    }
                }
                Err(e) => {
                    error!(source = %source.name, error = %e, "discovery failed; continuing with remaining sources");
                    report.source_errors.push((source.name.clone(), e.to_string()));
                }
            }
        }

        // Within-run dedup across sources: first seen wins.
        report.new = fresh.into_iter().unique_by(|e| e.slug.clone()).collect();
        info!(discovered = report.discovered, new = report.new.len(), "deduplication finished");

        if mode == RunMode::DryRun {
            for ep in &report.new {
                info!(slug = %ep.slug, source = %ep.source_name, category = %ep.category, "would ingest");
            }
            return Ok(report);
        }

        for ep in report.new.clone() {
            match self.ingest(&ep).await {
                Ok(()) => report.extracted.push(ep),
                Err(e) => {
                    error!(slug = %ep.slug, error = %e, "extraction failed; episode stays eligible for the next run");
                    report.extract_failures.push((ep.slug, e.to_string()));
                }
            }
        }

        if report.extracted.is_empty() {
            info!("no episodes ingested; skipping downstream stages");
            return Ok(report);
        }
        if mode == RunMode::ScrapeOnly {
            return Ok(report);
        }

        let mut digest = Vec::new();
        for ep in &report.extracted {
            if self.summary_store.exists(&ep.slug) {
                info!(slug = %ep.slug, "summary already exists; skipping");
                continue;
            }
            match self.summarize_one(&ep.slug, &collab.summarizer).await {
                Ok(()) => {
                    report.summarized += 1;
                    digest.push((ep.title.clone(), ep.category.clone()));
                }
                Err(e) => {
                    error!(slug = %ep.slug, error = %e, "summarization failed");
                    report.summary_failures.push((ep.slug.clone(), e.to_string()));
                }
            }
        }

        if report.summarized == 0 {
            info!("no new summaries; skipping publish and notification");
            return Ok(report);
        }

        match timeout(PUBLISH_TIMEOUT, collab.publisher.publish()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(error = %e, "publish failed");
                report.publish_error = Some(e.to_string());
            }
            Err(_) => {
                error!("publish timed out");
                report.publish_error = Some("publish timed out".to_string());
            }
        }

        match timeout(NOTIFY_TIMEOUT, collab.notifier.notify(&digest)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(error = %e, "notification failed");
                report.notify_error = Some(e.to_string());
            }
            Err(_) => {
                warn!("notification timed out");
                report.notify_error = Some("notification timed out".to_string());
            }
        }

        Ok(report)
    }

    /// Re-summarize an explicit slug list, outside of discovery.
    #[instrument(level = "info", skip_all, fields(count = slugs.len(), force))]
    pub async fn summarize_slugs<Z: Summarize>(
        &self,
        slugs: &[String],
        force: bool,
        summarizer: &Z,
    ) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::default();
        for slug in slugs {
            if !self.raw_store.exists(slug) {
                return Err(PipelineError::MissingRawArtifact(slug.clone()));
            }
            if !force && self.summary_store.exists(slug) {
                info!(%slug, "summary already exists; skipping (pass --force to redo)");
                continue;
            }
            match self.summarize_one(slug, summarizer).await {
                Ok(()) => report.summarized += 1,
                Err(e) => {
                    error!(%slug, error = %e, "summarization failed");
                    report.summary_failures.push((slug.clone(), e.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// Extract one episode and persist its raw artifact. The feed date
    /// wins over anything scraped from the page.
    async fn ingest(&self, ep: &NewEpisode) -> Result<(), ExtractError> {
        let result = self.scraper.extract(&ep.url).await?;
        let date = if ep.pub_date.is_empty() {
            result.publish_date
        } else {
            ep.pub_date.clone()
        };
        let raw = RawEpisode {
            title: ep.title.clone(),
            url: ep.url.clone(),
            kind: classify(&ep.url),
            date,
            category: ep.category.clone(),
            body: result.text,
        };
        let path = self.raw_store.write(&ep.slug, &raw.render())?;
        info!(slug = %ep.slug, path = %path.display(), "raw artifact written");
        Ok(())
    }

    async fn summarize_one<Z: Summarize>(
        &self,
        slug: &str,
        summarizer: &Z,
    ) -> anyhow::Result<()> {
        let raw_path = self.raw_store.path_for(slug);
        match timeout(SUMMARIZE_TIMEOUT, summarizer.summarize(slug, &raw_path)).await {
            Ok(result) => result,
            Err(_) => anyhow::bail!("summarization timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::DiscoveryError;
    use crate::models::{CandidateEpisode, ExtractionResult, SourceKind};
    use crate::store::MemStore;

    struct CannedDiscover {
        feeds: HashMap<String, Vec<CandidateEpisode>>,
        failing: HashSet<String>,
    }

    impl CannedDiscover {
        fn new(feeds: Vec<(&str, Vec<CandidateEpisode>)>) -> Self {
            Self {
                feeds: feeds
                    .into_iter()
                    .map(|(name, eps)| (name.to_string(), eps))
                    .collect(),
                failing: HashSet::new(),
            }
        }

        fn failing(mut self, name: &str) -> Self {
            self.failing.insert(name.to_string());
            self
        }
    }

    impl Discover for CannedDiscover {
        async fn discover(
            &self,
            source: &Source,
        ) -> Result<Vec<CandidateEpisode>, DiscoveryError> {
            if self.failing.contains(&source.name) {
                return Err(DiscoveryError::EmptyFeed(source.name.clone()));
            }
            Ok(self.feeds.get(&source.name).cloned().unwrap_or_default())
        }
    }

    struct CannedScraper {
        publish_date: String,
        failing: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl CannedScraper {
        fn new(publish_date: &str) -> Self {
            Self {
                publish_date: publish_date.to_string(),
                failing: HashSet::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(mut self, url: &str) -> Self {
            self.failing.insert(url.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Scrape for CannedScraper {
        async fn extract(&self, url: &str) -> Result<ExtractionResult, ExtractError> {
            self.calls.lock().unwrap().push(url.to_string());
            if self.failing.contains(url) {
                return Err(ExtractError::NoContainer(url.to_string()));
            }
            Ok(ExtractionResult {
                text: format!("body of {url}"),
                publish_date: self.publish_date.clone(),
            })
        }
    }

    #[derive(Default)]
    struct SpySummarizer {
        calls: Mutex<Vec<String>>,
        failing: HashSet<String>,
    }

    impl SpySummarizer {
        fn failing(mut self, slug: &str) -> Self {
            self.failing.insert(slug.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Summarize for SpySummarizer {
        async fn summarize(&self, slug: &str, _raw_path: &Path) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(slug.to_string());
            if self.failing.contains(slug) {
                anyhow::bail!("canned summarizer failure");
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct SpyPublisher {
        calls: AtomicUsize,
    }

    impl Publish for SpyPublisher {
        async fn publish(&self) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct SpyNotifier {
        payloads: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl Notify for SpyNotifier {
        async fn notify(&self, episodes: &[(String, String)]) -> anyhow::Result<()> {
            self.payloads.lock().unwrap().push(episodes.to_vec());
            Ok(())
        }
    }

    fn source(name: &str) -> Source {
        Source {
            name: name.to_string(),
            kind: SourceKind::Feed {
                url: format!("https://example.com/{name}.xml"),
            },
            max_episodes: 5,
            category: "Other".to_string(),
            category_lock: false,
        }
    }

    fn cand(title: &str, url: &str, date: &str) -> CandidateEpisode {
        CandidateEpisode {
            title: title.to_string(),
            url: url.to_string(),
            pub_date: date.to_string(),
        }
    }

    fn spies() -> Collaborators<SpySummarizer, SpyPublisher, SpyNotifier> {
        Collaborators {
            summarizer: SpySummarizer::default(),
            publisher: SpyPublisher::default(),
            notifier: SpyNotifier::default(),
        }
    }

    #[tokio::test]
    async fn full_run_ingests_new_skips_seeded_and_notifies() {
        let sources = vec![source("pod")];
        let discoverer = CannedDiscover::new(vec![(
            "pod",
            vec![
                cand("Fresh Episode", "https://example.com/p/fresh", "Feb 12, 2026"),
                cand("Seeded Episode", "https://example.com/p/seeded", ""),
            ],
        )]);
        let scraper = CannedScraper::new("");
        let raw = MemStore::new();
        raw.seed("seeded-episode");
        let summaries = MemStore::new();
        let collab = spies();

        let pipeline = Pipeline::new(&sources, &discoverer, &scraper, &raw, &summaries);
        let report = pipeline.run(RunMode::Full, &collab).await.unwrap();

        assert_eq!(report.discovered, 2);
        assert_eq!(report.new.len(), 1);
        assert_eq!(report.extracted.len(), 1);
        assert_eq!(report.summarized, 1);
        assert!(!report.has_failures());

        let artifact = raw.get("fresh-episode").unwrap();
        assert!(artifact.starts_with("Title：Fresh Episode\n"));
        assert!(artifact.contains("Type：article\n"));
        assert!(artifact.contains("Published：Feb 12, 2026\n"));
        assert!(artifact.ends_with("body of https://example.com/p/fresh"));

        assert_eq!(scraper.calls(), vec!["https://example.com/p/fresh"]);
        assert_eq!(collab.summarizer.calls(), vec!["fresh-episode"]);
        assert_eq!(collab.publisher.calls.load(Ordering::SeqCst), 1);
        let payloads = collab.notifier.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(
            payloads[0],
            vec![("Fresh Episode".to_string(), "Other".to_string())]
        );
    }

    #[tokio::test]
    async fn dry_run_reports_without_side_effects() {
        let sources = vec![source("pod")];
        let discoverer = CannedDiscover::new(vec![(
            "pod",
            vec![cand("Only Episode", "https://example.com/p/only", "")],
        )]);
        let scraper = CannedScraper::new("");
        let raw = MemStore::new();
        let summaries = MemStore::new();
        let collab = spies();

        let pipeline = Pipeline::new(&sources, &discoverer, &scraper, &raw, &summaries);
        let report = pipeline.run(RunMode::DryRun, &collab).await.unwrap();

        assert_eq!(report.new.len(), 1);
        assert!(report.extracted.is_empty());
        assert!(raw.is_empty());
        assert!(scraper.calls().is_empty());
        assert!(collab.summarizer.calls().is_empty());
        assert_eq!(collab.publisher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scrape_only_stops_before_summarization() {
        let sources = vec![source("pod")];
        let discoverer = CannedDiscover::new(vec![(
            "pod",
            vec![cand("Only Episode", "https://example.com/p/only", "")],
        )]);
        let scraper = CannedScraper::new("");
        let raw = MemStore::new();
        let summaries = MemStore::new();
        let collab = spies();

        let pipeline = Pipeline::new(&sources, &discoverer, &scraper, &raw, &summaries);
        let report = pipeline.run(RunMode::ScrapeOnly, &collab).await.unwrap();

        assert_eq!(report.extracted.len(), 1);
        assert!(raw.exists("only-episode"));
        assert_eq!(report.summarized, 0);
        assert!(collab.summarizer.calls().is_empty());
        assert_eq!(collab.publisher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn feed_date_wins_and_scraped_date_fills_the_gap() {
        let sources = vec![source("pod")];
        let discoverer = CannedDiscover::new(vec![(
            "pod",
            vec![
                cand("Dated By Feed", "https://example.com/p/a", "Mar 01, 2026"),
                cand("Dated By Page", "https://example.com/p/b", ""),
            ],
        )]);
        let scraper = CannedScraper::new("Jan 01, 2020");
        let raw = MemStore::new();
        let summaries = MemStore::new();
        let collab = spies();

        let pipeline = Pipeline::new(&sources, &discoverer, &scraper, &raw, &summaries);
        pipeline.run(RunMode::ScrapeOnly, &collab).await.unwrap();

        assert!(raw.get("dated-by-feed").unwrap().contains("Published：Mar 01, 2026\n"));
        assert!(raw.get("dated-by-page").unwrap().contains("Published：Jan 01, 2020\n"));
    }

    #[tokio::test]
    async fn discovery_failure_is_isolated_to_its_source() {
        let sources = vec![source("broken"), source("healthy")];
        let discoverer = CannedDiscover::new(vec![(
            "healthy",
            vec![cand("Good Episode", "https://example.com/p/good", "")],
        )])
        .failing("broken");
        let scraper = CannedScraper::new("");
        let raw = MemStore::new();
        let summaries = MemStore::new();
        let collab = spies();

        let pipeline = Pipeline::new(&sources, &discoverer, &scraper, &raw, &summaries);
        let report = pipeline.run(RunMode::Full, &collab).await.unwrap();

        assert_eq!(report.source_errors.len(), 1);
        assert_eq!(report.source_errors[0].0, "broken");
        assert!(raw.exists("good-episode"));
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn duplicate_title_across_sources_is_ingested_once() {
        let sources = vec![source("first"), source("second")];
        let shared = "Shared Crossover Episode";
        let discoverer = CannedDiscover::new(vec![
            ("first", vec![cand(shared, "https://example.com/p/first", "")]),
            ("second", vec![cand(shared, "https://example.com/p/second", "")]),
        ]);
        let scraper = CannedScraper::new("");
        let raw = MemStore::new();
        let summaries = MemStore::new();
        let collab = spies();

        let pipeline = Pipeline::new(&sources, &discoverer, &scraper, &raw, &summaries);
        let report = pipeline.run(RunMode::ScrapeOnly, &collab).await.unwrap();

        assert_eq!(report.discovered, 2);
        assert_eq!(report.new.len(), 1);
        assert_eq!(raw.len(), 1);
        // First seen wins, in source order.
        assert!(
            raw.get("shared-crossover-episode")
                .unwrap()
                .contains("URL：https://example.com/p/first\n")
        );
    }

    #[tokio::test]
    async fn extraction_failure_skips_episode_and_continues() {
        let sources = vec![source("pod")];
        let discoverer = CannedDiscover::new(vec![(
            "pod",
            vec![
                cand("Broken Page", "https://example.com/p/broken", ""),
                cand("Working Page", "https://example.com/p/working", ""),
            ],
        )]);
        let scraper = CannedScraper::new("").failing("https://example.com/p/broken");
        let raw = MemStore::new();
        let summaries = MemStore::new();
        let collab = spies();

        let pipeline = Pipeline::new(&sources, &discoverer, &scraper, &raw, &summaries);
        let report = pipeline.run(RunMode::Full, &collab).await.unwrap();

        assert_eq!(report.extract_failures.len(), 1);
        assert_eq!(report.extract_failures[0].0, "broken-page");
        assert!(!raw.exists("broken-page"));
        assert!(raw.exists("working-page"));
        assert_eq!(collab.summarizer.calls(), vec!["working-page"]);
    }

    #[tokio::test]
    async fn three_discovered_one_seeded_one_failing_never_crashes() {
        let sources = vec![source("pod")];
        let discoverer = CannedDiscover::new(vec![(
            "pod",
            vec![
                cand("Already Ingested", "https://example.com/p/old", ""),
                cand("Goes Through", "https://example.com/p/good", ""),
                cand("Fails To Extract", "https://example.com/p/bad", ""),
            ],
        )]);
        let scraper = CannedScraper::new("").failing("https://example.com/p/bad");
        let raw = MemStore::new();
        raw.seed("already-ingested");
        let summaries = MemStore::new();
        let collab = spies();

        let pipeline = Pipeline::new(&sources, &discoverer, &scraper, &raw, &summaries);
        let report = pipeline.run(RunMode::Full, &collab).await.unwrap();

        assert_eq!(report.discovered, 3);
        assert_eq!(report.new.len(), 2);
        assert_eq!(report.extracted.len(), 1);
        assert_eq!(report.extract_failures.len(), 1);
        assert_eq!(report.extract_failures[0].0, "fails-to-extract");
        assert_eq!(raw.len(), 2);
        // Seeded slug never reached the scraper.
        assert_eq!(
            scraper.calls(),
            vec!["https://example.com/p/good", "https://example.com/p/bad"]
        );
    }

    #[tokio::test]
    async fn nothing_new_skips_extraction_and_downstream() {
        let sources = vec![source("pod")];
        let discoverer = CannedDiscover::new(vec![(
            "pod",
            vec![cand("Seen Before", "https://example.com/p/seen", "")],
        )]);
        let scraper = CannedScraper::new("");
        let raw = MemStore::new();
        raw.seed("seen-before");
        let summaries = MemStore::new();
        let collab = spies();

        let pipeline = Pipeline::new(&sources, &discoverer, &scraper, &raw, &summaries);
        let report = pipeline.run(RunMode::Full, &collab).await.unwrap();

        assert!(report.new.is_empty());
        assert!(scraper.calls().is_empty());
        assert_eq!(collab.publisher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn existing_summary_is_not_regenerated() {
        let sources = vec![source("pod")];
        let discoverer = CannedDiscover::new(vec![(
            "pod",
            vec![cand("Resumed Episode", "https://example.com/p/resumed", "")],
        )]);
        let scraper = CannedScraper::new("");
        let raw = MemStore::new();
        let summaries = MemStore::new();
        summaries.seed("resumed-episode");
        let collab = spies();

        let pipeline = Pipeline::new(&sources, &discoverer, &scraper, &raw, &summaries);
        let report = pipeline.run(RunMode::Full, &collab).await.unwrap();

        assert_eq!(report.extracted.len(), 1);
        assert_eq!(report.summarized, 0);
        assert!(collab.summarizer.calls().is_empty());
        assert_eq!(collab.publisher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn summarizer_failure_is_reported_but_publish_still_runs() {
        let sources = vec![source("pod")];
        let discoverer = CannedDiscover::new(vec![(
            "pod",
            vec![
                cand("Summarizes Fine", "https://example.com/p/fine", ""),
                cand("Summarizer Chokes", "https://example.com/p/chokes", ""),
            ],
        )]);
        let scraper = CannedScraper::new("");
        let raw = MemStore::new();
        let summaries = MemStore::new();
        let collab = Collaborators {
            summarizer: SpySummarizer::default().failing("summarizer-chokes"),
            publisher: SpyPublisher::default(),
            notifier: SpyNotifier::default(),
        };

        let pipeline = Pipeline::new(&sources, &discoverer, &scraper, &raw, &summaries);
        let report = pipeline.run(RunMode::Full, &collab).await.unwrap();

        assert_eq!(report.summarized, 1);
        assert_eq!(report.summary_failures.len(), 1);
        assert_eq!(report.summary_failures[0].0, "summarizer-chokes");
        assert_eq!(collab.publisher.calls.load(Ordering::SeqCst), 1);
        let payloads = collab.notifier.payloads.lock().unwrap();
        assert_eq!(payloads[0].len(), 1);
        assert_eq!(payloads[0][0].0, "Summarizes Fine");
    }

    #[tokio::test]
    async fn summarize_slugs_respects_force_and_missing_raw() {
        let sources = vec![source("pod")];
        let discoverer = CannedDiscover::new(vec![]);
        let scraper = CannedScraper::new("");
        let raw = MemStore::new();
        raw.seed("known-episode");
        let summaries = MemStore::new();
        summaries.seed("known-episode");

        let pipeline = Pipeline::new(&sources, &discoverer, &scraper, &raw, &summaries);

        let missing = pipeline
            .summarize_slugs(
                &["no-such-episode".to_string()],
                false,
                &SpySummarizer::default(),
            )
            .await;
        assert!(matches!(missing, Err(PipelineError::MissingRawArtifact(s)) if s == "no-such-episode"));

        let summarizer = SpySummarizer::default();
        let report = pipeline
            .summarize_slugs(&["known-episode".to_string()], false, &summarizer)
            .await
            .unwrap();
        assert_eq!(report.summarized, 0);
        assert!(summarizer.calls().is_empty());

        let report = pipeline
            .summarize_slugs(&["known-episode".to_string()], true, &summarizer)
            .await
            .unwrap();
        assert_eq!(report.summarized, 1);
        assert_eq!(summarizer.calls(), vec!["known-episode"]);
    }
}
