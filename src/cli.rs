//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::pipeline::RunMode;

/// Watch configured feeds and channels for new episodes, ingest their
/// text, and hand it to the summarization pipeline.
#[derive(Debug, Parser)]
#[command(name = "podwatch", version, about)]
pub struct Cli {
    /// Path to the sources config file.
    #[arg(long, default_value = "sources.yaml")]
    pub config: PathBuf,

    /// Directory holding raw episode artifacts.
    #[arg(long, default_value = "raw")]
    pub raw_dir: PathBuf,

    /// Directory holding summary artifacts.
    #[arg(long, default_value = "summaries")]
    pub summary_dir: PathBuf,

    /// Discover and deduplicate only; report what would be ingested
    /// without writing anything.
    #[arg(long, conflicts_with = "scrape_only")]
    pub dry_run: bool,

    /// Discover and extract, but stop before summarization.
    #[arg(long)]
    pub scrape_only: bool,

    /// Only run sources whose name contains this string
    /// (case-insensitive).
    #[arg(long)]
    pub source: Option<String>,

    /// Skip discovery and (re-)summarize these slugs from their existing
    /// raw artifacts.
    #[arg(long, num_args = 1.., value_name = "SLUG")]
    pub summarize: Vec<String>,

    /// With --summarize: regenerate summaries that already exist.
    #[arg(long, requires = "summarize")]
    pub force: bool,
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        if self.dry_run {
            RunMode::DryRun
        } else if self.scrape_only {
            RunMode::ScrapeOnly
        } else {
            RunMode::Full
        }
    }
}
