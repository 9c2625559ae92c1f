//! Summarization collaborator boundary.
//!
//! The orchestrator hands over a slug and the raw artifact path; the
//! collaborator either produces a summary artifact keyed by the same
//! slug or fails without side effects. The shipped implementation talks
//! to an OpenAI-compatible chat-completions endpoint with exponential
//! backoff and jitter; tests substitute spies.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use rand::{Rng, rng};
use serde::Deserialize;
use serde_json::json;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

use crate::config::SummarizerConfig;
use crate::store::{ArtifactStore, FsStore};

const MAX_RETRIES: usize = 5;
const BASE_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(30);

const DEFAULT_PROMPT: &str = "You are a professional podcast editor. Turn the raw episode \
text below into a detailed digest: nested bullet points covering every argument, figure, \
and example; bold key terms; a closing glossary table of technical terms.";

/// Summarization seam.
pub trait Summarize {
    /// Produce a summary artifact for `slug`, or fail without side effects.
    async fn summarize(&self, slug: &str, raw_path: &Path) -> anyhow::Result<()>;
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// OpenAI-compatible chat-completions summarizer writing into the
/// summary store.
pub struct HttpSummarizer {
    client: reqwest::Client,
    /// Absent when the config has no summarizer section. The pipeline
    /// entry points that need summarization check for that up front;
    /// calling this anyway fails cleanly.
    config: Option<SummarizerConfig>,
    store: FsStore,
}

impl HttpSummarizer {
    pub fn new(client: reqwest::Client, config: Option<SummarizerConfig>, store: FsStore) -> Self {
        Self { client, config, store }
    }

    fn system_prompt(&self, config: &SummarizerConfig) -> anyhow::Result<String> {
        let template = match &config.prompt_path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("reading prompt template {path}"))?,
            None => DEFAULT_PROMPT.to_string(),
        };
        let today = chrono::Local::now().date_naive();
        Ok(format!("Today's date is {today}.\n\n{template}"))
    }

    async fn ask_with_backoff(
        &self,
        config: &SummarizerConfig,
        system: &str,
        user: &str,
    ) -> anyhow::Result<String> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow!("environment variable {} is not set", config.api_key_env))?;
        let url = format!("{}/chat/completions", config.api_base.trim_end_matches('/'));
        let body = json!({
            "model": config.model,
            "max_tokens": config.max_tokens,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });

        let mut attempt = 0usize;
        loop {
            let result = async {
                let response = self
                    .client
                    .post(&url)
                    .bearer_auth(&api_key)
                    .json(&body)
                    .send()
                    .await?
                    .error_for_status()?;
                response.json::<ChatResponse>().await.map_err(anyhow::Error::from)
            }
            .await;

            match result {
                Ok(parsed) => {
                    let content = parsed
                        .choices
                        .into_iter()
                        .next()
                        .map(|c| c.message.content)
                        .unwrap_or_default();
                    if content.trim().is_empty() {
                        bail!("model returned an empty completion");
                    }
                    return Ok(content);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt > MAX_RETRIES {
                        return Err(e.context("summarization exhausted retries"));
                    }
                    let mut delay = BASE_DELAY.saturating_mul(1 << (attempt - 1) as u32);
                    if delay > MAX_DELAY {
                        delay = MAX_DELAY;
                    }
                    let jitter: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter);
                    warn!(attempt, max = MAX_RETRIES, ?delay, error = %e, "summarization attempt failed; backing off");
                    sleep(delay).await;
                }
            }
        }
    }
}

impl Summarize for HttpSummarizer {
    #[instrument(level = "info", skip(self, raw_path), fields(%slug))]
    async fn summarize(&self, slug: &str, raw_path: &Path) -> anyhow::Result<()> {
        let Some(config) = &self.config else {
            bail!("no summarizer configured");
        };
        let raw = std::fs::read_to_string(raw_path)
            .with_context(|| format!("reading raw artifact {}", raw_path.display()))?;

        let system = self.system_prompt(config)?;
        let user = format!(
            "Turn the following raw episode text into a digest following the rules above. \
Cover every section completely; never abbreviate with ellipses.\n\n{raw}"
        );

        let completion = self.ask_with_backoff(config, &system, &user).await?;
        let cleaned = strip_code_fences(&completion);

        let path = self.store.write(slug, cleaned)?;
        info!(path = %path.display(), chars = cleaned.len(), "summary written");
        Ok(())
    }
}

/// Models sometimes wrap the whole output in a code fence; peel it off.
fn strip_code_fences(text: &str) -> &str {
    let mut out = text.trim();
    if let Some(rest) = out.strip_prefix("```") {
        // Drop the fence line (which may carry a language tag).
        out = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    }
    if let Some(rest) = out.strip_suffix("```") {
        out = rest;
    }
    out.trim_matches('\n')
}
