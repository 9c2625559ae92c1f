//! Configuration loading for sources and collaborators.
//!
//! One YAML file (`sources.yaml` by default) describes everything a run
//! needs: the ordered source list plus optional collaborator settings
//! (summarizer endpoint, site-build command, notification webhook).
//! Loading happens once per pipeline invocation; any problem here is
//! fatal before partial execution starts.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::{Source, SourceKind};

const DEFAULT_MAX_EPISODES: usize = 5;
const DEFAULT_CATEGORY: &str = "Other";

/// Top-level config file shape.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    sources: Vec<SourceEntry>,
    #[serde(default)]
    pub summarizer: Option<SummarizerConfig>,
    #[serde(default)]
    pub publish: Option<PublishConfig>,
    #[serde(default)]
    pub notify: Option<NotifyConfig>,
}

/// One source descriptor as written in YAML. Validated into a
/// [`Source`] before the pipeline sees it.
#[derive(Debug, Deserialize)]
struct SourceEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    feed_url: Option<String>,
    #[serde(default)]
    channel_handle: Option<String>,
    #[serde(default)]
    max_episodes: Option<usize>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    category_lock: bool,
    #[serde(default)]
    title_filter: Option<String>,
}

/// Settings for the external summarization collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizerConfig {
    /// OpenAI-compatible API base, e.g. `https://ark.example.com/api/v3`.
    pub api_base: String,
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Optional prompt template file prepended to the system prompt.
    #[serde(default)]
    pub prompt_path: Option<String>,
}

fn default_max_tokens() -> u32 {
    32_000
}

fn default_api_key_env() -> String {
    "ARK_API_KEY".to_string()
}

/// Settings for the external site-rebuild collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    /// Shell command that rebuilds the site from the summary store.
    pub command: String,
}

/// Settings for the completion notifier.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    pub webhook_url: String,
    #[serde(default)]
    pub site_url: Option<String>,
}

impl Config {
    /// Load and validate the config file. Any failure is fatal.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate raw entries into [`Source`] values, in file order.
    pub fn sources(&self) -> Result<Vec<Source>, ConfigError> {
        self.sources.iter().map(SourceEntry::validate).collect()
    }
}

impl SourceEntry {
    fn validate(&self) -> Result<Source, ConfigError> {
        let kind = match self.kind.as_str() {
            "feed" => {
                let url = self.feed_url.clone().ok_or_else(|| ConfigError::InvalidSource {
                    name: self.name.clone(),
                    reason: "feed source requires feed_url".into(),
                })?;
                SourceKind::Feed { url }
            }
            "channel" => {
                let handle =
                    self.channel_handle
                        .clone()
                        .ok_or_else(|| ConfigError::InvalidSource {
                            name: self.name.clone(),
                            reason: "channel source requires channel_handle".into(),
                        })?;
                SourceKind::Channel {
                    handle,
                    title_filter: self.title_filter.clone(),
                }
            }
            other => {
                return Err(ConfigError::InvalidSource {
                    name: self.name.clone(),
                    reason: format!("unknown source type '{other}'"),
                });
            }
        };

        Ok(Source {
            name: self.name.clone(),
            kind,
            max_episodes: self.max_episodes.unwrap_or(DEFAULT_MAX_EPISODES),
            category: self
                .category
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            category_lock: self.category_lock,
        })
    }
}
