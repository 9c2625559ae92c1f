//! Publishing and notification collaborator boundaries.
//!
//! Publishing rebuilds the site from the summary store; it is external,
//! idempotent, and re-runnable, so the shipped implementation is just a
//! configured shell command. Notification posts a text digest of the
//! run to a group webhook; when no webhook is configured it is silently
//! skipped, and a failed push never affects the run.

use std::process::Stdio;

use anyhow::bail;
use serde_json::json;
use tokio::process::Command;
use tracing::{info, instrument};

/// Site-rebuild seam.
pub trait Publish {
    async fn publish(&self) -> anyhow::Result<()>;
}

/// Completion-notification seam. Episodes are `(title, category)` pairs.
pub trait Notify {
    async fn notify(&self, episodes: &[(String, String)]) -> anyhow::Result<()>;
}

/// Runs a configured shell command to rebuild the site. No command
/// configured means publishing is a no-op.
#[derive(Debug, Clone, Default)]
pub struct CommandPublisher {
    command: Option<String>,
}

impl CommandPublisher {
    pub fn new(command: Option<String>) -> Self {
        Self { command }
    }
}

impl Publish for CommandPublisher {
    #[instrument(level = "info", skip(self))]
    async fn publish(&self) -> anyhow::Result<()> {
        let Some(command) = &self.command else {
            info!("no publish command configured; skipping site rebuild");
            return Ok(());
        };

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("publish command exited with {}: {}", output.status, stderr.trim());
        }
        info!("site rebuild completed");
        Ok(())
    }
}

/// Posts a text digest to a group webhook (`msg_type: "text"` payload).
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
    site_url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(
        client: reqwest::Client,
        webhook_url: Option<String>,
        site_url: Option<String>,
    ) -> Self {
        Self { client, webhook_url, site_url }
    }
}

impl Notify for WebhookNotifier {
    #[instrument(level = "info", skip_all, fields(count = episodes.len()))]
    async fn notify(&self, episodes: &[(String, String)]) -> anyhow::Result<()> {
        if episodes.is_empty() {
            return Ok(());
        }
        let Some(url) = &self.webhook_url else {
            return Ok(());
        };

        let text = build_message(episodes, self.site_url.as_deref());
        let payload = json!({
            "msg_type": "text",
            "content": { "text": text },
        });
        self.client
            .post(url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        info!("update notification pushed");
        Ok(())
    }
}

/// Render the notification text: a dated header line, then one
/// `[category] title` line per episode, then the site link if known.
pub fn build_message(episodes: &[(String, String)], site_url: Option<&str>) -> String {
    let today = chrono::Local::now().date_naive();
    let mut lines = vec![
        format!("📬 Episode digests · {today} ({} new)", episodes.len()),
        String::new(),
    ];
    for (title, category) in episodes {
        lines.push(format!("[{category}] {title}"));
    }
    if let Some(site) = site_url {
        lines.push(String::new());
        lines.push(format!("🌐 {site}"));
    }
    lines.join("\n")
}
