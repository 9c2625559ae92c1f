//! Audio-download-plus-ASR fallback for videos with no captions.
//!
//! Shells out to `yt-dlp` for the audio track and a local `whisper`
//! binary for transcription, both with hard timeouts. This is the most
//! expensive and failure-prone path in the system, so every failure
//! mode (tool missing, network failure, decode failure) collapses into
//! [`ExtractError::Asr`] and degrades to a reported per-episode error.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, instrument};

use crate::error::ExtractError;
use crate::scrape::video::TranscriptEntry;

const AUDIO_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Whisper JSON output: we only need the timed segments.
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    #[serde(default)]
    start: f64,
    text: String,
}

/// Download the audio track and transcribe it locally, returning timed
/// entries compatible with caption-derived ones so the same paragraph
/// segmentation applies.
#[instrument(level = "info", skip_all, fields(%video_id))]
pub async fn transcribe(url: &str, video_id: &str) -> Result<Vec<TranscriptEntry>, ExtractError> {
    let workdir =
        tempfile::tempdir().map_err(|e| ExtractError::Asr(format!("temp dir: {e}")))?;

    let audio_path = download_audio(url, video_id, workdir.path()).await?;
    info!(path = %audio_path.display(), "audio downloaded; running speech recognition");
    let entries = run_whisper(&audio_path, video_id, workdir.path()).await?;

    if entries.is_empty() {
        return Err(ExtractError::Asr(format!(
            "speech recognition produced no text for video {video_id}"
        )));
    }
    Ok(entries)
}

/// Run a tool to completion under a hard timeout. The child is killed
/// when the wait is abandoned, so a timed-out tool does not keep
/// running against a working directory that is about to be deleted.
async fn run_to_completion(
    command: &mut Command,
    limit: Duration,
    tool: &str,
) -> Result<std::process::Output, ExtractError> {
    let run = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();
    timeout(limit, run)
        .await
        .map_err(|_| ExtractError::Asr(format!("{tool} timed out")))?
        .map_err(|e| ExtractError::Asr(format!("failed to run {tool}: {e}")))
}

async fn download_audio(
    url: &str,
    video_id: &str,
    workdir: &Path,
) -> Result<std::path::PathBuf, ExtractError> {
    let ytdlp = std::env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string());
    let template = workdir.join(format!("{video_id}.%(ext)s"));

    let mut command = Command::new(&ytdlp);
    command
        .arg("-x")
        .arg("--audio-format")
        .arg("mp3")
        .arg("--no-playlist")
        .arg("-o")
        .arg(&template)
        .arg(url);
    let output = run_to_completion(&mut command, AUDIO_DOWNLOAD_TIMEOUT, &ytdlp).await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractError::Asr(format!(
            "yt-dlp exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let audio_path = workdir.join(format!("{video_id}.mp3"));
    if !audio_path.exists() {
        return Err(ExtractError::Asr("yt-dlp produced no audio file".to_string()));
    }
    Ok(audio_path)
}

async fn run_whisper(
    audio_path: &Path,
    video_id: &str,
    workdir: &Path,
) -> Result<Vec<TranscriptEntry>, ExtractError> {
    let whisper = std::env::var("WHISPER_PATH").unwrap_or_else(|_| "whisper".to_string());
    let model = std::env::var("WHISPER_MODEL").unwrap_or_else(|_| "base".to_string());

    let mut command = Command::new(&whisper);
    command
        .arg(audio_path)
        .arg("--model")
        .arg(&model)
        .arg("--output_dir")
        .arg(workdir)
        .arg("--output_format")
        .arg("json")
        .arg("--language")
        .arg("en");
    let output = run_to_completion(&mut command, TRANSCRIBE_TIMEOUT, &whisper).await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractError::Asr(format!(
            "whisper exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let json_path = workdir.join(format!("{video_id}.json"));
    let json = tokio::fs::read_to_string(&json_path)
        .await
        .map_err(|e| ExtractError::Asr(format!("whisper output unreadable: {e}")))?;
    let parsed: WhisperOutput = serde_json::from_str(&json)
        .map_err(|e| ExtractError::Asr(format!("whisper output unparseable: {e}")))?;

    Ok(entries_from_whisper(parsed))
}

/// Timed segments when whisper provides them; one entry at t=0 from the
/// flat text otherwise.
fn entries_from_whisper(output: WhisperOutput) -> Vec<TranscriptEntry> {
    let entries: Vec<TranscriptEntry> = output
        .segments
        .into_iter()
        .filter_map(|seg| {
            let text = seg.text.trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptEntry {
                start: seg.start,
                text,
            })
        })
        .collect();

    if entries.is_empty() {
        let text = output.text.trim().to_string();
        if text.is_empty() {
            return Vec::new();
        }
        return vec![TranscriptEntry { start: 0.0, text }];
    }
    entries
}
