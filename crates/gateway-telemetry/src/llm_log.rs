//! File-backed prompt/response log.
//!
//! Prompts go to `{dir}/prompts/{tag}-{id}.txt`, responses to
//! `{dir}/responses/{tag}-{id}.txt`, with matching ids. Only the newest
//! `keep_per_tag` files of a tag survive in each directory.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use gateway_config::LlmLogSettings;
use gateway_core::{ChatMessage, LogContext, LogId, LogSink, MessageRole, ResponseRecord, SinkError};
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, info};

const PROMPTS_DIR: &str = "prompts";
const RESPONSES_DIR: &str = "responses";

/// Prompt/response log writing plain-text files
#[derive(Debug)]
pub struct FileLogSink {
    prompts_dir: PathBuf,
    responses_dir: PathBuf,
    keep_per_tag: usize,
    sequence: AtomicU64,
}

impl FileLogSink {
    /// Create a sink rooted at `directory`
    pub fn new(directory: impl AsRef<Path>, keep_per_tag: usize) -> Self {
        let root = directory.as_ref();
        Self {
            prompts_dir: root.join(PROMPTS_DIR),
            responses_dir: root.join(RESPONSES_DIR),
            keep_per_tag: keep_per_tag.max(1),
            sequence: AtomicU64::new(0),
        }
    }

    /// Create from settings
    #[must_use]
    pub fn from_settings(settings: &LlmLogSettings) -> Self {
        Self::new(&settings.directory, settings.keep_per_tag)
    }

    /// Directory holding prompt logs
    #[must_use]
    pub fn prompts_dir(&self) -> &Path {
        &self.prompts_dir
    }

    /// Directory holding response logs
    #[must_use]
    pub fn responses_dir(&self) -> &Path {
        &self.responses_dir
    }

    // UTC timestamp plus a per-sink sequence so ids stay unique and sort in
    // creation order within the same millisecond.
    fn next_id(&self) -> LogId {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S-%3f");
        LogId::new(format!("{timestamp}-{sequence:06}"))
    }

    async fn write_and_prune(
        &self,
        dir: &Path,
        tag: &str,
        id: &LogId,
        contents: String,
    ) -> Result<PathBuf, SinkError> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(file_name(tag, id));
        fs::write(&path, contents).await?;
        prune(dir, tag, self.keep_per_tag).await?;
        Ok(path)
    }
}

#[async_trait]
impl LogSink for FileLogSink {
    async fn record_request(
        &self,
        messages: &[ChatMessage],
        context: &LogContext,
    ) -> Result<LogId, SinkError> {
        let id = self.next_id();
        let contents = render_prompt(messages, context);
        let path = self
            .write_and_prune(&self.prompts_dir, &context.tag, &id, contents)
            .await?;

        info!(path = %path.display(), "Saved prompt log");
        Ok(id)
    }

    async fn record_response(
        &self,
        id: &LogId,
        record: ResponseRecord<'_>,
    ) -> Result<(), SinkError> {
        let contents = render_response(&record)?;
        let path = self
            .write_and_prune(&self.responses_dir, &record.context.tag, id, contents)
            .await?;

        info!(path = %path.display(), "Saved response log");
        Ok(())
    }
}

fn sanitize_tag(tag: &str) -> String {
    let cleaned: String = tag
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "generation".to_string()
    } else {
        cleaned
    }
}

fn file_name(tag: &str, id: &LogId) -> String {
    format!("{}-{id}.txt", sanitize_tag(tag))
}

// Ids start with the year, so `{tag}-` followed by a digit belongs to `tag`
// and not to a longer tag sharing the prefix.
fn belongs_to_tag(file_name: &str, tag: &str) -> bool {
    file_name
        .strip_prefix(tag)
        .and_then(|rest| rest.strip_prefix('-'))
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

async fn prune(dir: &Path, tag: &str, keep: usize) -> Result<(), SinkError> {
    let tag = sanitize_tag(tag);
    let mut files: Vec<(SystemTime, String, PathBuf)> = Vec::new();

    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !belongs_to_tag(&name, &tag) {
            continue;
        }
        let modified = entry
            .metadata()
            .await
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((modified, name, entry.path()));
    }

    // Newest first; names break mtime ties since ids sort chronologically.
    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

    for (_, name, path) in files.into_iter().skip(keep) {
        match fs::remove_file(&path).await {
            Ok(()) => debug!(file = %name, "Deleted old log"),
            // A concurrent prune got there first.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn render_prompt(messages: &[ChatMessage], context: &LogContext) -> String {
    let mut parts = vec![
        "PROMPT LOG".to_string(),
        format!("Type: {}", context.tag),
        format!(
            "Timestamp: {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        ),
        format!("Character: {}", context.character_name),
        format!("User: {}", context.user_name),
        String::new(),
    ];

    for (index, message) in messages.iter().enumerate() {
        match message.role {
            MessageRole::System => {
                if index > 0 {
                    parts.push(format!("[SYSTEM MESSAGE {index}]:"));
                } else {
                    parts.push("[SYSTEM MESSAGE]:".to_string());
                }
                parts.push(message.content.clone());
                parts.push(String::new());
            }
            MessageRole::User => {
                parts.push(format!("{}: {}", context.user_name, message.content));
            }
            MessageRole::Assistant => {
                parts.push(format!("{}: {}", context.character_name, message.content));
            }
        }
    }

    parts.join("\n")
}

fn render_response(record: &ResponseRecord<'_>) -> Result<String, SinkError> {
    let metadata = record.metadata;
    let model = metadata
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    let mut parts = vec![
        "RESPONSE LOG".to_string(),
        format!("Type: {}", record.context.tag),
        format!(
            "Timestamp: {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        ),
        format!("Model: {model}"),
        String::new(),
    ];

    if let Some(reasoning) = record.reasoning.filter(|r| !r.is_empty()) {
        parts.push("--- REASONING ---".to_string());
        parts.push(reasoning.to_string());
        parts.push(String::new());
    }

    if has_encrypted_reasoning(metadata) {
        let tokens = metadata
            .pointer("/usage/completion_tokens_details/reasoning_tokens")
            .and_then(Value::as_u64)
            .map_or_else(|| "unknown".to_string(), |n| n.to_string());
        parts.push("--- REASONING (encrypted by provider) ---".to_string());
        parts.push(format!("Reasoning tokens used: {tokens}"));
        parts.push(String::new());
    }

    parts.push("--- RAW CONTENT (from API) ---".to_string());
    parts.push(or_empty(record.raw_text));
    parts.push(String::new());
    parts.push("--- PROCESSED CONTENT (after stripping) ---".to_string());
    parts.push(or_empty(record.normalized_text));
    parts.push(String::new());
    parts.push("--- USAGE ---".to_string());
    let usage = metadata
        .get("usage")
        .cloned()
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    parts.push(serde_json::to_string_pretty(&usage)?);

    Ok(parts.join("\n"))
}

fn has_encrypted_reasoning(metadata: &Value) -> bool {
    metadata
        .pointer("/choices/0/message/reasoning_details")
        .and_then(Value::as_array)
        .is_some_and(|details| {
            details
                .iter()
                .any(|d| d.get("type").and_then(Value::as_str) == Some("reasoning.encrypted"))
        })
}

fn or_empty(text: &str) -> String {
    if text.is_empty() {
        "(empty)".to_string()
    } else {
        text.to_string()
    }
}
