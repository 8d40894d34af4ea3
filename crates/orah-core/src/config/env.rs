use std::str::FromStr;

use super::Config;

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    if let Ok(parsed) = v.parse::<T>() {
        Some(parsed)
    } else {
        tracing::warn!("ignoring invalid {key} value: {v}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ORAH_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("ORAH_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(n) = parse_env("ORAH_LLM_MAX_RETRIES") {
            self.llm.max_retries = n;
        }
        if let Some(n) = parse_env("ORAH_NOTES_SUMMARIZE_THRESHOLD") {
            self.notes.summarize_threshold = n;
        }
        if let Some(n) = parse_env("ORAH_NOTES_CONCURRENCY") {
            self.notes.concurrency = n;
        }
        if let Some(secs) = parse_env("ORAH_NOTES_CALL_TIMEOUT_SECS") {
            self.notes.call_timeout_secs = secs;
        }
        if let Some(n) = parse_env("ORAH_DOCUMENT_CHUNK_TOKENS") {
            self.notes.document.max_chunk_tokens = n;
        }
        if let Some(n) = parse_env("ORAH_TRANSCRIPT_CHUNK_TOKENS") {
            self.notes.transcript.max_chunk_tokens = n;
        }
    }
}
