use std::time::Duration;

use orah_notes::{ChunkProfile, PipelineConfig, SummarizerConfig};
use serde::{Deserialize, Serialize};

use crate::vault::Secret;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub notes: NotesConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_retries() -> u32 {
    2
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Response cap used when a request does not set its own.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Retries on HTTP 429 inside the client.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_summarize_threshold() -> usize {
    50_000
}

fn default_concurrency() -> usize {
    3
}

fn default_call_timeout_secs() -> u64 {
    60
}

fn default_fallback_chars() -> usize {
    5000
}

fn default_max_response_tokens() -> u32 {
    4000
}

fn default_min_response_tokens() -> u32 {
    0
}

fn default_document_profile() -> ChunkProfile {
    ChunkProfile::DOCUMENT
}

fn default_transcript_profile() -> ChunkProfile {
    ChunkProfile::TRANSCRIPT
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotesConfig {
    #[serde(default = "default_summarize_threshold")]
    pub summarize_threshold: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    #[serde(default = "default_fallback_chars")]
    pub fallback_chars: usize,
    #[serde(default = "default_max_response_tokens")]
    pub max_response_tokens: u32,
    #[serde(default = "default_min_response_tokens")]
    pub min_response_tokens: u32,
    #[serde(default = "default_document_profile")]
    pub document: ChunkProfile,
    #[serde(default = "default_transcript_profile")]
    pub transcript: ChunkProfile,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            summarize_threshold: default_summarize_threshold(),
            concurrency: default_concurrency(),
            call_timeout_secs: default_call_timeout_secs(),
            fallback_chars: default_fallback_chars(),
            max_response_tokens: default_max_response_tokens(),
            min_response_tokens: default_min_response_tokens(),
            document: default_document_profile(),
            transcript: default_transcript_profile(),
        }
    }
}

impl NotesConfig {
    #[must_use]
    pub fn summarizer_config(&self, temperature: f32) -> SummarizerConfig {
        SummarizerConfig {
            concurrency: self.concurrency,
            call_timeout: Duration::from_secs(self.call_timeout_secs),
            temperature,
            fallback_chars: self.fallback_chars,
            max_response_tokens: self.max_response_tokens,
            min_response_tokens: self.min_response_tokens,
        }
    }

    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            summarize_threshold: self.summarize_threshold,
            document: self.document,
        }
    }
}

#[derive(Debug, Default)]
pub struct ResolvedSecrets {
    pub openai_api_key: Option<Secret>,
}
