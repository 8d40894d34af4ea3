mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

use crate::vault::{Secret, VaultProvider};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.notes.concurrency == 0 {
            bail!("notes.concurrency must be at least 1");
        }
        if self.notes.call_timeout_secs == 0 {
            bail!("notes.call_timeout_secs must be at least 1");
        }
        if self.notes.document.max_chunk_tokens == 0 || self.notes.transcript.max_chunk_tokens == 0
        {
            bail!("chunk profiles need a non-zero max_chunk_tokens");
        }
        if self.notes.min_response_tokens > self.notes.max_response_tokens {
            bail!(
                "notes.min_response_tokens ({}) exceeds notes.max_response_tokens ({})",
                self.notes.min_response_tokens,
                self.notes.max_response_tokens
            );
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!("llm.temperature must be within 0.0..=2.0");
        }
        Ok(())
    }

    /// Resolve sensitive configuration values through the vault.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails.
    pub async fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> anyhow::Result<()> {
        if let Some(val) = vault.get_secret("ORAH_OPENAI_API_KEY").await? {
            self.secrets.openai_api_key = Some(Secret::new(val));
        }
        Ok(())
    }
}
