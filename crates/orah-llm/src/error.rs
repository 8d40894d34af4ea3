#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited")]
    RateLimited,

    #[error("{provider} API request failed (status {status})")]
    Api { provider: &'static str, status: u16 },

    #[error("malformed response from {provider}")]
    MalformedResponse { provider: &'static str },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("{0}")]
    Other(String),
}
