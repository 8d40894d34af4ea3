//! Test-only mock LLM provider.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::provider::{ChatOptions, LlmProvider, Message};

type Responder = Arc<dyn Fn(&[Message]) -> String + Send + Sync>;

#[derive(Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    responder: Option<Responder>,
    pub default_response: String,
    pub fail_chat: bool,
    /// Milliseconds to sleep before returning a response.
    pub delay_ms: u64,
    fail_markers: Vec<String>,
    delay_markers: Vec<(String, u64)>,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<(Vec<Message>, ChatOptions)>>>,
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("default_response", &self.default_response)
            .field("fail_chat", &self.fail_chat)
            .field("delay_ms", &self.delay_ms)
            .field("calls", &self.calls.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            responder: None,
            default_response: "mock response".into(),
            fail_chat: false,
            delay_ms: 0,
            fail_markers: Vec::new(),
            delay_markers: Vec::new(),
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockProvider {
    /// Responses are handed out in call order, then `default_response`.
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            ..Self::default()
        }
    }

    /// Build each response from the request instead of a fixed script.
    #[must_use]
    pub fn with_responder(
        mut self,
        f: impl Fn(&[Message]) -> String + Send + Sync + 'static,
    ) -> Self {
        self.responder = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Fail any request whose last message contains `marker`.
    #[must_use]
    pub fn fail_when_contains(mut self, marker: impl Into<String>) -> Self {
        self.fail_markers.push(marker.into());
        self
    }

    /// Sleep `ms` instead of `delay_ms` when the last message contains `marker`.
    #[must_use]
    pub fn delay_when_contains(mut self, marker: impl Into<String>, ms: u64) -> Self {
        self.delay_markers.push((marker.into(), ms));
        self
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of concurrently executing `chat` calls observed.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn requests(&self) -> Vec<(Vec<Message>, ChatOptions)> {
        self.requests.lock().unwrap().clone()
    }

    fn delay_for(&self, prompt: &str) -> u64 {
        self.delay_markers
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
            .map_or(self.delay_ms, |(_, ms)| *ms)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl LlmProvider for MockProvider {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<String, crate::LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((messages.to_vec(), *options));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let prompt = messages.last().map_or("", |m| m.content.as_str());
        let delay = self.delay_for(prompt);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }

        if self.fail_chat || self.fail_markers.iter().any(|m| prompt.contains(m.as_str())) {
            return Err(crate::LlmError::Other("mock LLM error".into()));
        }
        if let Some(ref responder) = self.responder {
            return Ok(responder(messages));
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }
}
