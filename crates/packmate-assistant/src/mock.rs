//! Mock generation backend for deterministic testing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use packmate_core::{Error, GenerationBackend, Result};

/// Scripted generation backend: returns queued responses in order, then the
/// default response. Can be flipped into a failing mode.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    scripted: VecDeque<String>,
    default_response: Option<String>,
    fail: bool,
    prompts: Vec<String>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response to return for the next call.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.state.lock().unwrap().scripted.push_back(response.into());
        self
    }

    /// Set the response returned once the queue is drained.
    pub fn with_default_response(self, response: impl Into<String>) -> Self {
        self.state.lock().unwrap().default_response = Some(response.into());
        self
    }

    /// Make every call fail with an inference error.
    pub fn failing(self) -> Self {
        self.state.lock().unwrap().fail = true;
        self
    }

    /// Prompts received so far, for assertions.
    pub fn prompts(&self) -> Vec<String> {
        self.state.lock().unwrap().prompts.clone()
    }

    /// Number of generate calls made.
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().prompts.len()
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.prompts.push(prompt.to_string());

        if state.fail {
            return Err(Error::Inference("mock backend failure".to_string()));
        }
        if let Some(next) = state.scripted.pop_front() {
            return Ok(next);
        }
        state
            .default_response
            .clone()
            .ok_or_else(|| Error::Inference("mock backend exhausted".to_string()))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
