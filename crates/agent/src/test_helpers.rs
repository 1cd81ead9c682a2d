//! Shared test helpers for agent tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reactloop_core::action::ActionInput;
use reactloop_core::error::{ProviderError, ToolError};
use reactloop_core::message::Message;
use reactloop_core::provider::{
    GenerationSettings, Provider, ProviderRequest, ProviderResponse, Usage,
};
use reactloop_core::tool::Tool;
use reactloop_providers::{ModelClient, RetryPolicy};

/// A mock provider that plays back scripted outcomes in sequence.
///
/// Panics if more calls are made than outcomes provided.
pub struct SequentialMockProvider {
    outcomes: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(outcomes: Vec<Result<ProviderResponse, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Every call succeeds with the next text.
    pub fn texts(texts: &[&str]) -> Arc<Self> {
        Self::new(texts.iter().map(|t| Ok(make_text_response(t))).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// A client with a zero back-off so throttled scripts run instantly.
    pub fn client(self: &Arc<Self>) -> ModelClient {
        ModelClient::new(self.clone(), "mock-model").with_policy(RetryPolicy {
            max_attempts: 3,
            backoff: std::time::Duration::ZERO,
        })
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            panic!(
                "SequentialMockProvider: no more responses (call #{})",
                requests.len()
            );
        }
        requests.push(request);
        outcomes.remove(0)
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

pub fn rate_limited() -> Result<ProviderResponse, ProviderError> {
    Err(ProviderError::RateLimited {
        retry_after_secs: 0,
    })
}

/// Returns a fixed reply and records every call.
pub struct RecordingTool {
    name: String,
    reply: String,
    inputs: Mutex<Vec<ActionInput>>,
    settings: Mutex<Vec<GenerationSettings>>,
}

impl RecordingTool {
    pub fn new(name: &str, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            reply: reply.into(),
            inputs: Mutex::new(Vec::new()),
            settings: Mutex::new(Vec::new()),
        })
    }

    pub fn inputs(&self) -> Vec<ActionInput> {
        self.inputs.lock().unwrap().clone()
    }

    pub fn settings(&self) -> Vec<GenerationSettings> {
        self.settings.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for RecordingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Records its input"
    }

    fn argument_spec(&self) -> &str {
        "Any text"
    }

    async fn run(
        &self,
        input: ActionInput,
        settings: &GenerationSettings,
    ) -> Result<String, ToolError> {
        self.inputs.lock().unwrap().push(input);
        self.settings.lock().unwrap().push(*settings);
        Ok(self.reply.clone())
    }
}

/// Always fails with an execution error.
pub struct FailingTool {
    name: String,
}

impl FailingTool {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self { name: name.into() })
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn argument_spec(&self) -> &str {
        "Anything"
    }

    async fn run(
        &self,
        _input: ActionInput,
        _settings: &GenerationSettings,
    ) -> Result<String, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: self.name.clone(),
            reason: "interpreter missing".into(),
        })
    }
}
