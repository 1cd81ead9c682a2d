//! Fakes shared by the tool tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reactloop_core::action::ActionInput;
use reactloop_core::error::{ProviderError, ToolError};
use reactloop_core::message::Message;
use reactloop_core::provider::*;
use reactloop_core::tool::Tool;
use reactloop_providers::ModelClient;

/// Replies with canned responses in order and embeds text as letter counts.
pub struct CannedProvider {
    responses: Mutex<Vec<String>>,
    pub requests: Mutex<Vec<ProviderRequest>>,
    pub embed_calls: Mutex<u32>,
}

impl CannedProvider {
    pub fn new(responses: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            requests: Mutex::new(Vec::new()),
            embed_calls: Mutex::new(0),
        })
    }

    pub fn client(self: &Arc<Self>) -> ModelClient {
        ModelClient::new(self.clone(), "canned-model")
    }
}

/// 26-dimensional bag of letters.
pub fn letter_embedding(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; 26];
    for c in text.to_ascii_lowercase().bytes() {
        if c.is_ascii_lowercase() {
            v[(c - b'a') as usize] += 1.0;
        }
    }
    v
}

#[async_trait]
impl Provider for CannedProvider {
    fn name(&self) -> &str {
        "canned"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        let text = if responses.is_empty() {
            String::new()
        } else {
            responses.remove(0)
        };
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: None,
            model: "canned-model".into(),
        })
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        *self.embed_calls.lock().unwrap() += 1;
        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|t| letter_embedding(t)).collect(),
            model: request.model,
        })
    }
}

/// A tool that returns a fixed prefix plus its input, or always fails.
pub struct FixedTool {
    pub name: &'static str,
    pub prefix: &'static str,
    pub fail: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FixedTool {
    pub fn new(name: &'static str, prefix: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            prefix,
            fail: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            prefix: "",
            fail: true,
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Tool for FixedTool {
    fn name(&self) -> &str {
        self.name
    }
    fn description(&self) -> &str {
        "fixed output"
    }
    fn argument_spec(&self) -> &str {
        "anything"
    }
    async fn run(
        &self,
        input: ActionInput,
        _settings: &GenerationSettings,
    ) -> std::result::Result<String, ToolError> {
        let text = input.as_text();
        self.calls.lock().unwrap().push(text.clone());
        if self.fail {
            return Err(ToolError::ExecutionFailed {
                tool_name: self.name.into(),
                reason: "upstream unavailable".into(),
            });
        }
        Ok(format!("{}{}", self.prefix, text))
    }
}
