//! The model client: one "generate completion" call with bounded retry.
//!
//! Rate-limited attempts sleep a fixed back-off and try again; any other
//! provider failure is returned immediately. When every attempt was
//! throttled the caller gets [`GenerationError::RateLimitExhausted`].

use std::sync::Arc;
use std::time::Duration;

use reactloop_core::error::GenerationError;
use reactloop_core::message::Message;
use reactloop_core::provider::{GenerationSettings, Provider, ProviderRequest, Usage};
use tracing::{debug, warn};

/// How many times to try and how long to wait between throttled attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &reactloop_config::RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_secs(config.backoff_secs),
        }
    }
}

/// Text produced by one successful generation.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Trimmed response text
    pub text: String,
    /// Which model actually responded
    pub model: String,
    pub usage: Option<Usage>,
}

/// A provider bound to a model name and a retry policy.
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn Provider>,
    model: String,
    policy: RetryPolicy,
}

impl ModelClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// A client on the same provider and policy, generating with another model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            provider: self.provider.clone(),
            model: model.into(),
            policy: self.policy,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Generate a completion for `messages`.
    pub async fn generate(
        &self,
        messages: &[Message],
        settings: &GenerationSettings,
    ) -> Result<Completion, GenerationError> {
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            let request = ProviderRequest {
                model: self.model.clone(),
                messages: messages.to_vec(),
                temperature: settings.temperature,
                max_tokens: Some(settings.max_tokens),
            };

            match self.provider.complete(request).await {
                Ok(response) => {
                    debug!(
                        provider = %self.provider.name(),
                        model = %response.model,
                        attempt,
                        "Generation succeeded"
                    );
                    return Ok(Completion {
                        text: response.message.content.trim().to_string(),
                        model: response.model,
                        usage: response.usage,
                    });
                }
                Err(e) if e.is_rate_limited() => {
                    warn!(
                        provider = %self.provider.name(),
                        attempt,
                        max_attempts = attempts,
                        backoff_secs = self.policy.backoff.as_secs(),
                        "Rate limited, backing off"
                    );
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                }
                Err(e) => return Err(GenerationError::Provider(e)),
            }
        }

        Err(GenerationError::RateLimitExhausted { attempts })
    }

    /// Single-prompt convenience used by tools that call the model directly.
    pub async fn ask(
        &self,
        system: Option<&str>,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> Result<String, GenerationError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(prompt));
        Ok(self.generate(&messages, settings).await?.text)
    }
}

impl std::fmt::Debug for ModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelClient")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("policy", &self.policy)
            .finish()
    }
}
