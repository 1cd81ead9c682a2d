//! ReAct loop controller: Thought → Action → Observation.
//!
//! Each round the model sees the whole conversation and answers in the text
//! protocol. Parsed actions are dispatched in order and their observations
//! are folded back in as assistant messages. A round ends the run when:
//!
//! 1. it has no actions and carries a `Final Answer:` marker
//! 2. it has neither (implicit answer, unless disabled)
//! 3. the tool-call ceiling refuses an action or fills up during a round
//! 4. the step ceiling is reached
//!
//! Otherwise the continuation prompt is appended and another round starts.

use std::sync::Arc;

use chrono::Utc;
use reactloop_core::error::{Error, GenerationError, RATE_LIMIT_SENTINEL, Result};
use reactloop_core::event::{DomainEvent, EventBus};
use reactloop_core::message::{Conversation, Message};
use reactloop_core::provider::GenerationSettings;
use reactloop_core::tool::ToolRegistry;
use reactloop_providers::ModelClient;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dispatcher::{DispatchOutcome, ToolDispatcher};
use crate::parser::{extract_final_answer, parse_actions};
use crate::prompts;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The model emitted `Final Answer:` without actions.
    FinalAnswer,
    /// The model answered without actions or a final-answer marker.
    ImplicitAnswer,
    /// An action was refused at the tool-call ceiling.
    ToolBudgetExhausted,
    /// The last permitted round finished.
    StepBudgetExhausted,
    /// The model stayed rate limited through every retry.
    GenerationExhausted,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FinalAnswer => "final_answer",
            Self::ImplicitAnswer => "implicit_answer",
            Self::ToolBudgetExhausted => "tool_budget_exhausted",
            Self::StepBudgetExhausted => "step_budget_exhausted",
            Self::GenerationExhausted => "generation_exhausted",
        }
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub answer: String,
    pub termination: Termination,
    /// Generation rounds used.
    pub steps: u32,
    /// Tool invocations made.
    pub tool_calls: u32,
}

/// Drives the reasoning-action loop over one owned conversation.
pub struct ReactAgent {
    client: ModelClient,
    tools: Arc<ToolRegistry>,
    settings: GenerationSettings,
    max_steps: u32,
    max_tool_calls: u32,
    stop_on_bare_response: bool,
    system_prompt: Option<String>,
    continuation_prompt: String,
    conversation: Conversation,
    event_bus: Arc<EventBus>,
}

impl ReactAgent {
    /// Create an agent with the default budgets (2 steps, 2 tool calls).
    pub fn new(client: ModelClient, tools: Arc<ToolRegistry>) -> Self {
        let continuation_prompt = prompts::continuation_prompt(&tools);
        let conversation = Conversation::new([prompts::react_prompt(&tools)]);
        Self {
            client,
            tools,
            settings: GenerationSettings::default(),
            max_steps: 2,
            max_tool_calls: 2,
            stop_on_bare_response: true,
            system_prompt: None,
            continuation_prompt,
            conversation,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Place a custom system prompt before the protocol description.
    ///
    /// The conversation is rebuilt, so any history is dropped.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = (!prompt.trim().is_empty()).then_some(prompt);
        self.conversation = Conversation::new(self.instructions());
        self
    }

    pub fn with_max_steps(mut self, max: u32) -> Self {
        self.max_steps = max.max(1);
        self
    }

    pub fn with_max_tool_calls(mut self, max: u32) -> Self {
        self.max_tool_calls = max;
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Whether an action-less, marker-less response ends the run.
    pub fn with_stop_on_bare_response(mut self, stop: bool) -> Self {
        self.stop_on_bare_response = stop;
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = bus;
        self
    }

    pub fn set_settings(&mut self, settings: GenerationSettings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> GenerationSettings {
        self.settings
    }

    pub fn client(&self) -> &ModelClient {
        &self.client
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Drop every turn, keeping only the system messages.
    pub fn clear_history(&mut self) {
        self.conversation.reset();
        debug!(conversation_id = %self.conversation.id, "History cleared");
    }

    fn instructions(&self) -> Vec<String> {
        self.system_prompt
            .iter()
            .cloned()
            .chain([prompts::react_prompt(&self.tools)])
            .collect()
    }

    /// Run the loop for `prompt` until one of the termination rules fires.
    ///
    /// Rate-limit exhaustion is a normal termination carrying the sentinel
    /// text; any other provider failure is returned as an error.
    pub async fn run(&mut self, prompt: &str, clear_history: bool) -> Result<RunResult> {
        if clear_history {
            self.clear_history();
        }
        self.conversation.push(Message::user(prompt));

        let mut dispatcher = ToolDispatcher::new(self.tools.clone(), self.max_tool_calls)
            .with_event_bus(self.event_bus.clone());
        let mut steps = 0u32;

        info!(
            conversation_id = %self.conversation.id,
            max_steps = self.max_steps,
            max_tool_calls = self.max_tool_calls,
            "Run started"
        );

        loop {
            steps += 1;
            let completion = match self
                .client
                .generate(self.conversation.messages(), &self.settings)
                .await
            {
                Ok(completion) => completion,
                Err(GenerationError::RateLimitExhausted { attempts }) => {
                    warn!(attempts, step = steps, "Generation exhausted by rate limiting");
                    return Ok(self.finish(
                        RATE_LIMIT_SENTINEL.into(),
                        Termination::GenerationExhausted,
                        steps,
                        dispatcher.calls(),
                    ));
                }
                Err(GenerationError::Provider(e)) => {
                    self.event_bus.publish(DomainEvent::ErrorOccurred {
                        context: format!("generation step {steps}"),
                        error_message: e.to_string(),
                        timestamp: Utc::now(),
                    });
                    return Err(Error::Provider(e));
                }
            };

            let response = completion.text;
            debug!(step = steps, model = %completion.model, response = %response, "Model responded");
            self.event_bus.publish(DomainEvent::ResponseGenerated {
                conversation_id: self.conversation.id.to_string(),
                model: completion.model,
                step: steps,
                tokens_used: completion.usage.map_or(0, |u| u.total_tokens),
                timestamp: Utc::now(),
            });
            self.conversation.push(Message::assistant(response.clone()));

            // "Action: Final Answer" is the marker misused as a tool name.
            let (pseudo_answers, actions): (Vec<_>, Vec<_>) = parse_actions(&response)
                .into_iter()
                .partition(|a| a.is_final_answer());

            if actions.is_empty() {
                if let Some(answer) = extract_final_answer(&response) {
                    return Ok(self.finish(answer, Termination::FinalAnswer, steps, dispatcher.calls()));
                }
                if let Some(pseudo) = pseudo_answers.last() {
                    let answer = pseudo.input.as_text().trim().to_string();
                    return Ok(self.finish(answer, Termination::FinalAnswer, steps, dispatcher.calls()));
                }
                if self.stop_on_bare_response {
                    return Ok(self.finish(
                        response,
                        Termination::ImplicitAnswer,
                        steps,
                        dispatcher.calls(),
                    ));
                }
            }

            let calls_before = dispatcher.calls();
            for action in &actions {
                match dispatcher.dispatch(action, &self.settings).await {
                    DispatchOutcome::Refused => {
                        return Ok(self.finish(
                            response,
                            Termination::ToolBudgetExhausted,
                            steps,
                            dispatcher.calls(),
                        ));
                    }
                    outcome => {
                        if let Some(observation) = outcome.observation() {
                            self.conversation.push(Message::observation(observation));
                        }
                    }
                }
            }

            // A budget filled this round ends the run before another generation.
            if dispatcher.at_ceiling() && dispatcher.calls() > calls_before {
                return Ok(self.finish(
                    response,
                    Termination::ToolBudgetExhausted,
                    steps,
                    dispatcher.calls(),
                ));
            }

            if steps >= self.max_steps {
                return Ok(self.finish(
                    response,
                    Termination::StepBudgetExhausted,
                    steps,
                    dispatcher.calls(),
                ));
            }

            self.conversation
                .push(Message::user(self.continuation_prompt.clone()));
        }
    }

    fn finish(
        &self,
        answer: String,
        termination: Termination,
        steps: u32,
        tool_calls: u32,
    ) -> RunResult {
        info!(
            conversation_id = %self.conversation.id,
            termination = termination.as_str(),
            steps,
            tool_calls,
            "Run completed"
        );
        self.event_bus.publish(DomainEvent::RunCompleted {
            conversation_id: self.conversation.id.to_string(),
            termination: termination.as_str().into(),
            steps,
            tool_calls,
            timestamp: Utc::now(),
        });
        RunResult {
            answer,
            termination,
            steps,
            tool_calls,
        }
    }
}

impl std::fmt::Debug for ReactAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactAgent")
            .field("client", &self.client)
            .field("tools", &self.tools)
            .field("max_steps", &self.max_steps)
            .field("max_tool_calls", &self.max_tool_calls)
            .field("messages", &self.conversation.len())
            .finish()
    }
}
