//! Tool dispatcher: resolves parsed actions and enforces the call ceiling.
//!
//! One dispatcher lives for one run, so its counter is per run.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use reactloop_core::action::ParsedAction;
use reactloop_core::event::{DomainEvent, EventBus};
use reactloop_core::provider::GenerationSettings;
use reactloop_core::tool::ToolRegistry;
use tracing::{debug, info, warn};

/// What happened to one parsed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The tool ran; a failure is reported in the observation text.
    Executed { observation: String, success: bool },
    /// No tool by that name. Does not consume budget.
    NotFound { observation: String },
    /// The ceiling was already reached; the run must stop.
    Refused,
}

impl DispatchOutcome {
    /// The observation to fold back into the conversation, if any.
    pub fn observation(&self) -> Option<&str> {
        match self {
            Self::Executed { observation, .. } | Self::NotFound { observation } => {
                Some(observation)
            }
            Self::Refused => None,
        }
    }
}

pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    max_calls: u32,
    calls: u32,
    event_bus: Option<Arc<EventBus>>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>, max_calls: u32) -> Self {
        Self {
            registry,
            max_calls,
            calls: 0,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Tool invocations so far.
    pub fn calls(&self) -> u32 {
        self.calls
    }

    pub fn at_ceiling(&self) -> bool {
        self.calls >= self.max_calls
    }

    fn not_found(&self, name: &str) -> String {
        format!(
            "Tool '{name}' not found. Available tools: [{}]",
            self.registry.names().join(", ")
        )
    }

    pub async fn dispatch(
        &mut self,
        action: &ParsedAction,
        settings: &GenerationSettings,
    ) -> DispatchOutcome {
        let Some(tool) = self.registry.get(&action.name) else {
            warn!(tool = %action.name, "Unknown tool requested");
            return DispatchOutcome::NotFound {
                observation: self.not_found(&action.name),
            };
        };

        if self.at_ceiling() {
            info!(
                tool = %action.name,
                max_tool_calls = self.max_calls,
                "Tool-call ceiling reached, refusing"
            );
            return DispatchOutcome::Refused;
        }

        self.calls += 1;
        debug!(tool = %action.name, call = self.calls, input = %action.input, "Dispatching tool");

        let start = Instant::now();
        let result = tool.run(action.input.clone(), settings).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (observation, success) = match result {
            Ok(text) => (text, true),
            Err(e) => {
                warn!(tool = %action.name, error = %e, "Tool failed");
                (format!("error while calling tool: {e}"), false)
            }
        };

        info!(tool = %action.name, success, duration_ms, "Tool executed");
        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::ToolExecuted {
                tool_name: tool.descriptor().name,
                success,
                duration_ms,
                timestamp: Utc::now(),
            });
        }

        DispatchOutcome::Executed {
            observation,
            success,
        }
    }
}
