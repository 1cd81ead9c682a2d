//! Planner tool: a study assistant that delegates to an inner agent.
//!
//! The first word of the input picks the intent, the rest is the topic.
//! Each intent becomes a prompt for the inner agent, which runs with a
//! fresh history every time and owns its own conversation.

use async_trait::async_trait;
use reactloop_core::action::ActionInput;
use reactloop_core::error::ToolError;
use reactloop_core::provider::GenerationSettings;
use reactloop_core::tool::Tool;
use tokio::sync::Mutex;
use tracing::info;

use crate::react::ReactAgent;

pub const NAME: &str = "planner_tool";

const MISSING_TOPIC: &str = "Please provide a topic along with the instruction.";
const UNKNOWN_INTENT: &str = "I didn't understand that. Try: 'plan deep learning', \
                              'recommend transformers', or 'summarize quantum mechanics'.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Plan,
    Recommend,
    Summarize,
}

impl Intent {
    pub fn parse(word: &str) -> Option<Self> {
        match word.trim().to_lowercase().as_str() {
            "plan" | "learn" | "learning" => Some(Self::Plan),
            "recommend" | "video" | "videos" => Some(Self::Recommend),
            "summarize" | "notes" | "note" => Some(Self::Summarize),
            _ => None,
        }
    }

    /// The prompt handed to the inner agent.
    pub fn prompt(&self, topic: &str) -> String {
        match self {
            Self::Plan => format!(
                "Break down the topic '{topic}' into a step-by-step learning plan with subtopics."
            ),
            Self::Recommend => format!(
                "Search for the best learning resources on {topic}, such as courses, talks \
                 and tutorials, and list each with a one-line reason to use it."
            ),
            Self::Summarize => format!(
                "Search and summarize key points from online resources and make concise notes on {topic}."
            ),
        }
    }
}

pub struct PlannerTool {
    inner: Mutex<ReactAgent>,
}

impl PlannerTool {
    pub fn new(inner: ReactAgent) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }
}

#[async_trait]
impl Tool for PlannerTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Acts as a study assistant: recommends learning resources found by search, \
         summarizes content, and plans learning paths."
    }

    fn argument_spec(&self) -> &str {
        "Instruction like 'plan deep learning', 'recommend transformers', or \
         'summarize a topic'."
    }

    async fn run(
        &self,
        input: ActionInput,
        settings: &GenerationSettings,
    ) -> Result<String, ToolError> {
        let text = input.as_text();
        let (word, topic) = text.trim().split_once(' ').unwrap_or((text.trim(), ""));
        let topic = topic.trim();

        if topic.is_empty() {
            return Ok(MISSING_TOPIC.into());
        }
        let Some(intent) = Intent::parse(word) else {
            return Ok(UNKNOWN_INTENT.into());
        };

        info!(intent = ?intent, topic, "Delegating to inner agent");
        let mut agent = self.inner.lock().await;
        agent.set_settings(*settings);
        agent
            .run(&intent.prompt(topic), true)
            .await
            .map(|result| result.answer)
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: NAME.into(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SequentialMockProvider;
    use reactloop_core::error::ProviderError;
    use reactloop_core::tool::ToolRegistry;
    use std::sync::Arc;

    fn planner(provider: &Arc<SequentialMockProvider>) -> PlannerTool {
        PlannerTool::new(ReactAgent::new(
            provider.client(),
            Arc::new(ToolRegistry::new()),
        ))
    }

    async fn run(tool: &PlannerTool, input: &str) -> Result<String, ToolError> {
        tool.run(ActionInput::Raw(input.into()), &GenerationSettings::default())
            .await
    }

    #[test]
    fn intents() {
        assert_eq!(Intent::parse("Plan"), Some(Intent::Plan));
        assert_eq!(Intent::parse("learning"), Some(Intent::Plan));
        assert_eq!(Intent::parse("videos"), Some(Intent::Recommend));
        assert_eq!(Intent::parse("note"), Some(Intent::Summarize));
        assert_eq!(Intent::parse("dance"), None);
    }

    #[tokio::test]
    async fn plan_delegates_with_prompt() {
        let provider = SequentialMockProvider::texts(&["Final Answer: 1. tensors 2. autograd"]);
        let tool = planner(&provider);

        let out = run(&tool, "plan deep learning").await.unwrap();

        assert_eq!(out, "1. tensors 2. autograd");
        let request = &provider.requests()[0];
        assert_eq!(
            request.messages.last().unwrap().content,
            "Break down the topic 'deep learning' into a step-by-step learning plan with subtopics."
        );
    }

    #[tokio::test]
    async fn each_delegation_starts_fresh() {
        let provider = SequentialMockProvider::texts(&["Final Answer: a", "Final Answer: b"]);
        let tool = planner(&provider);

        run(&tool, "recommend transformers").await.unwrap();
        run(&tool, "summarize quantum mechanics").await.unwrap();

        let second = &provider.requests()[1].messages;
        assert_eq!(second.len(), 2);
        assert_eq!(
            second[1].content,
            "Search and summarize key points from online resources and make concise notes on quantum mechanics."
        );
    }

    #[tokio::test]
    async fn recommend_asks_for_searchable_resources() {
        let provider = SequentialMockProvider::texts(&["Final Answer: the Rust book"]);
        let tool = planner(&provider);

        run(&tool, "videos rust").await.unwrap();

        let requests = provider.requests();
        let prompt = &requests[0].messages.last().unwrap().content;
        assert!(prompt.starts_with("Search for the best learning resources on rust"));
        assert!(!prompt.contains("YouTube"));
    }

    #[tokio::test]
    async fn settings_are_passed_through() {
        let provider = SequentialMockProvider::texts(&["Final Answer: ok"]);
        let tool = planner(&provider);
        let settings = GenerationSettings {
            temperature: 0.3,
            max_tokens: 100,
        };

        tool.run(ActionInput::Raw("videos rust".into()), &settings)
            .await
            .unwrap();

        assert_eq!(provider.requests()[0].max_tokens, Some(100));
    }

    #[tokio::test]
    async fn missing_topic_and_unknown_intent() {
        let provider = SequentialMockProvider::texts(&[]);
        let tool = planner(&provider);

        assert_eq!(run(&tool, "plan").await.unwrap(), MISSING_TOPIC);
        assert_eq!(run(&tool, "   ").await.unwrap(), MISSING_TOPIC);
        assert_eq!(run(&tool, "dance the tango").await.unwrap(), UNKNOWN_INTENT);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn inner_failure_is_a_tool_error() {
        let provider = SequentialMockProvider::new(vec![Err(ProviderError::Network(
            "connection reset".into(),
        ))]);
        let tool = planner(&provider);

        let err = run(&tool, "learn rust").await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }
}
