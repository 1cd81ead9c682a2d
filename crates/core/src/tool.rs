//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act in the world:
//! search the internet, run code, analyze spreadsheets, build slide decks.
//! The model addresses them by name through the text protocol, so names are
//! normalized once here and lookups tolerate case and spacing differences.

use crate::action::ActionInput;
use crate::error::ToolError;
use crate::provider::GenerationSettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Normalize a tool name: trimmed, lowercase, spaces replaced by underscores.
pub fn normalize_tool_name(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// What the model is told about a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Normalized name
    pub name: String,
    /// What the tool does
    pub description: String,
    /// Free-form description of the expected input
    pub argument_spec: String,
}

impl ToolDescriptor {
    /// Render this descriptor as a catalogue entry for the system instructions.
    pub fn render(&self) -> String {
        format!(
            "Tool: {}\nDescription: {}\nArg: {}\n",
            self.name, self.description, self.argument_spec
        )
    }
}

/// The core Tool trait.
///
/// A tool receives the decoded action input together with the run's
/// generation settings. Well-behaved tools report failures as part of their
/// returned text; a returned `Err` is turned into an observation by the
/// dispatcher and never aborts a run.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The name of this tool as displayed to the model.
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// A description of the input this tool expects.
    fn argument_spec(&self) -> &str;

    /// Execute the tool.
    async fn run(
        &self,
        input: ActionInput,
        settings: &GenerationSettings,
    ) -> std::result::Result<String, ToolError>;

    /// The descriptor under which this tool is registered.
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: normalize_tool_name(self.name()),
            description: self.description().to_string(),
            argument_spec: self.argument_spec().to_string(),
        }
    }
}

/// A fixed set of tools keyed by normalized name.
///
/// Registration order is kept so the catalogue reads the way it was built.
#[derive(Default)]
pub struct ToolRegistry {
    order: Vec<String>,
    tools: HashMap<String, (ToolDescriptor, Arc<dyn Tool>)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique after normalization.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> std::result::Result<(), ToolError> {
        let descriptor = tool.descriptor();
        if descriptor.name.is_empty() {
            return Err(ToolError::InvalidArguments(
                "tool name must not be empty".into(),
            ));
        }
        if self.tools.contains_key(&descriptor.name) {
            return Err(ToolError::DuplicateName(descriptor.name));
        }
        self.order.push(descriptor.name.clone());
        self.tools.insert(descriptor.name.clone(), (descriptor, tool));
        Ok(())
    }

    /// Builder-style registration.
    pub fn with(mut self, tool: Arc<dyn Tool>) -> std::result::Result<Self, ToolError> {
        self.register(tool)?;
        Ok(self)
    }

    /// Get a tool by name. The lookup name is normalized first.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .get(&normalize_tool_name(name))
            .map(|(_, tool)| tool.clone())
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name).map(|(d, _)| d))
            .collect()
    }

    /// List all registered tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }

    /// The tool catalogue injected into the system instructions.
    pub fn catalogue(&self) -> String {
        self.descriptors()
            .iter()
            .map(|d| d.render())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}
