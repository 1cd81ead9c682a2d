//! Actions extracted from model text.
//!
//! The model writes tool inputs as free text. Whatever decodes as JSON is
//! handed to the tool as a structured value; everything else is passed on
//! verbatim so the tool can decide what to do with it.

use serde::{Deserialize, Serialize};

/// The payload of a single action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ActionInput {
    /// Input that decoded as JSON (object, array, string, number, bool, null).
    Structured(serde_json::Value),
    /// Input that did not decode; the trimmed text as the model wrote it.
    Raw(String),
}

impl ActionInput {
    /// Render the input as plain text for tools that take a string.
    ///
    /// JSON strings are unwrapped; other structured values are re-encoded.
    pub fn as_text(&self) -> String {
        match self {
            Self::Raw(text) => text.clone(),
            Self::Structured(serde_json::Value::String(s)) => s.clone(),
            Self::Structured(value) => value.to_string(),
        }
    }

    /// The decoded value, if decoding succeeded.
    pub fn as_structured(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Structured(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

impl std::fmt::Display for ActionInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// One `Action:` / `Action Input:` pair parsed from a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedAction {
    /// The action name, lowercased as written by the model.
    pub name: String,
    /// The decoded input.
    pub input: ActionInput,
}

impl ParsedAction {
    pub fn new(name: impl Into<String>, input: ActionInput) -> Self {
        Self {
            name: name.into(),
            input,
        }
    }

    /// Whether the model used `Final Answer` as if it were a tool.
    pub fn is_final_answer(&self) -> bool {
        let name = self.name.trim().trim_matches('"');
        name.eq_ignore_ascii_case("final answer") || name.eq_ignore_ascii_case("final_answer")
    }
}
