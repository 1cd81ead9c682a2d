//! Message and Conversation domain types.
//!
//! The conversation is the entire prompt context of a run: system
//! instructions first, then the user prompt, the model's responses and the
//! observations folded back in. It only ever grows, until an explicit reset
//! re-derives it from the instructions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
///
/// Tool output has no role of its own; observations are assistant messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (tool catalogue, protocol)
    System,
    /// The end user, and continuation instructions
    User,
    /// The model, and observations
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create an observation message, folded into the assistant's turn.
    pub fn observation(text: impl AsRef<str>) -> Self {
        Self::assistant(format!("Observation: {}", text.as_ref()))
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// An append-only message log seeded with system instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    /// Instruction texts the system messages are derived from.
    instructions: Vec<String>,

    /// Ordered messages, system messages first.
    messages: Vec<Message>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a conversation whose first messages are the given instructions.
    ///
    /// Blank instructions are skipped.
    pub fn new<I, S>(instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let instructions: Vec<String> = instructions
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.trim().is_empty())
            .collect();
        let now = Utc::now();
        let mut conversation = Self {
            id: ConversationId::new(),
            instructions,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        conversation.reset();
        conversation
    }

    /// Append a message. Blank messages are refused.
    ///
    /// Returns whether the message was appended.
    pub fn push(&mut self, message: Message) -> bool {
        if message.is_blank() {
            warn!(
                conversation_id = %self.id,
                role = message.role.as_str(),
                "Refusing to append blank message"
            );
            return false;
        }
        self.updated_at = Utc::now();
        self.messages.push(message);
        true
    }

    /// Drop every turn and rebuild the system messages from the instructions.
    pub fn reset(&mut self) {
        self.messages = self.instructions.iter().map(Message::system).collect();
        self.updated_at = Utc::now();
    }

    /// All messages, in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of leading system-instruction messages.
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Messages appended after the system instructions.
    pub fn turns(&self) -> &[Message] {
        &self.messages[self.instructions.len().min(self.messages.len())..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recent assistant message, if any.
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    /// Get the total token count estimate (rough: 4 chars ≈ 1 token).
    pub fn estimated_tokens(&self) -> usize {
        self.messages.iter().map(|m| m.content.len() / 4).sum()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}
