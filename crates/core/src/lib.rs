//! # ReactLoop Core
//!
//! Domain types, traits, and error definitions for the ReactLoop
//! reasoning-action runtime. This crate has **zero framework dependencies**:
//! it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the control loop is defined as a trait here.
//! Implementations live in their respective crates. This enables:
//! - Swapping providers and tools via configuration
//! - Easy testing with scripted mock providers and tools
//! - Clean dependency graph (all crates depend inward on core)

pub mod action;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use action::{ActionInput, ParsedAction};
pub use error::{Error, GenerationError, ProviderError, Result, ToolError};
pub use event::{DomainEvent, EventBus};
pub use message::{Conversation, ConversationId, Message, Role};
pub use provider::{GenerationSettings, Provider, ProviderRequest, ProviderResponse, Usage};
pub use tool::{Tool, ToolDescriptor, ToolRegistry, normalize_tool_name};
