//! LLM Provider implementations for ReactLoop.
//!
//! All providers implement the `reactloop_core::Provider` trait.
//! The router selects the correct provider based on configuration, and the
//! [`ModelClient`] wraps the selected one with the rate-limit retry policy.

pub mod client;
pub mod openai_compat;
pub mod router;

pub use client::{Completion, ModelClient, RetryPolicy};
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
