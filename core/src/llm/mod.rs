//! LLM client abstractions and implementations

pub mod client;
pub mod message;
#[cfg(test)]
pub mod mock;
pub mod providers;

pub use client::{generate_text, ChatOptions, FinishReason, LlmClient, LlmResponse, Usage};
pub use message::{LlmMessage, MessageRole};
pub use providers::*;
