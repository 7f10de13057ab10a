//! # packmate-assistant
//!
//! Generative assistant bridge for packmate.
//!
//! This crate provides:
//! - The [`GenerationBackend`](packmate_core::GenerationBackend)
//!   implementation for the Gemini REST API
//! - Prompt composition and constrained-JSON reply parsing
//! - The per-conversation history store (20-turn cap, last write wins)
//! - Confirmed action application against the item store
//!
//! The bridge absorbs every backend failure into a fixed fallback payload;
//! callers never see an error, only a degraded reply.

pub mod bridge;
pub mod conversation;
pub mod gemini;
pub mod mock;

// Re-export core types
pub use packmate_core::*;

pub use bridge::{apply_actions, compose_prompt, parse_reply, strip_code_fences, AssistantBridge};
pub use conversation::ConversationStore;
pub use gemini::GeminiBackend;
pub use mock::MockBackend;
